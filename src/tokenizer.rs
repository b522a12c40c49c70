//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The scanner walks the source left to right trying a fixed priority
//! order at each position: comments and whitespace are discarded, keyword
//! and multi-word operator phrases are matched (longest phrase first, with
//! a word-boundary check) before the catch-all identifier, and quoted
//! literals keep their surrounding quotes for the parser to strip.

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  DataType,
  Input,
  Output,
  OutputMarker,
  Number,
  CharLit,
  StrLit,
  Operator,
  Punctuation,
  If,
  Else,
  For,
  Ident,
  Semicolon,
  BlockOpen,
  BlockClose,
}

/// Lexical information threaded through the later stages. `line` is
/// 1-based; `column` is the byte offset from the most recent newline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
  pub kind: TokenKind,
  pub text: &'a str,
  pub line: usize,
  pub column: usize,
}

/// Keyword and operator phrases, tried in order before the identifier
/// pattern. Longer relational phrases come first so `is inferior to` cannot
/// shadow `is inferior or equal to`.
const PHRASES: &[(&str, TokenKind)] = &[
  ("is inferior or equal to", TokenKind::Operator),
  ("is superior or equal to", TokenKind::Operator),
  ("is inferior to", TokenKind::Operator),
  ("is superior to", TokenKind::Operator),
  ("is equal to", TokenKind::Operator),
  ("is unequal to", TokenKind::Operator),
  ("imbue with", TokenKind::Operator),
  ("augmented by", TokenKind::Operator),
  ("diminished by", TokenKind::Operator),
  ("amplified by", TokenKind::Operator),
  ("fragmented by", TokenKind::Operator),
  ("augment by", TokenKind::Operator),
  ("diminish by", TokenKind::Operator),
  ("amplify by", TokenKind::Operator),
  ("fragment by", TokenKind::Operator),
  ("and", TokenKind::Operator),
  ("or", TokenKind::Operator),
  ("tally", TokenKind::DataType),
  ("rune", TokenKind::DataType),
  ("verse", TokenKind::DataType),
  ("portion", TokenKind::DataType),
  ("summon", TokenKind::Input),
  ("cast", TokenKind::Output),
  ("spell", TokenKind::OutputMarker),
  ("trial", TokenKind::If),
  ("failure", TokenKind::Else),
  ("cycle", TokenKind::For),
];

/// Lex the input into a flat vector of tokens. Whitespace and comments are
/// recognised and discarded; the first unmatched character is a hard error.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token<'_>>> {
  let mut tokens = Vec::new();
  let bytes = source.as_bytes();
  let mut i = 0;
  let mut line = 1;
  let mut line_start = 0;

  while i < bytes.len() {
    let c = bytes[i];

    if c == b'\n' {
      i += 1;
      line += 1;
      line_start = i;
      continue;
    }
    if c == b' ' || c == b'\t' || c == b'\r' {
      i += 1;
      continue;
    }

    if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
      while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
      }
      continue;
    }

    if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
      let (open_line, open_column) = (line, i - line_start);
      i += 2;
      loop {
        if i + 1 >= bytes.len() {
          return Err(CompileError::UnrecognizedCharacter {
            character: '/',
            line: open_line,
            column: open_column,
          });
        }
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
          i += 2;
          break;
        }
        if bytes[i] == b'\n' {
          line += 1;
          line_start = i + 1;
        }
        i += 1;
      }
      continue;
    }

    let column = i - line_start;

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
          i += 1;
        }
      }
      tokens.push(Token {
        kind: TokenKind::Number,
        text: &source[start..i],
        line,
        column,
      });
      continue;
    }

    if c == b'"' || c == b'\'' {
      let quote = c;
      let start = i;
      let start_line = line;
      i += 1;
      while i < bytes.len() && bytes[i] != quote {
        if bytes[i] == b'\n' {
          line += 1;
          line_start = i + 1;
        }
        i += 1;
      }
      if i >= bytes.len() {
        return Err(CompileError::UnrecognizedCharacter {
          character: quote as char,
          line: start_line,
          column,
        });
      }
      i += 1;
      let text = &source[start..i];
      let kind = if text[1..text.len() - 1].chars().count() == 1 {
        TokenKind::CharLit
      } else {
        TokenKind::StrLit
      };
      tokens.push(Token {
        kind,
        text,
        line: start_line,
        column,
      });
      continue;
    }

    if c.is_ascii_alphabetic() || c == b'_' {
      if let Some((kind, len)) = match_phrase(&source[i..]) {
        tokens.push(Token {
          kind,
          text: &source[i..i + len],
          line,
          column,
        });
        i += len;
        continue;
      }

      let start = i;
      i += 1;
      while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
      }
      tokens.push(Token {
        kind: TokenKind::Ident,
        text: &source[start..i],
        line,
        column,
      });
      continue;
    }

    let kind = match c {
      b',' | b'(' | b')' => Some(TokenKind::Punctuation),
      b';' => Some(TokenKind::Semicolon),
      b'{' => Some(TokenKind::BlockOpen),
      b'}' => Some(TokenKind::BlockClose),
      _ => None,
    };
    if let Some(kind) = kind {
      tokens.push(Token {
        kind,
        text: &source[i..i + 1],
        line,
        column,
      });
      i += 1;
      continue;
    }

    let character = source[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::UnrecognizedCharacter {
      character,
      line,
      column,
    });
  }

  Ok(tokens)
}

/// Match a keyword or operator phrase at the start of `rest`, refusing
/// matches that run into a following identifier character (`android` is one
/// identifier, not `and` + `roid`).
fn match_phrase(rest: &str) -> Option<(TokenKind, usize)> {
  for &(phrase, kind) in PHRASES {
    if let Some(tail) = rest.strip_prefix(phrase) {
      let boundary = tail.bytes().next().is_none_or(|b| !is_ident_byte(b));
      if boundary {
        return Some((kind, phrase.len()));
      }
    }
  }
  None
}

fn is_ident_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_'
}
