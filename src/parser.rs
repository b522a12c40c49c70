//! Recursive-descent parser producing a statement list and expression AST.
//!
//! The grammar functions are pure over their inputs except for one side
//! effect: declarations are registered in the symbol table passed down by
//! the caller, so every identifier reference can be checked at its point of
//! use. Constant folding and input capture live in a later pass (`eval`);
//! the parser's sole responsibility is a faithful tree.

use crate::error::{CompileError, CompileResult};
use crate::symbol_table::SymbolTable;
use crate::tokenizer::{Token, TokenKind};
use crate::ty::{DataType, Value};

/// Binary operators recognised by the language. Arithmetic operators fold
/// and lower; relational ones parse but have no evaluation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Lt,
  Gt,
  Le,
  Ge,
  Eq,
  Ne,
}

impl BinaryOp {
  pub fn is_arithmetic(&self) -> bool {
    matches!(
      self,
      BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
  And,
  Or,
}

/// Expression tree produced by the parser.
///
/// Compound operator phrases (`augment by` and friends) build a node
/// structurally distinct from their plain counterparts even though no
/// differing evaluation behaviour is defined for them.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number {
    value: Value,
  },
  Variable {
    name: String,
  },
  Char {
    value: char,
  },
  Str {
    value: String,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  Logical {
    op: LogicalOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  CompoundAssign {
    op: BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
}

impl Expr {
  pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn logical(op: LogicalOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Logical {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn compound(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Self::CompoundAssign {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

/// One item of a `cast spell ...` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
  Literal(String),
  Variable(String),
}

/// Top-level statement nodes. `value`/`captured` stay `None` until the
/// evaluation pass fills them; `line` is the source line of the first token
/// so post-parse stages can report actionable positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  Declaration {
    name: String,
    data_type: DataType,
    init: Option<Expr>,
    value: Option<Value>,
    line: usize,
  },
  Assignment {
    name: String,
    expr: Expr,
    value: Option<Value>,
    line: usize,
  },
  Input {
    name: String,
    captured: Option<Value>,
    line: usize,
  },
  Output {
    items: Vec<OutputItem>,
    line: usize,
  },
  If {
    condition: Expr,
    then_block: Vec<Stmt>,
    else_block: Option<Vec<Stmt>>,
    line: usize,
  },
}

/// Parse a whole token stream into a statement list, registering
/// declarations in `table` as they are encountered.
pub fn parse(tokens: &[Token<'_>], table: &mut SymbolTable) -> CompileResult<Vec<Stmt>> {
  let mut stream = TokenStream::new(tokens);
  let mut statements = Vec::new();
  while !stream.is_at_end() {
    statements.push(parse_stmt(&mut stream, table)?);
  }
  Ok(statements)
}

fn parse_stmt(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Stmt> {
  let token = match stream.peek() {
    Some(token) => token,
    None => return Err(stream.unexpected_end("a statement")),
  };
  match token.kind {
    TokenKind::DataType => parse_declaration(stream, table),
    TokenKind::Ident => parse_assignment(stream, table),
    TokenKind::Input => parse_input(stream, table),
    TokenKind::Output => parse_output(stream, table),
    TokenKind::If => parse_if(stream, table),
    _ => {
      let token = *token;
      Err(unexpected_at(&token, "a statement"))
    }
  }
}

fn parse_declaration(
  stream: &mut TokenStream<'_>,
  table: &mut SymbolTable,
) -> CompileResult<Stmt> {
  let ty_token = stream.expect(TokenKind::DataType, "a type keyword")?;
  let data_type = match DataType::from_keyword(ty_token.text) {
    Some(data_type) => data_type,
    None => unreachable!("token kind guarantees a type keyword"),
  };

  let name_token = stream.expect(TokenKind::Ident, "a variable name")?;
  if !table.declare(name_token.text, data_type) {
    return Err(CompileError::Redeclaration {
      name: name_token.text.to_string(),
      line: name_token.line,
      column: name_token.column,
    });
  }

  let init = if stream.check(TokenKind::Semicolon) {
    None
  } else {
    stream.expect_phrase("imbue with")?;
    Some(parse_expr(stream, table)?)
  };
  stream.expect(TokenKind::Semicolon, "\";\"")?;

  Ok(Stmt::Declaration {
    name: name_token.text.to_string(),
    data_type,
    init,
    value: None,
    line: ty_token.line,
  })
}

fn parse_assignment(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Stmt> {
  let name_token = stream.expect(TokenKind::Ident, "a variable name")?;
  check_declared(&name_token, table)?;
  stream.expect_phrase("imbue with")?;
  let expr = parse_expr(stream, table)?;
  stream.expect(TokenKind::Semicolon, "\";\"")?;

  Ok(Stmt::Assignment {
    name: name_token.text.to_string(),
    expr,
    value: None,
    line: name_token.line,
  })
}

fn parse_input(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Stmt> {
  let keyword = stream.expect(TokenKind::Input, "\"summon\"")?;
  let name_token = stream.expect(TokenKind::Ident, "a variable name")?;
  check_declared(&name_token, table)?;
  stream.expect(TokenKind::Semicolon, "\";\"")?;

  Ok(Stmt::Input {
    name: name_token.text.to_string(),
    captured: None,
    line: keyword.line,
  })
}

fn parse_output(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Stmt> {
  let keyword = stream.expect(TokenKind::Output, "\"cast\"")?;
  stream.expect(TokenKind::OutputMarker, "\"spell\"")?;

  let mut items = Vec::new();
  loop {
    let token = stream.next_token("a string literal or variable name")?;
    match token.kind {
      TokenKind::StrLit => items.push(OutputItem::Literal(strip_quotes(token.text))),
      TokenKind::Ident => {
        check_declared(&token, table)?;
        items.push(OutputItem::Variable(token.text.to_string()));
      }
      _ => return Err(unexpected_at(&token, "a string literal or variable name")),
    }

    if stream.check(TokenKind::OutputMarker) {
      stream.next_token("\"spell\"")?;
    } else {
      break;
    }
  }
  stream.expect(TokenKind::Semicolon, "\";\"")?;

  Ok(Stmt::Output {
    items,
    line: keyword.line,
  })
}

fn parse_if(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Stmt> {
  let keyword = stream.expect(TokenKind::If, "\"trial\"")?;
  stream.expect_punct("(")?;
  let condition = parse_expr(stream, table)?;
  stream.expect_punct(")")?;
  let then_block = parse_block(stream, table)?;

  let else_block = if stream.check(TokenKind::Else) {
    stream.next_token("\"failure\"")?;
    Some(parse_block(stream, table)?)
  } else {
    None
  };

  Ok(Stmt::If {
    condition,
    then_block,
    else_block,
    line: keyword.line,
  })
}

fn parse_block(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Vec<Stmt>> {
  stream.expect(TokenKind::BlockOpen, "\"{\"")?;
  let mut statements = Vec::new();
  while !stream.check(TokenKind::BlockClose) {
    if stream.is_at_end() {
      return Err(stream.unexpected_end("\"}\""));
    }
    statements.push(parse_stmt(stream, table)?);
  }
  stream.expect(TokenKind::BlockClose, "\"}\"")?;
  Ok(statements)
}

fn parse_expr(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Expr> {
  parse_logical(stream, table)
}

fn parse_logical(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Expr> {
  let mut node = parse_relational(stream, table)?;

  loop {
    let phrase = match stream.peek() {
      Some(token) if token.kind == TokenKind::Operator => token.text,
      _ => break,
    };
    let op = match phrase {
      "and" => LogicalOp::And,
      "or" => LogicalOp::Or,
      _ => break,
    };

    stream.next_token(phrase)?;
    let rhs = parse_relational(stream, table)?;
    node = Expr::logical(op, node, rhs);
  }

  Ok(node)
}

fn parse_relational(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Expr> {
  let mut node = parse_additive(stream, table)?;

  loop {
    let phrase = match stream.peek() {
      Some(token) if token.kind == TokenKind::Operator => token.text,
      _ => break,
    };
    let op = match phrase {
      "is inferior to" => BinaryOp::Lt,
      "is superior to" => BinaryOp::Gt,
      "is inferior or equal to" => BinaryOp::Le,
      "is superior or equal to" => BinaryOp::Ge,
      "is equal to" => BinaryOp::Eq,
      "is unequal to" => BinaryOp::Ne,
      _ => break,
    };

    stream.next_token(phrase)?;
    let rhs = parse_additive(stream, table)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_additive(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Expr> {
  let mut node = parse_multiplicative(stream, table)?;

  loop {
    let phrase = match stream.peek() {
      Some(token) if token.kind == TokenKind::Operator => token.text,
      _ => break,
    };
    let (op, compound) = match phrase {
      "augmented by" => (BinaryOp::Add, false),
      "diminished by" => (BinaryOp::Sub, false),
      "augment by" => (BinaryOp::Add, true),
      "diminish by" => (BinaryOp::Sub, true),
      _ => break,
    };

    stream.next_token(phrase)?;
    let rhs = parse_multiplicative(stream, table)?;
    node = if compound {
      Expr::compound(op, node, rhs)
    } else {
      Expr::binary(op, node, rhs)
    };
  }

  Ok(node)
}

fn parse_multiplicative(
  stream: &mut TokenStream<'_>,
  table: &mut SymbolTable,
) -> CompileResult<Expr> {
  let mut node = parse_primary(stream, table)?;

  loop {
    let phrase = match stream.peek() {
      Some(token) if token.kind == TokenKind::Operator => token.text,
      _ => break,
    };
    let (op, compound) = match phrase {
      "amplified by" => (BinaryOp::Mul, false),
      "fragmented by" => (BinaryOp::Div, false),
      "amplify by" => (BinaryOp::Mul, true),
      "fragment by" => (BinaryOp::Div, true),
      _ => break,
    };

    stream.next_token(phrase)?;
    let rhs = parse_primary(stream, table)?;
    node = if compound {
      Expr::compound(op, node, rhs)
    } else {
      Expr::binary(op, node, rhs)
    };
  }

  Ok(node)
}

fn parse_primary(stream: &mut TokenStream<'_>, table: &mut SymbolTable) -> CompileResult<Expr> {
  let token = stream.next_token("an expression")?;
  match token.kind {
    TokenKind::Number => {
      let value = if token.text.contains('.') {
        token
          .text
          .parse::<f64>()
          .map(Value::Dec)
          .map_err(|_| unexpected_at(&token, "a representable number"))?
      } else {
        token
          .text
          .parse::<i64>()
          .map(Value::Int)
          .map_err(|_| unexpected_at(&token, "a representable number"))?
      };
      Ok(Expr::Number { value })
    }
    TokenKind::Ident => {
      check_declared(&token, table)?;
      Ok(Expr::Variable {
        name: token.text.to_string(),
      })
    }
    TokenKind::CharLit => {
      let Some(value) = strip_quotes(token.text).chars().next() else {
        return Err(unexpected_at(&token, "a character literal"));
      };
      Ok(Expr::Char { value })
    }
    TokenKind::StrLit => Ok(Expr::Str {
      value: strip_quotes(token.text),
    }),
    TokenKind::Punctuation if token.text == "(" => {
      let node = parse_expr(stream, table)?;
      stream.expect_punct(")")?;
      Ok(node)
    }
    _ => Err(unexpected_at(&token, "an expression")),
  }
}

fn check_declared(token: &Token<'_>, table: &SymbolTable) -> CompileResult<()> {
  if table.contains(token.text) {
    Ok(())
  } else {
    Err(CompileError::UndeclaredVariable {
      name: token.text.to_string(),
      line: token.line,
      column: token.column,
    })
  }
}

/// Drop the surrounding quote characters the tokenizer preserved.
fn strip_quotes(lexeme: &str) -> String {
  lexeme[1..lexeme.len() - 1].to_string()
}

fn unexpected_at(token: &Token<'_>, expected: &str) -> CompileError {
  CompileError::UnexpectedToken {
    expected: expected.to_string(),
    found: token.text.to_string(),
    line: token.line,
    column: token.column,
  }
}

/// Lightweight cursor over the token slice.
struct TokenStream<'a> {
  tokens: &'a [Token<'a>],
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: &'a [Token<'a>]) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&Token<'a>> {
    self.tokens.get(self.pos)
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.peek().is_some_and(|token| token.kind == kind)
  }

  fn is_at_end(&self) -> bool {
    self.pos >= self.tokens.len()
  }

  /// Consume and return the current token, failing at end of input.
  fn next_token(&mut self, expected: &str) -> CompileResult<Token<'a>> {
    match self.tokens.get(self.pos) {
      Some(&token) => {
        self.pos += 1;
        Ok(token)
      }
      None => Err(self.unexpected_end(expected)),
    }
  }

  fn expect(&mut self, kind: TokenKind, expected: &str) -> CompileResult<Token<'a>> {
    let token = self.next_token(expected)?;
    if token.kind == kind {
      Ok(token)
    } else {
      Err(unexpected_at(&token, expected))
    }
  }

  /// Consume an operator token with this exact phrase.
  fn expect_phrase(&mut self, phrase: &str) -> CompileResult<Token<'a>> {
    let expected = format!("\"{phrase}\"");
    let token = self.next_token(&expected)?;
    if token.kind == TokenKind::Operator && token.text == phrase {
      Ok(token)
    } else {
      Err(unexpected_at(&token, &expected))
    }
  }

  fn expect_punct(&mut self, text: &str) -> CompileResult<Token<'a>> {
    let expected = format!("\"{text}\"");
    let token = self.next_token(&expected)?;
    if token.kind == TokenKind::Punctuation && token.text == text {
      Ok(token)
    } else {
      Err(unexpected_at(&token, &expected))
    }
  }

  fn unexpected_end(&self, expected: &str) -> CompileError {
    let (line, column) = self
      .tokens
      .last()
      .map(|token| (token.line, token.column + token.text.len()))
      .unwrap_or((1, 0));
    CompileError::UnexpectedToken {
      expected: expected.to_string(),
      found: "end of input".to_string(),
      line,
      column,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn parse_source(source: &str) -> CompileResult<(Vec<Stmt>, SymbolTable)> {
    let tokens = tokenize(source)?;
    let mut table = SymbolTable::new();
    let statements = parse(&tokens, &mut table)?;
    Ok((statements, table))
  }

  #[test]
  fn declaration_with_initializer() {
    let (statements, table) = parse_source("tally x imbue with 4;").expect("parse");
    assert_eq!(
      statements,
      vec![Stmt::Declaration {
        name: "x".to_string(),
        data_type: DataType::Tally,
        init: Some(Expr::Number {
          value: Value::Int(4)
        }),
        value: None,
        line: 1,
      }]
    );
    assert_eq!(table.get("x").expect("entry").data_type, DataType::Tally);
  }

  #[test]
  fn bare_declaration_has_no_initializer() {
    let (statements, _) = parse_source("verse s;").expect("parse");
    assert!(matches!(
      &statements[0],
      Stmt::Declaration {
        data_type: DataType::Verse,
        init: None,
        ..
      }
    ));
  }

  #[test]
  fn multiplicative_binds_tighter_than_additive() {
    let (statements, _) =
      parse_source("tally x imbue with 1 augmented by 2 amplified by 3;").expect("parse");
    let Stmt::Declaration {
      init: Some(expr), ..
    } = &statements[0]
    else {
      panic!("expected a declaration");
    };
    assert_eq!(
      *expr,
      Expr::binary(
        BinaryOp::Add,
        Expr::Number {
          value: Value::Int(1)
        },
        Expr::binary(
          BinaryOp::Mul,
          Expr::Number {
            value: Value::Int(2)
          },
          Expr::Number {
            value: Value::Int(3)
          },
        ),
      )
    );
  }

  #[test]
  fn compound_phrases_build_a_distinct_node() {
    let (statements, _) = parse_source("tally x imbue with 1 augment by 2;").expect("parse");
    let Stmt::Declaration {
      init: Some(expr), ..
    } = &statements[0]
    else {
      panic!("expected a declaration");
    };
    assert!(matches!(
      expr,
      Expr::CompoundAssign {
        op: BinaryOp::Add,
        ..
      }
    ));
  }

  #[test]
  fn redeclaration_is_rejected() {
    let err = parse_source("tally x; verse x;").expect_err("must fail");
    assert!(matches!(err, CompileError::Redeclaration { .. }));
  }

  #[test]
  fn use_before_declare_is_rejected_everywhere() {
    for source in [
      "tally y imbue with x augmented by 1; tally x;",
      "x imbue with 4;",
      "cast spell x;",
      "summon x;",
    ] {
      let err = parse_source(source).expect_err("must fail");
      assert!(
        matches!(&err, CompileError::UndeclaredVariable { name, .. } if name == "x"),
        "source {source:?} gave {err}"
      );
    }
  }

  #[test]
  fn assignment_requires_the_imbue_phrase() {
    let err = parse_source("tally x; x augmented by 4;").expect_err("must fail");
    assert!(matches!(err, CompileError::UnexpectedToken { .. }));
  }

  #[test]
  fn output_accepts_literals_and_variables() {
    let (statements, _) =
      parse_source("tally x; cast spell \"value: \" spell x;").expect("parse");
    assert_eq!(
      statements[1],
      Stmt::Output {
        items: vec![
          OutputItem::Literal("value: ".to_string()),
          OutputItem::Variable("x".to_string()),
        ],
        line: 1,
      }
    );
  }

  #[test]
  fn if_else_parses_into_blocks() {
    let source = "tally a imbue with 5; \
                  trial (a is inferior to 6) { cast spell \"victory\"; } \
                  failure { cast spell \"defeat\"; }";
    let (statements, _) = parse_source(source).expect("parse");
    let Stmt::If {
      condition,
      then_block,
      else_block,
      ..
    } = &statements[1]
    else {
      panic!("expected a trial statement");
    };
    assert!(matches!(condition, Expr::Binary { op: BinaryOp::Lt, .. }));
    assert_eq!(then_block.len(), 1);
    assert_eq!(else_block.as_ref().map(Vec::len), Some(1));
  }

  #[test]
  fn logical_operators_chain_in_conditions() {
    let source = "tally a imbue with 1; \
                  trial (a is equal to 1 and a is inferior to 2) { summon a; }";
    let (statements, _) = parse_source(source).expect("parse");
    let Stmt::If { condition, .. } = &statements[1] else {
      panic!("expected a trial statement");
    };
    assert!(matches!(
      condition,
      Expr::Logical {
        op: LogicalOp::And,
        ..
      }
    ));
  }

  #[test]
  fn loop_keyword_has_no_statement_rule() {
    let err = parse_source("cycle (1) { }").expect_err("must fail");
    assert!(matches!(err, CompileError::UnexpectedToken { .. }));
  }

  #[test]
  fn missing_semicolon_is_reported() {
    let err = parse_source("tally x imbue with 4").expect_err("must fail");
    assert!(
      matches!(err, CompileError::UnexpectedToken { ref found, .. } if found == "end of input")
    );
  }
}
