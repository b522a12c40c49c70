//! Declared types and compile-time values shared by the parser, the
//! evaluator, and the code generator.

use std::fmt;

/// The four declarable types of the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
  /// `tally` – integer scalar.
  Tally,
  /// `rune` – single-character scalar.
  Rune,
  /// `portion` – decimal scalar.
  Portion,
  /// `verse` – buffer-backed string.
  Verse,
}

impl DataType {
  pub fn from_keyword(word: &str) -> Option<Self> {
    match word {
      "tally" => Some(DataType::Tally),
      "rune" => Some(DataType::Rune),
      "portion" => Some(DataType::Portion),
      "verse" => Some(DataType::Verse),
      _ => None,
    }
  }

  pub fn keyword(&self) -> &'static str {
    match self {
      DataType::Tally => "tally",
      DataType::Rune => "rune",
      DataType::Portion => "portion",
      DataType::Verse => "verse",
    }
  }

  /// `verse` values live in a fixed 100-byte buffer rather than a word.
  pub fn is_buffer_backed(&self) -> bool {
    matches!(self, DataType::Verse)
  }
}

impl fmt::Display for DataType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.keyword())
  }
}

/// A compile-time-known value carried by the symbol table and by folded
/// declaration/assignment nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Int(i64),
  Dec(f64),
  Chr(char),
  Str(String),
}

impl Value {
  /// Text placed after a `.word` directive or an `li` immediate. Characters
  /// emit their code point so the directive stays assemblable.
  pub fn as_word(&self) -> String {
    match self {
      Value::Int(n) => n.to_string(),
      Value::Dec(d) => d.to_string(),
      Value::Chr(c) => (*c as u32).to_string(),
      Value::Str(s) => s.clone(),
    }
  }

  pub fn is_zero(&self) -> bool {
    match self {
      Value::Int(n) => *n == 0,
      Value::Dec(d) => *d == 0.0,
      _ => false,
    }
  }
}
