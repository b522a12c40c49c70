//! Shared error taxonomy used across the compilation pipeline.
//!
//! Every failure is terminal for the current compilation: the pipeline
//! aborts on the first error and surfaces it with positional context.
//! There is no warning class and no recovery mode.

use snafu::Snafu;

use crate::ty::DataType;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  /// No token pattern matched at the current position.
  #[snafu(display("unrecognized character '{character}' on line {line}, column {column}"))]
  UnrecognizedCharacter {
    character: char,
    line: usize,
    column: usize,
  },

  /// A grammar rule required one token kind and found another.
  #[snafu(display("expected {expected}, but got \"{found}\" on line {line}, column {column}"))]
  UnexpectedToken {
    expected: String,
    found: String,
    line: usize,
    column: usize,
  },

  /// The single flat scope already holds a declaration for this name.
  #[snafu(display("variable '{name}' already declared (line {line}, column {column})"))]
  Redeclaration {
    name: String,
    line: usize,
    column: usize,
  },

  /// A name was referenced before its declaring statement was processed.
  #[snafu(display("variable '{name}' not declared (line {line}, column {column})"))]
  UndeclaredVariable {
    name: String,
    line: usize,
    column: usize,
  },

  /// Externally supplied input text did not convert to the declared type.
  #[snafu(display("invalid input \"{value}\" for variable '{name}' of type '{data_type}' (line {line})"))]
  TypeConversion {
    name: String,
    data_type: DataType,
    value: String,
    line: usize,
  },

  /// Constant folding evaluated the right operand of a division to zero.
  #[snafu(display("division by zero (line {line})"))]
  DivisionByZero { line: usize },

  /// A statement or expression kind with no evaluation or lowering rule.
  #[snafu(display("no lowering rule for {construct} (line {line})"))]
  UnsupportedNode { construct: String, line: usize },
}
