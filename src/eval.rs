//! Compile-time evaluation: constant folding and input capture.
//!
//! Runs once between parsing and code generation, walking statements in
//! program order. Foldable initializer and assignment expressions are
//! reduced to a concrete value that is written both into the AST node and
//! into the symbol table, so later statements can fold against it. Input
//! statements synchronously block on the external `ValueSource` here, in
//! statement order, before any code is generated.

use std::collections::VecDeque;

use crate::error::{CompileError, CompileResult};
use crate::parser::{BinaryOp, Expr, Stmt};
use crate::symbol_table::SymbolTable;
use crate::ty::{DataType, Value};

/// External synchronous provider of input-statement values, keyed by the
/// target's declared type. The raw text is converted by the evaluator.
pub trait ValueSource {
  fn request(&mut self, name: &str, data_type: DataType) -> String;
}

/// A fixed queue of input values, handed out in order. Missing values are
/// treated as empty input and fail the usual conversion path.
#[derive(Debug, Default)]
pub struct QueuedValues {
  values: VecDeque<String>,
}

impl QueuedValues {
  pub fn new(values: &[&str]) -> Self {
    Self {
      values: values.iter().map(|v| v.to_string()).collect(),
    }
  }
}

impl ValueSource for QueuedValues {
  fn request(&mut self, _name: &str, _data_type: DataType) -> String {
    self.values.pop_front().unwrap_or_default()
  }
}

/// Fold every constant expression in the program and capture input values,
/// updating AST nodes and the symbol table in place.
pub fn evaluate_program(
  statements: &mut [Stmt],
  table: &mut SymbolTable,
  source: &mut dyn ValueSource,
) -> CompileResult<()> {
  for stmt in statements {
    match stmt {
      Stmt::Declaration {
        name,
        init: Some(expr),
        value,
        line,
        ..
      } => {
        let folded = fold_expr(expr, table, *line)?;
        *value = Some(folded.clone());
        table.set_value(name, folded);
      }
      Stmt::Declaration { init: None, .. } => {}
      Stmt::Assignment {
        name,
        expr,
        value,
        line,
      } => {
        let folded = fold_expr(expr, table, *line)?;
        *value = Some(folded.clone());
        table.set_value(name, folded);
      }
      Stmt::Input {
        name,
        captured,
        line,
      } => {
        let data_type = match table.get(name) {
          Some(entry) => entry.data_type,
          None => unreachable!("parser rejects undeclared input targets"),
        };
        let raw = source.request(name, data_type);
        let converted = convert_input(name, data_type, &raw, *line)?;
        *captured = Some(converted.clone());
        table.set_value(name, converted);
      }
      Stmt::Output { .. } => {}
      // Blocks are walked in order; conditions have no folding rule and
      // are left untouched.
      Stmt::If {
        then_block,
        else_block,
        ..
      } => {
        evaluate_program(then_block, table, source)?;
        if let Some(block) = else_block {
          evaluate_program(block, table, source)?;
        }
      }
    }
  }
  Ok(())
}

/// Reduce an expression to its compile-time value. Leaves read the symbol
/// table; arithmetic nodes fold with integer/decimal arithmetic, `augmented
/// by` concatenates string-like operands, and division by an evaluated zero
/// is a hard error before code generation.
fn fold_expr(expr: &Expr, table: &SymbolTable, line: usize) -> CompileResult<Value> {
  match expr {
    Expr::Number { value } => Ok(value.clone()),
    Expr::Char { value } => Ok(Value::Chr(*value)),
    Expr::Str { value } => Ok(Value::Str(value.clone())),
    Expr::Variable { name } => match table.get(name).and_then(|entry| entry.value.clone()) {
      Some(value) => Ok(value),
      None => Err(CompileError::UnsupportedNode {
        construct: format!("expression reading '{name}' before it holds a value"),
        line,
      }),
    },
    Expr::Binary { op, lhs, rhs } | Expr::CompoundAssign { op, lhs, rhs }
      if op.is_arithmetic() =>
    {
      let left = fold_expr(lhs, table, line)?;
      let right = fold_expr(rhs, table, line)?;
      apply_arithmetic(*op, left, right, line)
    }
    Expr::Binary { .. } | Expr::CompoundAssign { .. } => Err(CompileError::UnsupportedNode {
      construct: "a relational expression in a folded context".to_string(),
      line,
    }),
    Expr::Logical { .. } => Err(CompileError::UnsupportedNode {
      construct: "a logical expression in a folded context".to_string(),
      line,
    }),
  }
}

fn apply_arithmetic(
  op: BinaryOp,
  left: Value,
  right: Value,
  line: usize,
) -> CompileResult<Value> {
  if op == BinaryOp::Div && right.is_zero() {
    return Err(CompileError::DivisionByZero { line });
  }

  match (&left, &right) {
    (Value::Int(a), Value::Int(b)) => Ok(match op {
      BinaryOp::Add => Value::Int(a + b),
      BinaryOp::Sub => Value::Int(a - b),
      BinaryOp::Mul => Value::Int(a * b),
      BinaryOp::Div => Value::Int(a / b),
      _ => unreachable!("caller guarantees an arithmetic operator"),
    }),
    (Value::Int(_) | Value::Dec(_), Value::Int(_) | Value::Dec(_)) => {
      let (a, b) = (as_decimal(&left), as_decimal(&right));
      Ok(match op {
        BinaryOp::Add => Value::Dec(a + b),
        BinaryOp::Sub => Value::Dec(a - b),
        BinaryOp::Mul => Value::Dec(a * b),
        BinaryOp::Div => Value::Dec(a / b),
        _ => unreachable!("caller guarantees an arithmetic operator"),
      })
    }
    _ if op == BinaryOp::Add => match (string_like(&left), string_like(&right)) {
      (Some(a), Some(b)) => Ok(Value::Str(format!("{a}{b}"))),
      _ => Err(mixed_operands(line)),
    },
    _ => Err(mixed_operands(line)),
  }
}

fn as_decimal(value: &Value) -> f64 {
  match value {
    Value::Int(n) => *n as f64,
    Value::Dec(d) => *d,
    _ => unreachable!("caller guarantees a numeric operand"),
  }
}

fn string_like(value: &Value) -> Option<String> {
  match value {
    Value::Str(s) => Some(s.clone()),
    Value::Chr(c) => Some(c.to_string()),
    _ => None,
  }
}

fn mixed_operands(line: usize) -> CompileError {
  CompileError::UnsupportedNode {
    construct: "arithmetic over mixed string and numeric operands".to_string(),
    line,
  }
}

/// Convert raw input text to the declared type. `rune` targets have no
/// input conversion; the provider is keyed by integer, decimal, and string.
fn convert_input(
  name: &str,
  data_type: DataType,
  raw: &str,
  line: usize,
) -> CompileResult<Value> {
  let conversion_error = || CompileError::TypeConversion {
    name: name.to_string(),
    data_type,
    value: raw.to_string(),
    line,
  };

  match data_type {
    DataType::Tally => raw
      .trim()
      .parse::<i64>()
      .map(Value::Int)
      .map_err(|_| conversion_error()),
    DataType::Portion => raw
      .trim()
      .parse::<f64>()
      .map(Value::Dec)
      .map_err(|_| conversion_error()),
    DataType::Verse => Ok(Value::Str(raw.to_string())),
    DataType::Rune => Err(conversion_error()),
  }
}
