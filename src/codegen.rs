//! Code generation: lower the evaluated AST into MIPS assembly text.
//!
//! The emitter keeps two ordered instruction lists. The data segment holds
//! one `.word` per scalar declaration (initialized from the folded value),
//! a 100-byte `.space` buffer per string variable, and `.asciiz` entries
//! for hoisted string literals. The text segment holds the lowered
//! statements followed by the exit syscall. Temporaries are the ten `$t`
//! registers handed out cyclically with no liveness tracking, so deep
//! expression trees can alias a register that is still in use.

use std::collections::HashSet;

use crate::error::{CompileError, CompileResult};
use crate::parser::{BinaryOp, Expr, OutputItem, Stmt};
use crate::symbol_table::SymbolTable;
use crate::ty::Value;

/// Size of the backing buffer reserved for every string variable.
const STRING_BUFFER_BYTES: usize = 100;

/// Emit assembly for an evaluated program.
pub fn generate(program: &[Stmt], table: &SymbolTable) -> CompileResult<String> {
  Generator::new(table).run(program)
}

struct Generator<'a> {
  table: &'a SymbolTable,
  data: Vec<String>,
  text: Vec<String>,
  next_temp: usize,
  buffers: HashSet<String>,
}

impl<'a> Generator<'a> {
  fn new(table: &'a SymbolTable) -> Self {
    Self {
      table,
      data: vec![".data".to_string()],
      text: vec![".text".to_string(), ".globl main".to_string(), "main:".to_string()],
      next_temp: 0,
      buffers: HashSet::new(),
    }
  }

  fn run(mut self, program: &[Stmt]) -> CompileResult<String> {
    for stmt in program {
      self.emit_stmt(stmt)?;
    }

    let mut lines = self.data;
    lines.extend(self.text);
    lines.push("li $v0, 10".to_string());
    lines.push("syscall".to_string());
    Ok(lines.join("\n"))
  }

  /// Next temporary register, cycling through `$t0`..`$t9` with no
  /// liveness tracking and no per-statement reset.
  fn temp(&mut self) -> String {
    let reg = format!("$t{}", self.next_temp);
    self.next_temp = (self.next_temp + 1) % 10;
    reg
  }

  fn emit_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
    match stmt {
      Stmt::Declaration {
        name,
        data_type,
        init,
        value,
        line,
      } => {
        if data_type.is_buffer_backed() {
          self.reserve_buffer(name);
          if init.is_some() {
            self.copy_into_buffer(name, init.as_ref(), value.as_ref(), *line)?;
          }
        } else {
          let word = value.as_ref().map(Value::as_word).unwrap_or_else(|| "0".to_string());
          self.data.push(format!("{name}: .word {word}"));
        }
        Ok(())
      }
      Stmt::Assignment {
        name,
        expr,
        value,
        line,
      } => {
        let buffer_backed = self
          .table
          .get(name)
          .is_some_and(|entry| entry.data_type.is_buffer_backed());
        if buffer_backed {
          self.reserve_buffer(name);
          self.copy_into_buffer(name, Some(expr), value.as_ref(), *line)?;
        } else {
          let target = self.temp();
          self.emit_expr_into(expr, &target, *line)?;
          self.text.push(format!("sw {target}, {name}"));
        }
        Ok(())
      }
      Stmt::Input { name, .. } => {
        let buffer_backed = self
          .table
          .get(name)
          .is_some_and(|entry| entry.data_type.is_buffer_backed());
        if buffer_backed {
          self.reserve_buffer(name);
          self.text.push(format!("la $a0, {name}"));
          self.text.push(format!("li $a1, {STRING_BUFFER_BYTES}"));
          self.text.push("li $v0, 8".to_string());
          self.text.push("syscall".to_string());
        } else {
          self.text.push("li $v0, 5".to_string());
          self.text.push("syscall".to_string());
          self.text.push(format!("sw $v0, {name}"));
        }
        Ok(())
      }
      Stmt::Output { items, .. } => {
        for item in items {
          match item {
            OutputItem::Literal(text) => {
              let label = self.intern_literal(text);
              self.text.push(format!("la $a0, {label}"));
              self.text.push("li $v0, 4".to_string());
            }
            OutputItem::Variable(name) => {
              let buffer_backed = self
                .table
                .get(name)
                .is_some_and(|entry| entry.data_type.is_buffer_backed());
              if buffer_backed {
                self.reserve_buffer(name);
                self.text.push(format!("la $a0, {name}"));
                self.text.push("li $v0, 4".to_string());
              } else {
                self.text.push(format!("lw $a0, {name}"));
                self.text.push("li $v0, 1".to_string());
              }
            }
          }
          self.text.push("syscall".to_string());
        }
        Ok(())
      }
      Stmt::If { line, .. } => Err(CompileError::UnsupportedNode {
        construct: "a trial/failure statement".to_string(),
        line: *line,
      }),
    }
  }

  /// Evaluate an expression into `target` at runtime. Binary nodes emit
  /// their operands into two freshly allocated temporaries first.
  fn emit_expr_into(&mut self, expr: &Expr, target: &str, line: usize) -> CompileResult<()> {
    match expr {
      Expr::Number { value } => {
        self.text.push(format!("li {target}, {}", value.as_word()));
        Ok(())
      }
      Expr::Char { value } => {
        self.text.push(format!("li {target}, {}", *value as u32));
        Ok(())
      }
      Expr::Variable { name } => {
        self.text.push(format!("lw {target}, {name}"));
        Ok(())
      }
      Expr::Binary { op, lhs, rhs } | Expr::CompoundAssign { op, lhs, rhs }
        if op.is_arithmetic() =>
      {
        let left = self.temp();
        let right = self.temp();
        self.emit_expr_into(lhs, &left, line)?;
        self.emit_expr_into(rhs, &right, line)?;
        match op {
          BinaryOp::Add => self.text.push(format!("add {target}, {left}, {right}")),
          BinaryOp::Sub => self.text.push(format!("sub {target}, {left}, {right}")),
          BinaryOp::Mul => self.text.push(format!("mul {target}, {left}, {right}")),
          BinaryOp::Div => {
            self.text.push(format!("div {target}, {left}, {right}"));
            self.text.push(format!("mflo {target}"));
          }
          _ => unreachable!("guard guarantees an arithmetic operator"),
        }
        Ok(())
      }
      Expr::Binary { .. } | Expr::CompoundAssign { .. } | Expr::Logical { .. } => {
        Err(CompileError::UnsupportedNode {
          construct: "a relational or logical expression".to_string(),
          line,
        })
      }
      Expr::Str { .. } => Err(CompileError::UnsupportedNode {
        construct: "a string literal in a scalar expression".to_string(),
        line,
      }),
    }
  }

  /// Byte-copy into a string variable's buffer, from another variable's
  /// buffer or from a hoisted literal holding the folded value. The loop
  /// labels are fixed, so a program can hold at most one copy sequence
  /// without a label collision.
  fn copy_into_buffer(
    &mut self,
    name: &str,
    expr: Option<&Expr>,
    value: Option<&Value>,
    line: usize,
  ) -> CompileResult<()> {
    let source_label = match (expr, value) {
      (Some(Expr::Variable { name: src }), _) => {
        let src_buffer_backed = self
          .table
          .get(src)
          .is_some_and(|entry| entry.data_type.is_buffer_backed());
        if !src_buffer_backed {
          return Err(CompileError::UnsupportedNode {
            construct: format!("copying a scalar variable '{src}' into a string buffer"),
            line,
          });
        }
        self.reserve_buffer(src);
        src.to_string()
      }
      (_, Some(Value::Str(text))) => self.intern_literal(text),
      _ => {
        return Err(CompileError::UnsupportedNode {
          construct: "a non-string value assigned to a string variable".to_string(),
          line,
        });
      }
    };

    let src = self.temp();
    let dst = self.temp();
    let remaining = self.temp();
    let byte = self.temp();
    self.text.push(format!("la {src}, {source_label}"));
    self.text.push(format!("la {dst}, {name}"));
    self.text.push(format!("li {remaining}, {STRING_BUFFER_BYTES}"));
    self.text.push("copy_loop:".to_string());
    self.text.push(format!("lb {byte}, 0({src})"));
    self.text.push(format!("sb {byte}, 0({dst})"));
    self.text.push(format!("beqz {byte}, copy_done"));
    self.text.push(format!("addi {src}, {src}, 1"));
    self.text.push(format!("addi {dst}, {dst}, 1"));
    self.text.push(format!("subi {remaining}, {remaining}, 1"));
    self.text.push(format!("bnez {remaining}, copy_loop"));
    self.text.push("copy_done:".to_string());
    Ok(())
  }

  /// Reserve the 100-byte backing buffer for a string variable, once per
  /// name no matter which statement touches it first.
  fn reserve_buffer(&mut self, name: &str) {
    if self.buffers.insert(name.to_string()) {
      self.data.push(format!("{name}: .space {STRING_BUFFER_BYTES}"));
    }
  }

  /// Hoist a string literal into a fresh labeled data entry.
  fn intern_literal(&mut self, text: &str) -> String {
    let label = format!("str_{}", self.data.len());
    self.data.push(format!("{label}: .asciiz \"{text}\""));
    label
  }
}
