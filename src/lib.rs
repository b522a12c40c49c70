//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge, registering declarations in the
//!   symbol table and returning the statement AST.
//! - `eval` folds constant expressions and captures input values, blocking
//!   on the external value source in statement order.
//! - `codegen` lowers the evaluated program into MIPS assembly text.
//! - `error` centralises the taxonomy shared by all stages.

pub mod codegen;
pub mod error;
pub mod eval;
pub mod parser;
pub mod symbol_table;
pub mod tokenizer;
pub mod ty;

pub use error::{CompileError, CompileResult};
pub use eval::{QueuedValues, ValueSource};

/// Compile a source string into MIPS assembly, drawing input-statement
/// values from the provided source.
pub fn generate_assembly(source: &str, values: &mut dyn ValueSource) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let mut table = symbol_table::SymbolTable::new();
  let mut program = parser::parse(&tokens, &mut table)?;
  eval::evaluate_program(&mut program, &mut table, values)?;
  codegen::generate(&program, &table)
}
