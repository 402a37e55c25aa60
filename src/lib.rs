pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod toolchain;

use diagnostics::CompileError;
use parser::ast::Program;

/// Lex and parse Flow source into an AST.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    parser::parse(source)
}

/// Full front end: Flow source text in, generated C++ source text out
/// (lex → parse → generate). No file I/O and no native compilation.
pub fn generate(source: &str) -> Result<String, CompileError> {
    let program = parser::parse(source)?;
    Ok(codegen::generate(&program))
}
