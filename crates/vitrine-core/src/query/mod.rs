/// Query engine module
///
/// Select-spec parsing, query plans and plan execution.
/// Query plan types
#[allow(missing_docs)]
pub mod ast;
/// Plan executor
#[allow(missing_docs)]
pub mod executor;
/// Select-spec lexer
#[allow(missing_docs)]
pub mod lexer;
/// Select-spec parser
#[allow(missing_docs)]
pub mod parser;

// Re-export main types
pub use ast::*;
pub use executor::{ExecutionLimits, Executor};
pub use lexer::{Lexer, LexerError, Token};
pub use parser::{parse_select, ParseError, Parser};
