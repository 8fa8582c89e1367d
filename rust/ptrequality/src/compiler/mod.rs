//! Front end for the Go subset: lexing, parsing and a lenient type checker.

pub mod ast;
pub mod check;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod tokens;
pub mod types;
pub mod universe;
