//! The parser's sole error type.

use thiserror::Error;

/// A fatal source-level syntax or structure error. Always aborts compilation
/// before any IR is produced — there is no error recovery, fail fast on the
/// first syntax problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError { line, message: message.into() }
    }
}
