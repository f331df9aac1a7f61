//! Source-text front end: lexing and parsing `.squint` programs into
//! `squint_core::ir::ProgramIR`.
//!
//! Nothing in this crate interprets what it parses — overlay validation,
//! Floquet expansion, emission and simulation all live in `squint_core`.
//! This crate's only job is turning source text into IR, or a [`ParseError`]
//! pinpointing the first structural problem.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::ParseError;
pub use parser::parse_source;
