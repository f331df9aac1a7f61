//! The one error kind the compiler core can raise.
//!
//! `ParseError` is the syntax/structure half and lives in `squint_io`, since
//! only the parser can raise it; `OverlayError` is the strict-mode overlay
//! half and lives here, since only the validator raises it. Both are fatal
//! by construction — there is no "recoverable `OverlayError`".

use thiserror::Error;

/// An overlay constraint was malformed or violated while strict mode was on.
///
/// Non-strict findings of the same kind never reach this type: they stay
/// `Diagnostic`s (`squint_common::diagnostics`) and are printed, not raised.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct OverlayError {
    pub line: usize,
    pub message: String,
}

impl OverlayError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        OverlayError { line, message: message.into() }
    }
}
