//! Diagnostic severities and records emitted by the overlay validator.
//!
//! Every overlay finding is classified Info, Warn, or Error. Info and Warn
//! are always printed and never halt compilation; an Error is fatal only in
//! strict mode, at which point it is raised as `squint_core::error::OverlayError`
//! instead of staying a `Diagnostic`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single overlay-validator finding, attached to the source line it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn info(line: usize, message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Info, line, message: message.into() }
    }

    pub fn warn(line: usize, message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warn, line, message: message.into() }
    }

    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Error, line, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: line {}: {}", self.severity, self.line, self.message)
    }
}
