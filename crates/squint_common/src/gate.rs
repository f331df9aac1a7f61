//! Canonical quantum gate vocabulary.
//!
//! The emitter recognises a closed set of gate names; everything else is an
//! unsupported gate that still has to be passed through (as a comment, or
//! replicated per Floquet cycle) rather than rejected. This module is the
//! single place that table lives, so the parser and the emitter can't drift
//! on which names are "known".

use serde::{Deserialize, Serialize};

/// A gate name recognised by the emitter, or an unrecognised passthrough.
///
/// Unknown gates are not a parse error: they are preserved verbatim so the
/// control text can still comment them in and the timeline can still
/// record their ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    X,
    H,
    Rx,
    Cx,
    Cz,
    Unsupported(String),
}

impl Gate {
    /// Classifies a raw gate identifier from source text.
    pub fn parse(name: &str) -> Gate {
        match name {
            "x" => Gate::X,
            "h" => Gate::H,
            "rx" => Gate::Rx,
            "cx" => Gate::Cx,
            "cz" => Gate::Cz,
            other => Gate::Unsupported(other.to_string()),
        }
    }

    /// The name as it should appear in `play('<name>', ...)` / timeline entries.
    pub fn as_str(&self) -> &str {
        match self {
            Gate::X => "x",
            Gate::H => "h",
            Gate::Rx => "rx",
            Gate::Cx => "cx",
            Gate::Cz => "cz",
            Gate::Unsupported(name) => name,
        }
    }

    /// Whether the emitter knows how to lower this gate to a `play(...)` line.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Gate::Unsupported(_))
    }

    /// Number of qubit targets the gate expects, when that is fixed.
    ///
    /// Returns `None` for unsupported gates since their arity is whatever
    /// the source declared; the parser does not second-guess unknown gates.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Gate::X | Gate::H | Gate::Rx => Some(1),
            Gate::Cx | Gate::Cz => Some(2),
            Gate::Unsupported(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_canonical_names() {
        assert_eq!(Gate::parse("cz"), Gate::Cz);
        assert_eq!(Gate::parse("rx").arity(), Some(1));
    }

    #[test]
    fn unknown_gate_round_trips_its_name() {
        let g = Gate::parse("swap");
        assert!(!g.is_supported());
        assert_eq!(g.as_str(), "swap");
    }
}
