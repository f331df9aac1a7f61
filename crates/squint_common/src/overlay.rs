//! The overlay value tagged union.
//!
//! An overlay clause attaches physical hints to a `ctrl` operation as a
//! list of `key` or `key COMPARATOR value` pairs. The parser normalises the
//! raw `(key, operator, raw value text)` triple into one of these variants;
//! the overlay validator in `squint_core` then pattern-matches on the
//! variant instead of re-parsing strings. Recognised-but-malformed input and
//! genuinely unknown keys both survive parsing as data (`Unknown`), never as
//! a parse error — an unknown overlay key is always a Warn, never fatal.

use serde::{Deserialize, Serialize};

/// A single normalised overlay key/value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayValue {
    /// `coherence_len ≥ N` (nanoseconds). Carries the raw integer text so a
    /// malformed integer can still be reported with the offending text.
    CoherenceLenNs(Result<i64, String>),
    /// `path_len ≤ k`.
    PathLenMax(Result<u32, String>),
    /// `damping = η(Φ=IDENT)` / `eta(Phi=IDENT)`.
    Damping(Result<String, String>),
    /// `braid = IDENT`.
    Braid(Result<String, String>),
    /// `floquet_period = N` (ns).
    FloquetPeriodNs(Result<u32, String>),
    /// `cycles = N`.
    Cycles(Result<u32, String>),
    /// `duty = d`, expected in `(0, 1]`.
    Duty(Result<f64, String>),
    /// `phase_step = deg` (informational only).
    PhaseStepDeg(Result<f64, String>),
    /// `span = ...`, accepted and never enforced.
    Span(String),
    /// `coherence_budget = ...`, accepted and never enforced.
    CoherenceBudget(String),
    /// Any key the validator does not recognise: `(key, raw value text)`.
    Unknown(String, String),
}

impl OverlayValue {
    /// The overlay key this value was parsed from, for diagnostics.
    pub fn key(&self) -> &str {
        match self {
            OverlayValue::CoherenceLenNs(_) => "coherence_len",
            OverlayValue::PathLenMax(_) => "path_len",
            OverlayValue::Damping(_) => "damping",
            OverlayValue::Braid(_) => "braid",
            OverlayValue::FloquetPeriodNs(_) => "floquet_period",
            OverlayValue::Cycles(_) => "cycles",
            OverlayValue::Duty(_) => "duty",
            OverlayValue::PhaseStepDeg(_) => "phase_step",
            OverlayValue::Span(_) => "span",
            OverlayValue::CoherenceBudget(_) => "coherence_budget",
            OverlayValue::Unknown(key, _) => key,
        }
    }

    /// Builds the normalised overlay value for `key` from its raw value text.
    ///
    /// `raw` is the verbatim text between the key's comparator and the next
    /// top-level comma or closing brace, already trimmed. This never fails:
    /// an unparsable value is preserved as the `Err` arm of the relevant
    /// variant so the validator (not the parser) decides whether that is a
    /// Warn or, in strict mode, a hard error.
    pub fn from_raw(key: &str, raw: &str) -> OverlayValue {
        match key {
            "coherence_len" => OverlayValue::CoherenceLenNs(parse_int_with_unit(raw, "ns")),
            "path_len" => OverlayValue::PathLenMax(
                parse_int_with_unit(raw, "").and_then(|v: i64| {
                    u32::try_from(v).map_err(|_| raw.to_string())
                }),
            ),
            "damping" => OverlayValue::Damping(parse_damping(raw)),
            "braid" => OverlayValue::Braid(if raw.is_empty() {
                Err(raw.to_string())
            } else {
                Ok(raw.to_string())
            }),
            "floquet_period" => OverlayValue::FloquetPeriodNs(
                parse_int_with_unit(raw, "ns").and_then(|v: i64| {
                    if v > 0 { u32::try_from(v).map_err(|_| raw.to_string()) } else { Err(raw.to_string()) }
                }),
            ),
            "cycles" => OverlayValue::Cycles(parse_int_with_unit(raw, "").and_then(|v: i64| {
                if v >= 1 { u32::try_from(v).map_err(|_| raw.to_string()) } else { Err(raw.to_string()) }
            })),
            "duty" => OverlayValue::Duty(raw.parse::<f64>().map_err(|_| raw.to_string()).and_then(|d| {
                if d > 0.0 && d <= 1.0 { Ok(d) } else { Err(raw.to_string()) }
            })),
            "phase_step" => OverlayValue::PhaseStepDeg(parse_float_with_unit(raw, "deg")),
            "span" => OverlayValue::Span(raw.to_string()),
            "coherence_budget" => OverlayValue::CoherenceBudget(raw.to_string()),
            other => OverlayValue::Unknown(other.to_string(), raw.to_string()),
        }
    }
}

/// Parses an integer with an optional trailing unit suffix (e.g. `"80ns"`).
fn parse_int_with_unit(raw: &str, unit: &str) -> Result<i64, String> {
    let digits = raw.strip_suffix(unit).unwrap_or(raw);
    digits.trim().parse::<i64>().map_err(|_| raw.to_string())
}

/// Parses a float with an optional trailing unit suffix (e.g. `"12deg"`).
fn parse_float_with_unit(raw: &str, unit: &str) -> Result<f64, String> {
    let digits = raw.strip_suffix(unit).unwrap_or(raw);
    digits.trim().parse::<f64>().map_err(|_| raw.to_string())
}

/// Extracts the field identifier from `η(Φ=IDENT)` / `eta(Phi=IDENT)`.
fn parse_damping(raw: &str) -> Result<String, String> {
    let inner = raw
        .strip_prefix('η')
        .or_else(|| raw.strip_prefix("eta"))
        .and_then(|s| s.strip_prefix('('))
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| raw.to_string())?;

    let (field_name, ident) = inner.split_once('=').ok_or_else(|| raw.to_string())?;
    if (field_name == "Φ" || field_name == "Phi") && !ident.is_empty() {
        Ok(ident.to_string())
    } else {
        Err(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coherence_len_parses_ns_suffix() {
        assert_eq!(OverlayValue::from_raw("coherence_len", "80ns"), OverlayValue::CoherenceLenNs(Ok(80)));
    }

    #[test]
    fn malformed_coherence_len_is_preserved_not_rejected() {
        let v = OverlayValue::from_raw("coherence_len", "soon");
        assert_eq!(v, OverlayValue::CoherenceLenNs(Err("soon".to_string())));
    }

    #[test]
    fn damping_accepts_unicode_and_ascii_forms() {
        assert_eq!(OverlayValue::from_raw("damping", "η(Φ=Gamma)"), OverlayValue::Damping(Ok("Gamma".to_string())));
        assert_eq!(OverlayValue::from_raw("damping", "eta(Phi=Gamma)"), OverlayValue::Damping(Ok("Gamma".to_string())));
    }

    #[test]
    fn unknown_key_never_errors() {
        let v = OverlayValue::from_raw("frobnicate", "7");
        assert_eq!(v, OverlayValue::Unknown("frobnicate".to_string(), "7".to_string()));
    }
}
