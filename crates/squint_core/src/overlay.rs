//! The overlay validator.
//!
//! Walks every `ctrl` operation's overlay entries and classifies each one
//! Info/Warn/Error. In strict mode, the first malformed-or-violated finding
//! aborts the whole compile with an `OverlayError`; otherwise every finding
//! survives as a `Diagnostic` and compilation continues. Unknown keys and
//! the "accepted, not enforced" keys (`span`, `coherence_budget`) never
//! escalate, strict or not.

use crate::error::OverlayError;
use crate::ir::{OperationIR, ProgramIR, parse_qubit_index};
use squint_common::diagnostics::Diagnostic;
use squint_common::overlay::OverlayValue;

/// Validates every `ctrl` operation's overlay in kernel order.
///
/// Stops at the first strict-mode hard error: no partial control text or
/// timeline is emitted once compilation aborts.
pub fn validate_program(program: &ProgramIR, strict: bool) -> Result<Vec<Diagnostic>, OverlayError> {
    let mut diagnostics = Vec::new();
    for op in &program.kernel.operations {
        diagnostics.extend(validate_operation(op, program, strict)?);
    }
    Ok(diagnostics)
}

/// Validates a single operation's overlay entries.
pub fn validate_operation(
    op: &OperationIR,
    program: &ProgramIR,
    strict: bool,
) -> Result<Vec<Diagnostic>, OverlayError> {
    let mut diagnostics = Vec::new();
    for (key, value) in &op.overlay {
        let finding = classify(key, value, op, program);
        match finding {
            Finding::Info(msg) => diagnostics.push(Diagnostic::info(op.line, msg)),
            Finding::Warn(msg) => diagnostics.push(Diagnostic::warn(op.line, msg)),
            Finding::FatalEligible(msg) => {
                if strict {
                    return Err(OverlayError::new(op.line, msg));
                }
                diagnostics.push(Diagnostic::warn(op.line, msg));
            }
        }
    }
    Ok(diagnostics)
}

enum Finding {
    Info(String),
    Warn(String),
    /// A malformed-or-violated finding: Warn by default, promoted to a hard
    /// error under strict mode.
    FatalEligible(String),
}

fn classify(key: &str, value: &OverlayValue, op: &OperationIR, program: &ProgramIR) -> Finding {
    match value {
        OverlayValue::CoherenceLenNs(Ok(n)) if *n >= 0 => {
            Finding::Info(format!("coherence_len = {n}ns"))
        }
        OverlayValue::CoherenceLenNs(Ok(n)) => {
            Finding::FatalEligible(format!("coherence_len malformed: negative value {n}"))
        }
        OverlayValue::CoherenceLenNs(Err(raw)) => {
            Finding::FatalEligible(format!("coherence_len malformed: {raw}"))
        }

        OverlayValue::PathLenMax(Ok(k)) => classify_path_len(*k, op, program),
        OverlayValue::PathLenMax(Err(raw)) => {
            Finding::FatalEligible(format!("path_len malformed: {raw}"))
        }

        OverlayValue::Damping(Ok(field)) if program.workspace.has_semantic_field(field) => {
            Finding::Info(format!("damping references semantic field '{field}'"))
        }
        OverlayValue::Damping(Ok(field)) => {
            Finding::FatalEligible(format!("damping references unknown semantic field '{field}'"))
        }
        OverlayValue::Damping(Err(raw)) => Finding::FatalEligible(format!("damping malformed: {raw}")),

        OverlayValue::Braid(Ok(field)) if program.workspace.has_defect_field(field) => {
            Finding::Info(format!("braid references defect field '{field}'"))
        }
        OverlayValue::Braid(Ok(field)) => {
            Finding::FatalEligible(format!("braid references unknown defect field '{field}'"))
        }
        OverlayValue::Braid(Err(raw)) => Finding::FatalEligible(format!("braid malformed: {raw}")),

        OverlayValue::FloquetPeriodNs(Ok(n)) => Finding::Info(format!("floquet_period = {n}ns")),
        OverlayValue::FloquetPeriodNs(Err(raw)) => {
            Finding::FatalEligible(format!("floquet_period malformed: {raw}"))
        }

        OverlayValue::Cycles(Ok(n)) => Finding::Info(format!("cycles = {n}")),
        OverlayValue::Cycles(Err(raw)) => Finding::FatalEligible(format!("cycles malformed: {raw}")),

        OverlayValue::Duty(Ok(d)) => Finding::Info(format!("duty = {d}")),
        OverlayValue::Duty(Err(raw)) => Finding::FatalEligible(format!("duty malformed: {raw}")),

        // Informational only: a malformed phase_step never escalates, even
        // under strict mode, unlike every other malformed-value check.
        OverlayValue::PhaseStepDeg(Ok(d)) => Finding::Info(format!("phase_step = {d}deg")),
        OverlayValue::PhaseStepDeg(Err(raw)) => Finding::Warn(format!("phase_step malformed: {raw}")),

        OverlayValue::Span(_) | OverlayValue::CoherenceBudget(_) => {
            Finding::Info(format!("{key} accepted"))
        }

        OverlayValue::Unknown(key, _) => Finding::Warn(format!("unknown overlay key '{key}'")),
    }
}

fn classify_path_len(k: u32, op: &OperationIR, program: &ProgramIR) -> Finding {
    let Some(lattice) = program.workspace.lattice else {
        return Finding::FatalEligible("path_len requires a declared lattice".to_string());
    };
    let targets: Vec<u32> = op.args.targets.iter().filter_map(|t| parse_qubit_index(t)).collect();
    let [t0, t1] = targets.as_slice() else {
        return Finding::FatalEligible("path_len requires exactly two qubit targets".to_string());
    };
    let distance = lattice.manhattan(*t0, *t1);
    if distance <= k {
        Finding::Info(format!("path_len <= {k} satisfied (distance={distance})"))
    } else {
        Finding::FatalEligible(format!("path_len ≤ {k} violated (distance={distance})"))
    }
}
