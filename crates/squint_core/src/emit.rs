//! The joint emitter and timeline scheduler.
//!
//! A single left-to-right walk over the kernel's operations produces the
//! control text and the timeline together under one monotonic `t` cursor,
//! so the two artifacts can never drift out of lockstep. Floquet expansion
//! is invoked inline, from here, the moment a `ctrl` op's overlay resolves
//! to a complete schedule.

use crate::floquet::{self, FloquetSchedule, FloquetStatus};
use crate::ir::{KernelIR, OperationIR, OperationKind};
use serde::{Deserialize, Serialize};
use squint_common::diagnostics::Diagnostic;
use squint_common::gate::Gate;
use squint_common::overlay::OverlayValue;

/// One scheduler entry, stamped with the monotonic ns cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub line: usize,
    pub t: u64,
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl TimelineEntry {
    fn new(line: usize, t: u64, op: impl Into<String>) -> Self {
        TimelineEntry { line, t, op: op.into(), ns: None, targets: None, outs: None, cycle: None, kind: None }
    }
}

/// The combined output of one emission walk.
#[derive(Debug, Clone, Default)]
pub struct EmitOutput {
    pub control_text: Vec<String>,
    pub timeline: Vec<TimelineEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the joint emitter/scheduler walk over a kernel.
pub fn run(kernel: &KernelIR) -> EmitOutput {
    let mut out = EmitOutput::default();
    let mut t: u64 = 0;

    for op in &kernel.operations {
        match op.kind {
            OperationKind::Quantum if op.op == "ctrl" => emit_ctrl(op, &mut t, &mut out),
            OperationKind::Quantum if op.op == "measure" => emit_measure(op, &t, &mut out),
            OperationKind::Semantic => emit_comment(op, &t, "semantic", &mut out),
            OperationKind::Braid => emit_comment(op, &t, "braid", &mut out),
            _ => emit_comment(op, &t, "semantic", &mut out),
        }
        if let Some(guard) = &op.guard {
            out.control_text.push(format!("# guarded_by: {guard}"));
        }
    }
    out
}

fn emit_ctrl(op: &OperationIR, t: &mut u64, out: &mut EmitOutput) {
    if let Some(OverlayValue::CoherenceLenNs(Ok(n))) = op.overlay_value("coherence_len") {
        if *n >= 0 {
            let ns = *n as u64;
            out.control_text.push(format!("wait({ns})"));
            let mut entry = TimelineEntry::new(op.line, *t, "wait");
            entry.ns = Some(ns);
            out.timeline.push(entry);
            *t += ns;
        }
    }

    let gate = Gate::parse(op.args.gate.as_deref().unwrap_or(""));
    match floquet::status(op) {
        FloquetStatus::Complete(schedule) => emit_floquet_train(op, &gate, &schedule, t, out),
        FloquetStatus::Partial(msg) => {
            out.diagnostics.push(Diagnostic::warn(op.line, msg));
            emit_single_gate(op, &gate, t, out);
        }
        FloquetStatus::None => emit_single_gate(op, &gate, t, out),
    }
}

fn emit_single_gate(op: &OperationIR, gate: &Gate, t: &u64, out: &mut EmitOutput) {
    out.control_text.push(play_line(gate, op));
    let mut entry = TimelineEntry::new(op.line, *t, gate.as_str());
    entry.targets = Some(op.args.targets.clone());
    out.timeline.push(entry);
}

fn emit_floquet_train(
    op: &OperationIR,
    gate: &Gate,
    schedule: &FloquetSchedule,
    t: &mut u64,
    out: &mut EmitOutput,
) {
    out.control_text.push(floquet_header(op, schedule));

    for cycle in 1..=schedule.cycles {
        out.control_text.push(play_line(gate, op));
        let mut gate_entry = TimelineEntry::new(op.line, *t, format!("{}@floquet", gate.as_str()));
        gate_entry.targets = Some(op.args.targets.clone());
        gate_entry.cycle = Some(cycle);
        out.timeline.push(gate_entry);

        let off = schedule.off_ns() as u64;
        out.control_text.push(format!("wait({off})"));
        let mut wait_entry = TimelineEntry::new(op.line, *t, "wait");
        wait_entry.ns = Some(off);
        wait_entry.cycle = Some(cycle);
        out.timeline.push(wait_entry);

        *t += off;
    }
}

fn play_line(gate: &Gate, op: &OperationIR) -> String {
    if !gate.is_supported() {
        return format!("# unsupported gate: {}", gate.as_str());
    }
    let targets = op.args.targets.join(", ");
    match &op.args.angle {
        Some(angle) => format!("play('{}', {}, angle={})", gate.as_str(), targets, angle),
        None => format!("play('{}', {})", gate.as_str(), targets),
    }
}

fn floquet_header(op: &OperationIR, schedule: &FloquetSchedule) -> String {
    let mut header = format!(
        "# floquet: period={}ns, cycles={}, duty={}",
        schedule.period_ns, schedule.cycles, schedule.duty
    );
    if let Some(OverlayValue::PhaseStepDeg(Ok(deg))) = op.overlay_value("phase_step") {
        header.push_str(&format!(", phase_step={deg}deg"));
    }
    header
}

fn emit_measure(op: &OperationIR, t: &u64, out: &mut EmitOutput) {
    let targets = op.args.targets.join(", ");
    let outs = op.args.outs.join(", ");
    out.control_text.push(format!("measure({targets} -> {outs})"));
    let mut entry = TimelineEntry::new(op.line, *t, "measure");
    entry.targets = Some(op.args.targets.clone());
    entry.outs = Some(op.args.outs.clone());
    out.timeline.push(entry);
}

fn emit_comment(op: &OperationIR, t: &u64, kind: &str, out: &mut EmitOutput) {
    let raw = op.args.raw.as_deref().unwrap_or("");
    out.control_text.push(format!("# {kind}: {} {raw}", op.op));
    let mut entry = TimelineEntry::new(op.line, *t, op.op.clone());
    entry.kind = Some(kind.to_string());
    out.timeline.push(entry);
}
