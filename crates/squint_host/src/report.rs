//! Renders the log JSON and the simulation text report from an
//! already-compiled program.

use serde::Serialize;
use squint_core::emit::{EmitOutput, TimelineEntry};
use squint_core::ir::{OpArgs, OperationIR, OperationKind, ProgramIR};
use squint_core::simulate::{OrderedMap, SimulationTrace, Value};
use squint_common::overlay::OverlayValue;
use std::fmt::Write as _;

#[derive(Serialize)]
pub struct LogDocument {
    pub workspace: LogWorkspace,
    pub kernel: String,
    pub events: Vec<LogEvent>,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Serialize)]
pub struct LogWorkspace {
    pub name: String,
    pub qubits: u32,
    pub lattice: Option<(u32, u32)>,
    pub semantic_fields: Vec<String>,
    pub defect_fields: Vec<String>,
}

#[derive(Serialize)]
pub struct LogEvent {
    pub kind: &'static str,
    pub op: String,
    pub line: usize,
    pub args: OpArgs,
    pub overlay: OrderedMap<OverlayValue>,
}

fn kind_label(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Quantum => "quantum",
        OperationKind::Semantic => "semantic",
        OperationKind::Braid => "braid",
    }
}

fn log_event(op: &OperationIR) -> LogEvent {
    let mut overlay = OrderedMap::new();
    for (key, value) in &op.overlay {
        overlay.insert(key.clone(), value.clone());
    }
    LogEvent { kind: kind_label(op.kind), op: op.op.clone(), line: op.line, args: op.args.clone(), overlay }
}

pub fn build_log_document(program: &ProgramIR, emit: &EmitOutput) -> LogDocument {
    let ws = &program.workspace;
    LogDocument {
        workspace: LogWorkspace {
            name: ws.name.clone(),
            qubits: ws.qubits,
            lattice: ws.lattice.map(|l| (l.cols, l.rows)),
            semantic_fields: ws.semantic_fields.iter().map(|f| f.name.clone()).collect(),
            defect_fields: ws.defect_fields.iter().map(|f| f.name.clone()).collect(),
        },
        kernel: program.kernel.name.clone(),
        events: program.kernel.operations.iter().map(log_event).collect(),
        timeline: emit.timeline.clone(),
    }
}

/// Renders the simulation trace as a human-readable text report, the
/// companion to `.sim.json`.
pub fn render_sim_text(trace: &SimulationTrace) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "fields.Phi.base = {}", trace.fields.phi.base);
    let _ = writeln!(
        out,
        "defects.D = coords={:?} density={} phase={}",
        trace.defects.d.coords, trace.defects.d.density, trace.defects.d.phase
    );
    let _ = writeln!(out, "measurements:");
    for (id, value) in trace.measurements.iter() {
        let _ = writeln!(out, "  {id} = {value}");
    }
    match &trace.latest_obs {
        Some(obs) => {
            let _ = writeln!(
                out,
                "latest_obs: {} <- T_eff={} (base={} + defects_term={} + field_term={})",
                obs.into, obs.t_eff, obs.base, obs.defects_term, obs.field_term
            );
        }
        None => {
            let _ = writeln!(out, "latest_obs: none");
        }
    }
    let _ = writeln!(out, "events:");
    for event in &trace.events {
        let _ = write!(out, "  {}", event.op);
        for (key, value) in event.fields.iter() {
            let _ = write!(out, " {key}={}", render_value(value));
        }
        let _ = writeln!(out);
    }
    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::Coords(c) => format!("{c:?}"),
        Value::FloatList(v) => format!("{v:?}"),
    }
}
