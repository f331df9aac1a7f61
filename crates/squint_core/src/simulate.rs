//! The toy field/defect simulator.
//!
//! A deterministic, closed-form state machine over a single scalar field Φ
//! and a single defect population D — never real quantum simulation, just a
//! fixed set of arithmetic transitions so the same `ProgramIR` always
//! produces byte-identical JSON. Everything this module reads out of an
//! operation's raw argument text is a minimal, single-purpose extraction (a
//! `fn(...)`-call argument, a `{...}` coordinate list, a `key=value` pair)
//! — never a general expression evaluator.

use crate::ir::{OperationIR, ProgramIR};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Serialize as DeriveSerialize;

/// An insertion-ordered string-keyed map, serialized as a JSON object in
/// that order. `measurements` must stay deterministic, so this avoids a
/// `HashMap`'s unordered iteration entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.0.push((key.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, V)> {
        self.0.iter()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A single value in a simulator event's field bag.
#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Coords(Vec<(i64, i64)>),
    FloatList(Vec<f64>),
}

/// One append-only entry in the simulator's event log.
///
/// Field sets differ per op (`init_phi` carries `value`, `observe` carries
/// the user's own `into` identifier as a key), so the payload is a small
/// ordered bag rather than one rigid struct per event kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    pub op: String,
    pub fields: OrderedMap<Value>,
}

impl SimEvent {
    fn new(op: impl Into<String>) -> Self {
        SimEvent { op: op.into(), fields: OrderedMap::new() }
    }

    fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key, value);
        self
    }
}

impl Serialize for SimEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.fields.0.len()))?;
        map.serialize_entry("op", &self.op)?;
        for (k, v) in self.fields.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
pub struct PhiState {
    pub base: f64,
}

#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
pub struct FieldsSection {
    #[serde(rename = "Phi")]
    pub phi: PhiState,
}

#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
pub struct DefectState {
    pub coords: Vec<(i64, i64)>,
    pub density: f64,
    pub phase: f64,
}

#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
pub struct DefectsSection {
    #[serde(rename = "D")]
    pub d: DefectState,
}

#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
pub struct Observation {
    #[serde(rename = "T_eff")]
    pub t_eff: f64,
    pub into: String,
    pub base: f64,
    pub defects_term: f64,
    pub field_term: f64,
}

#[derive(Debug, Clone, DeriveSerialize)]
pub struct SimulationTrace {
    pub fields: FieldsSection,
    pub defects: DefectsSection,
    pub measurements: OrderedMap<i64>,
    pub latest_obs: Option<Observation>,
    pub events: Vec<SimEvent>,
}

/// The simulator's mutable state, advanced one operation at a time.
#[derive(Debug, Default)]
struct Simulator {
    phi_base: f64,
    defect_coords: Vec<(i64, i64)>,
    defect_density: f64,
    defect_phase: f64,
    measurement_counter: i64,
    measurements: OrderedMap<i64>,
    latest_obs: Option<Observation>,
    events: Vec<SimEvent>,
}

/// Runs the simulator over a whole program, producing its trace.
///
/// Pure: the same `ProgramIR` always yields a byte-identical trace, since
/// every transition below is closed-form arithmetic over the op stream —
/// no wall-clock, no RNG, no hash-map iteration.
pub fn run(program: &ProgramIR) -> SimulationTrace {
    let mut sim = Simulator::default();
    for op in &program.kernel.operations {
        sim.step(op);
    }
    sim.into_trace()
}

impl Simulator {
    fn step(&mut self, op: &OperationIR) {
        match op.op.as_str() {
            "initialize" => self.initialize(op),
            "nucleate" => self.nucleate(op),
            "evolve" => self.evolve(op),
            "quench" => self.quench(op),
            "observe" => self.observe(op),
            "hysteresis_trace" => self.hysteresis_trace(op),
            "measure" => self.measure(op),
            "return" => self.ret(op),
            "ctrl" => {}
            other => self.passthrough(other, op),
        }
    }

    fn initialize(&mut self, op: &OperationIR) {
        let raw = raw_of(op);
        let c = extract_call_arg(raw, "constant").and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(0.0);
        self.phi_base = c;
        self.events.push(SimEvent::new("init_phi").with("value", Value::Float(c)));
    }

    fn nucleate(&mut self, op: &OperationIR) {
        let raw = raw_of(op);
        let coords = extract_coords(raw);
        self.defect_coords.extend(coords.iter().copied());
        self.defect_density = 0.01;
        self.events.push(
            SimEvent::new("nucleate")
                .with("coords", Value::Coords(coords))
                .with("density", Value::Float(self.defect_density)),
        );
    }

    fn evolve(&mut self, op: &OperationIR) {
        let _ = op;
        self.defect_density *= 1.05;
        self.defect_phase = 0.55;
        self.events.push(
            SimEvent::new("evolve")
                .with("density", Value::Float(round4(self.defect_density)))
                .with("phase", Value::Float(self.defect_phase)),
        );
    }

    fn quench(&mut self, op: &OperationIR) {
        let raw = raw_of(op);
        let amount = extract_kv_float(raw, "amount").unwrap_or(0.0);
        self.defect_density = (self.defect_density - amount).max(0.0);
        self.events.push(
            SimEvent::new("quench")
                .with("amount", Value::Float(amount))
                .with("new_density", Value::Float(round4(self.defect_density))),
        );
    }

    fn observe(&mut self, op: &OperationIR) {
        let raw = raw_of(op);
        let into = extract_keyword_ident(raw, "into").unwrap_or_else(|| "_".to_string());
        let defects_term = 0.001 * self.defect_coords.len() as f64;
        let field_term = 0.01 * self.phi_base;
        let t_eff = round4(self.phi_base + defects_term + field_term);

        self.latest_obs = Some(Observation {
            t_eff,
            into: into.clone(),
            base: self.phi_base,
            defects_term: round4(defects_term),
            field_term: round4(field_term),
        });
        self.events.push(SimEvent::new("observe").with(into, Value::Float(t_eff)));
    }

    fn hysteresis_trace(&mut self, op: &OperationIR) {
        let raw = raw_of(op);
        let window = extract_kv_float(raw, "window").unwrap_or(0.0).max(0.0) as usize;
        let trace: Vec<f64> = (0..window).map(|k| round4(0.0009 + 0.0001 * k as f64)).collect();
        self.events.push(
            SimEvent::new("hysteresis")
                .with("window", Value::Int(window as i64))
                .with("trace", Value::FloatList(trace)),
        );
    }

    fn measure(&mut self, op: &OperationIR) {
        let mut values = OrderedMap::new();
        for id in &op.args.outs {
            let value = self.measurement_counter % 2;
            self.measurement_counter += 1;
            self.measurements.insert(id.clone(), value);
            values.insert(id.clone(), value);
        }
        let mut event = SimEvent::new("measure");
        for (id, value) in values.iter() {
            event = event.with(id.clone(), Value::Int(*value));
        }
        self.events.push(event);
    }

    fn ret(&mut self, op: &OperationIR) {
        let raw = raw_of(op).to_string();
        self.events.push(SimEvent::new("return").with("spec", Value::Str(raw)));
    }

    fn passthrough(&mut self, op_name: &str, op: &OperationIR) {
        let raw = raw_of(op).to_string();
        self.events.push(SimEvent::new(op_name).with("args", Value::Str(raw)));
    }

    fn into_trace(self) -> SimulationTrace {
        SimulationTrace {
            fields: FieldsSection { phi: PhiState { base: self.phi_base } },
            defects: DefectsSection {
                d: DefectState {
                    coords: self.defect_coords,
                    density: round4(self.defect_density),
                    phase: self.defect_phase,
                },
            },
            measurements: self.measurements,
            latest_obs: self.latest_obs,
            events: self.events,
        }
    }
}

fn raw_of(op: &OperationIR) -> &str {
    op.args.raw.as_deref().unwrap_or("")
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Extracts the argument text of a `name(...)` call from raw text, e.g.
/// `extract_call_arg("Phi = constant(0.4)", "constant")` -> `Some("0.4")`.
fn extract_call_arg<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}(");
    let start = raw.find(&needle)? + needle.len();
    let end = raw[start..].find(')')? + start;
    Some(&raw[start..end])
}

/// Extracts a `key=value` float from raw text, stopping at `,`, `)`, or `}`.
fn extract_kv_float(raw: &str, key: &str) -> Option<f64> {
    let needle = format!("{key}=");
    let start = raw.find(&needle)? + needle.len();
    let rest = &raw[start..];
    let end = rest.find([',', ')', '}']).unwrap_or(rest.len());
    rest[..end].trim().parse::<f64>().ok()
}

/// Extracts the identifier following a bare keyword, e.g. `into X` -> `"X"`.
fn extract_keyword_ident(raw: &str, keyword: &str) -> Option<String> {
    let mut tokens = raw.split_whitespace();
    while let Some(tok) = tokens.next() {
        if tok == keyword {
            return tokens.next().map(|s| s.to_string());
        }
    }
    None
}

/// Parses a `{(x,y),(x,y),...}` coordinate list out of raw text.
fn extract_coords(raw: &str) -> Vec<(i64, i64)> {
    let Some(start) = raw.find('{') else { return Vec::new() };
    let Some(end) = raw.rfind('}') else { return Vec::new() };
    if end <= start {
        return Vec::new();
    }
    let body = &raw[start + 1..end];
    let mut coords = Vec::new();
    for pair in body.split(')') {
        let pair = pair.trim().trim_start_matches(',').trim();
        let Some(inner) = pair.strip_prefix('(') else { continue };
        let mut parts = inner.split(',');
        if let (Some(x), Some(y)) = (parts.next(), parts.next()) {
            if let (Ok(x), Ok(y)) = (x.trim().parse::<i64>(), y.trim().parse::<i64>()) {
                coords.push((x, y));
            }
        }
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_call_argument() {
        assert_eq!(extract_call_arg("Phi = constant(0.4)", "constant"), Some("0.4"));
    }

    #[test]
    fn extracts_coordinate_list() {
        assert_eq!(extract_coords("D at {(0,0),(1,1)}"), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn extracts_keyword_and_kv_values() {
        assert_eq!(extract_keyword_ident("T_eff into X with corrections {}", "into"), Some("X".to_string()));
        assert_eq!(extract_kv_float("inject(D, amount=0.02)", "amount"), Some(0.02));
    }

    #[test]
    fn round4_matches_spec_precision() {
        assert_eq!(round4(0.40001 + 0.001 * 2.0), 0.402);
    }
}
