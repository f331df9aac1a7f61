//! Intermediate representation built by `squint_io`'s parser.
//!
//! `WorkspaceIR` is frozen once parsed and borrowed by every later stage.
//! `OperationIR` is a small tagged record rather than a fully generic AST
//! node: the handful of fields here are exactly what the grammar's
//! productions populate, and anything the compiler does not interpret
//! (angle expressions, `return { ... }` bodies, defect-statement bodies)
//! stays opaque text in `raw_args` rather than a parsed expression tree.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use squint_common::overlay::OverlayValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Scalar,
    Vector,
    Tensor(u32),
}

/// A declared semantic field: `semantic_field IDENT : KIND on IDENT;`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticFieldDecl {
    pub name: String,
    pub kind: FieldKind,
    pub on: String,
}

/// A declared defect field: `defect_field IDENT : defects on IDENT { RAW };`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectFieldDecl {
    pub name: String,
    pub on: String,
    pub raw: String,
}

/// The frozen, immutable-after-parse workspace declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceIR {
    pub name: String,
    /// The identifier the qubit register was declared under (`qubits IDENT[n];`).
    pub qubits_name: String,
    pub qubits: u32,
    pub lattice: Option<Lattice>,
    /// Declaration order, not a map — iteration order must be deterministic.
    pub semantic_fields: Vec<SemanticFieldDecl>,
    pub defect_fields: Vec<DefectFieldDecl>,
    pub line: usize,
}

impl WorkspaceIR {
    pub fn has_semantic_field(&self, name: &str) -> bool {
        self.semantic_fields.iter().any(|f| f.name == name)
    }

    pub fn has_defect_field(&self, name: &str) -> bool {
        self.defect_fields.iter().any(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Quantum,
    Semantic,
    Braid,
}

/// Operation-specific arguments. Only the fields a given `op` actually
/// produces are populated; the rest stay at their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpArgs {
    /// Gate name text for `ctrl` (e.g. `"rx"`, `"swap"`), unparsed.
    pub gate: Option<String>,
    /// Qubit references in source form (`"q[0]"`), for `ctrl`/`measure`.
    pub targets: Vec<String>,
    /// Raw angle expression text for `ctrl ... angle=...` — never evaluated.
    pub angle: Option<String>,
    /// Output identifiers for `measure ... -> id1, id2`.
    pub outs: Vec<String>,
    /// Verbatim argument text for every op the compiler does not interpret
    /// structurally (semantic/braid ops, `return { ... }`).
    pub raw: Option<String>,
}

/// A single kernel statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationIR {
    pub kind: OperationKind,
    pub op: String,
    pub args: OpArgs,
    /// Recognised-key -> normalised-value overlay entries, in source order.
    pub overlay: Vec<(String, OverlayValue)>,
    /// Raw `unless <expr>` guard text, if present.
    pub guard: Option<String>,
    pub line: usize,
}

impl OperationIR {
    pub fn overlay_value(&self, key: &str) -> Option<&OverlayValue> {
        self.overlay.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// An ordered sequence of operations over a single named workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelIR {
    pub name: String,
    pub workspace_name: String,
    /// Raw `kernel NAME(RAW) on ...` parameter text, if present.
    pub params_raw: Option<String>,
    pub operations: Vec<OperationIR>,
    pub line: usize,
}

/// The whole compiled program: one workspace, one kernel referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramIR {
    pub workspace: WorkspaceIR,
    pub kernel: KernelIR,
}

/// Parses a source-form qubit reference like `"q[3]"` or `"reg[12]"` into
/// its index. The register identifier itself is not fixed to `q` — the
/// grammar lets a workspace name its qubit register anything, so this
/// looks for the trailing `[...]` rather than assuming a literal `q[`
/// prefix.
pub fn parse_qubit_index(reference: &str) -> Option<u32> {
    let open = reference.find('[')?;
    let inner = reference[open + 1..].strip_suffix(']')?;
    inner.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_qubit_reference_index() {
        assert_eq!(parse_qubit_index("q[0]"), Some(0));
        assert_eq!(parse_qubit_index("q[12]"), Some(12));
        assert_eq!(parse_qubit_index("reg[3]"), Some(3));
        assert_eq!(parse_qubit_index("bogus"), None);
    }
}
