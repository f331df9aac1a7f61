//! Parser-level checks over representative `.squint` programs and the
//! parser's structural invariants. These only assert IR shape and
//! `ParseError` placement; overlay classification and emission are exercised
//! in `squint_core`'s own integration tests.

use squint_io::parse_source;
use squint_core::ir::OperationKind;

const CALIBRATED_EPR: &str = r#"
    workspace Chip {
        qubits q[4];
        lattice L(2,2) attach q;
        semantic_field Phi: scalar on L;
        defect_field D: defects on L {};
    }
    kernel K on Chip {
        ctrl rx q[0] angle=π/2 with overlay { coherence_len >= 80ns };
        ctrl cz q[0], q[1] with overlay { coherence_len >= 120ns, path_len <= 2 };
        measure q[0] -> m0;
        measure q[1] -> m1;
        return { m0 ⊕ m1 };
    }
"#;

#[test]
fn calibrated_epr_parses_with_expected_shape() {
    let program = parse_source(CALIBRATED_EPR).unwrap();
    assert_eq!(program.workspace.qubits, 4);
    assert_eq!(program.workspace.lattice.unwrap().cols, 2);
    assert_eq!(program.kernel.operations.len(), 5);
    assert_eq!(program.kernel.operations[0].kind, OperationKind::Quantum);
    assert_eq!(program.kernel.operations[4].op, "return");
}

#[test]
fn bad_overlay_still_parses_its_syntax_is_valid() {
    // A path_len violation is an overlay violation, not a syntax error: the
    // parser accepts it and leaves the distance check to squint_core's
    // validator.
    let src = "workspace W { qubits q[4]; lattice L(2,2) attach q; } \
               kernel K on W { ctrl cz q[0], q[3] with overlay { path_len <= 0 }; }";
    let program = parse_source(src).unwrap();
    assert_eq!(program.kernel.operations[0].args.targets, vec!["q[0]", "q[3]"]);
}

#[test]
fn floquet_overlay_keys_parse_as_a_complete_triple() {
    let src = "workspace W { qubits q[2]; } kernel K on W { \
        ctrl cz q[0],q[1] with overlay { coherence_len >= 120ns, floquet_period=50ns, cycles=8, duty=0.4 }; }";
    let program = parse_source(src).unwrap();
    let op = &program.kernel.operations[0];
    assert_eq!(op.overlay.len(), 4);
}

#[test]
fn unknown_gate_is_not_a_parse_error() {
    let src = "workspace W { qubits q[2]; } kernel K on W { ctrl swap q[0], q[1]; }";
    let program = parse_source(src).unwrap();
    assert_eq!(program.kernel.operations[0].args.gate.as_deref(), Some("swap"));
}

#[test]
fn damping_referencing_missing_field_still_parses() {
    let src = "workspace W { qubits q[2]; } kernel K on W { \
        ctrl cx q[0],q[1] with overlay { damping = eta(Phi=NoSuch) }; }";
    let program = parse_source(src).unwrap();
    assert_eq!(program.kernel.operations[0].overlay[0].0, "damping");
}

#[test]
fn qubit_register_name_need_not_be_literally_q() {
    let src = "workspace W { qubits reg[3]; } kernel K on W { ctrl h reg[2]; }";
    let program = parse_source(src).unwrap();
    assert_eq!(program.kernel.operations[0].args.targets, vec!["reg[2]"]);
}

#[test]
fn invariant_mismatched_kernel_workspace_is_a_parse_error() {
    let src = "workspace A { qubits q[1]; } kernel K on B { ctrl h q[0]; }";
    let err = parse_source(src).unwrap_err();
    assert!(err.message.contains("undeclared workspace"));
}

#[test]
fn invariant_out_of_range_qubit_index_is_a_parse_error() {
    let src = "workspace A { qubits q[1]; } kernel K on A { ctrl h q[7]; }";
    let err = parse_source(src).unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.message.contains("out of range"));
}
