//! End-to-end scenarios over representative `.squint` programs: parse ->
//! validate -> emit, and parse -> simulate, exercised together since that
//! is how `squint_host` actually drives the pipeline. Parser-only shape
//! checks live in `squint_io`'s own integration tests.

use squint_core::{dump, emit, overlay as validator, simulate};
use squint_io::parse_source;

const CALIBRATED_EPR_SRC: &str = r#"
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
fn timeline_matches_expected_ns_cursor_sequence() {
    let program = parse_source(CALIBRATED_EPR_SRC).unwrap();
    validator::validate_program(&program, false).unwrap();
    let out = emit::run(&program.kernel);

    let stamps: Vec<(u64, &str)> = out.timeline.iter().map(|e| (e.t, e.op.as_str())).collect();
    assert_eq!(
        stamps,
        vec![
            (0, "wait"),
            (80, "rx"),
            (80, "wait"),
            (200, "cz"),
            (200, "measure"),
            (200, "measure"),
            (200, "return"),
        ]
    );
    // The cursor is non-decreasing end to end.
    let mut last = 0u64;
    for entry in &out.timeline {
        assert!(entry.t >= last);
        last = entry.t;
    }
}

#[test]
fn bad_overlay_strict_mode_aborts_with_distance_in_the_message() {
    let src = "workspace W { qubits q[4]; lattice L(2,2) attach q; } \
               kernel K on W { ctrl cz q[0], q[3] with overlay { path_len <= 0 }; }";
    let program = parse_source(src).unwrap();
    let err = validator::validate_program(&program, true).unwrap_err();
    assert!(err.message.contains("distance=2"), "{}", err.message);

    // Non-strict: the same program compiles, downgraded to a diagnostic.
    let diagnostics = validator::validate_program(&program, false).unwrap();
    assert!(diagnostics.iter().any(|d| d.message.contains("violated")));
}

#[test]
fn floquet_expansion_produces_eight_cycles_and_a_single_leading_wait() {
    let src = "workspace W { qubits q[2]; } kernel K on W { \
        ctrl cz q[0],q[1] with overlay { coherence_len >= 120ns, floquet_period=50ns, cycles=8, duty=0.4 }; }";
    let program = parse_source(src).unwrap();
    let out = emit::run(&program.kernel);

    assert!(out.control_text[0].starts_with("wait(120)"));
    assert!(out.control_text.iter().any(|l| l.starts_with("# floquet:")));
    assert_eq!(out.control_text.iter().filter(|l| *l == "play('cz', q[0], q[1])").count(), 8);
    assert_eq!(out.control_text.iter().filter(|l| *l == "wait(30)").count(), 8);

    let floquet_entries: Vec<_> = out.timeline.iter().filter(|e| e.op == "cz@floquet").collect();
    assert_eq!(floquet_entries.len(), 8);
    let cycles: Vec<u32> = floquet_entries.iter().filter_map(|e| e.cycle).collect();
    assert_eq!(cycles, (1..=8).collect::<Vec<_>>());

    let waits_after_lead = out.timeline.iter().filter(|e| e.op == "wait" && e.cycle.is_some()).count();
    assert_eq!(waits_after_lead, 8);
}

#[test]
fn unsupported_gate_is_commented_but_still_timelined() {
    let src = "workspace W { qubits q[2]; } kernel K on W { ctrl swap q[0], q[1]; }";
    let program = parse_source(src).unwrap();
    let out = emit::run(&program.kernel);

    assert_eq!(out.control_text[0], "# unsupported gate: swap");
    assert_eq!(out.timeline[0].op, "swap");
    assert_eq!(out.timeline[0].targets, Some(vec!["q[0]".to_string(), "q[1]".to_string()]));
}

#[test]
fn simulator_is_deterministic_across_runs_and_t_eff_matches_the_closed_form() {
    let program = parse_source(CALIBRATED_EPR_SRC).unwrap();
    let trace_a = simulate::run(&program);
    let trace_b = simulate::run(&program);
    let json_a = serde_json::to_string(&trace_a).unwrap();
    let json_b = serde_json::to_string(&trace_b).unwrap();
    assert_eq!(json_a, json_b);

    // The calibrated-EPR program never calls `initialize`/`observe`, so
    // phi_base stays at its initial value and latest_obs stays unset; the
    // closed-form check is exercised directly against its own program instead.
    let src_with_observe = r#"
        workspace W { qubits q[1]; }
        kernel K on W {
            initialize Phi = constant(0.4);
            nucleate D at {(0,0),(1,1)};
            observe T_eff into X with corrections {defects=D, field=Phi};
        }
    "#;
    let program = parse_source(src_with_observe).unwrap();
    let trace = simulate::run(&program);
    let obs = trace.latest_obs.unwrap();
    let expected = ((0.4 + 0.001 * 2.0 + 0.01 * 0.4) * 10_000.0).round() / 10_000.0;
    assert_eq!(obs.t_eff, expected);
    assert_eq!(obs.into, "X");
}

#[test]
fn damping_missing_field_warns_when_not_strict_and_errors_when_strict() {
    let src = "workspace W { qubits q[2]; } kernel K on W { \
        ctrl cx q[0],q[1] with overlay { damping = eta(Phi=NoSuch) }; }";
    let program = parse_source(src).unwrap();

    let diagnostics = validator::validate_program(&program, false).unwrap();
    assert!(diagnostics.iter().any(|d| d.message.contains("unknown semantic field")));

    let err = validator::validate_program(&program, true).unwrap_err();
    assert!(err.message.contains("NoSuch"));
}

#[test]
fn round_trip_dump_and_reparse_yields_an_equal_program() {
    let program = parse_source(CALIBRATED_EPR_SRC).unwrap();
    let dumped = dump::dump(&program);
    let reparsed = parse_source(&dumped).unwrap();
    assert_eq!(program, reparsed);
}
