//! Recursive-descent parser over [`Lexer`] implementing the `.squint` grammar.
//!
//! The parser keeps exactly one token of lookahead (`self.lookahead`), the
//! same discipline the grammar itself assumes. That lookahead is only ever
//! advanced onto *structural* tokens — gate names, qubit references, braces,
//! the next keyword. Wherever the grammar says an opaque raw payload comes
//! next (an angle expression, an overlay value, a `return { ... }` body, a
//! whole semantic/braid statement's argument list), the parser captures that
//! payload directly off the lexer's cursor *before* advancing the lookahead
//! past it — never by lexing a token into it first. Lexing one structural
//! token ahead of a raw span is exactly the bug that would make `π/2` or
//! `m0 ⊕ m1` unreadable.
//!
//! `ParseError` is reserved for structural violations: missing `;`,
//! unbalanced braces, an undeclared workspace reference, a qubit index out of
//! range, two `ctrl` targets naming the same qubit. An unrecognised overlay
//! key or a malformed overlay value is never a parse error — both survive as
//! data for the overlay validator to judge.

use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};
use squint_common::overlay::OverlayValue;
use squint_core::ir::{
    DefectFieldDecl, FieldKind, KernelIR, OpArgs, OperationIR, OperationKind, ProgramIR,
    SemanticFieldDecl, WorkspaceIR, parse_qubit_index,
};
use squint_core::lattice::Lattice;

const SEMANTIC_OPS: &[&str] = &["initialize", "observe", "transport", "relax"];
const BRAID_OPS: &[&str] = &["nucleate", "pin", "anneal", "evolve", "quench"];

pub fn parse_source(src: &str) -> Result<ProgramIR, ParseError> {
    Parser::new(src)?.parse_program()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(src);
        let lookahead = lexer.next_token()?;
        Ok(Parser { lexer, lookahead })
    }

    fn line(&self) -> usize {
        self.lookahead.line
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line(), message)
    }

    /// Advances past the current lookahead onto the next structural token.
    /// Only safe to call when whatever follows is guaranteed to be
    /// well-formed grammar, never raw text.
    fn bump(&mut self) -> Result<(), ParseError> {
        self.lookahead = self.lexer.next_token()?;
        Ok(())
    }

    /// Re-fills the lookahead after a raw capture has moved the lexer's
    /// cursor itself. Equivalent to `bump`, named separately to mark the
    /// call sites that follow a raw capture rather than an ordinary token.
    fn resync(&mut self) -> Result<(), ParseError> {
        self.bump()
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.lookahead.kind == kind {
            self.bump()
        } else {
            Err(self.err(format!("expected {kind:?}, found {:?}", self.lookahead.kind)))
        }
    }

    fn expect_ident(&mut self, text: &str) -> Result<(), ParseError> {
        match &self.lookahead.kind {
            TokenKind::Ident(s) if s == text => self.bump(),
            other => Err(self.err(format!("expected '{text}', found {other:?}"))),
        }
    }

    fn take_ident(&mut self) -> Result<String, ParseError> {
        match self.lookahead.kind.clone() {
            TokenKind::Ident(s) => {
                self.bump()?;
                Ok(s)
            }
            other => Err(self.err(format!("expected an identifier, found {other:?}"))),
        }
    }

    fn take_int(&mut self) -> Result<i64, ParseError> {
        match self.lookahead.kind.clone() {
            TokenKind::Int(n) => {
                self.bump()?;
                Ok(n)
            }
            other => Err(self.err(format!("expected an integer, found {other:?}"))),
        }
    }

    fn peek_is_ident(&self, text: &str) -> bool {
        matches!(&self.lookahead.kind, TokenKind::Ident(s) if s == text)
    }

    /// Captures a balanced `open`/`close` payload. The current lookahead
    /// must still be the *unconsumed* `open` token — this does not advance
    /// past it first, since the lexer's cursor is already positioned right
    /// after `open`'s own character the moment that token was lexed.
    fn raw_balanced_here(&mut self, open: char, close: char) -> Result<String, ParseError> {
        let raw = self.lexer.capture_balanced(open, close)?;
        self.resync()?;
        Ok(raw)
    }

    /// Captures a raw payload up to a top-level stop char/word. The lexer's
    /// cursor must already sit at the start of that payload — i.e. the
    /// lookahead is still whatever token immediately precedes it, not yet
    /// bumped past.
    fn raw_until_here(&mut self, stop_chars: &[char], stop_words: &[&str]) -> Result<String, ParseError> {
        let raw = self.lexer.capture_until_top_level(stop_chars, stop_words)?;
        self.resync()?;
        Ok(raw)
    }

    fn parse_program(&mut self) -> Result<ProgramIR, ParseError> {
        let workspace = self.parse_workspace_block()?;
        let kernel = self.parse_kernel_block(&workspace)?;
        self.expect(TokenKind::Eof)?;
        Ok(ProgramIR { workspace, kernel })
    }

    fn parse_workspace_block(&mut self) -> Result<WorkspaceIR, ParseError> {
        let line = self.line();
        self.expect_ident("workspace")?;
        let name = self.take_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut qubits_name = None;
        let mut qubits = None;
        let mut lattice = None;
        let mut semantic_fields = Vec::new();
        let mut defect_fields = Vec::new();

        while self.lookahead.kind != TokenKind::RBrace {
            let stmt = self.take_ident()?;
            match stmt.as_str() {
                "qubits" => {
                    let ident = self.take_ident()?;
                    self.expect(TokenKind::LBracket)?;
                    let n = self.take_int()?;
                    self.expect(TokenKind::RBracket)?;
                    self.expect(TokenKind::Semicolon)?;
                    qubits_name = Some(ident);
                    qubits = Some(n as u32);
                }
                "lattice" => {
                    // lattice_stmt := "lattice" IDENT "(" INT "," INT ")" "attach" IDENT ";"
                    // The lattice's own name is purely cosmetic here — only
                    // its shape and the qubit register it attaches to matter.
                    let _lattice_name = self.take_ident()?;
                    self.expect(TokenKind::LParen)?;
                    let cols = self.take_int()?;
                    self.expect(TokenKind::Comma)?;
                    let rows = self.take_int()?;
                    self.expect(TokenKind::RParen)?;
                    self.expect_ident("attach")?;
                    self.take_ident()?;
                    self.expect(TokenKind::Semicolon)?;
                    lattice = Some(Lattice::new(cols as u32, rows as u32));
                }
                "semantic_field" => {
                    let name = self.take_ident()?;
                    self.expect(TokenKind::Colon)?;
                    let kind = self.parse_field_kind()?;
                    self.expect_ident("on")?;
                    let on = self.take_ident()?;
                    self.expect(TokenKind::Semicolon)?;
                    semantic_fields.push(SemanticFieldDecl { name, kind, on });
                }
                "defect_field" => {
                    let name = self.take_ident()?;
                    self.expect(TokenKind::Colon)?;
                    self.expect_ident("defects")?;
                    self.expect_ident("on")?;
                    let on = self.take_ident()?;
                    if self.lookahead.kind != TokenKind::LBrace {
                        return Err(self.err("expected '{' to open defect_field body"));
                    }
                    let raw = self.raw_balanced_here('{', '}')?;
                    self.expect(TokenKind::Semicolon)?;
                    defect_fields.push(DefectFieldDecl { name, on, raw });
                }
                other => return Err(self.err(format!("unknown workspace statement '{other}'"))),
            }
        }
        self.expect(TokenKind::RBrace)?;

        let qubits_name = qubits_name.ok_or_else(|| self.err("workspace is missing a 'qubits' declaration"))?;
        let qubits = qubits.ok_or_else(|| self.err("workspace is missing a 'qubits' declaration"))?;

        if let Some(l) = &lattice {
            if (l.cols as u64) * (l.rows as u64) < qubits as u64 {
                return Err(self.err("lattice capacity is smaller than the declared qubit count"));
            }
        }

        Ok(WorkspaceIR { name, qubits_name, qubits, lattice, semantic_fields, defect_fields, line })
    }

    fn parse_field_kind(&mut self) -> Result<FieldKind, ParseError> {
        let kind = self.take_ident()?;
        match kind.as_str() {
            "scalar" => Ok(FieldKind::Scalar),
            "vector" => Ok(FieldKind::Vector),
            "tensor" => {
                self.expect(TokenKind::LBracket)?;
                let k = self.take_int()?;
                self.expect(TokenKind::RBracket)?;
                Ok(FieldKind::Tensor(k as u32))
            }
            other => Err(self.err(format!("unknown field kind '{other}'"))),
        }
    }

    fn parse_kernel_block(&mut self, workspace: &WorkspaceIR) -> Result<KernelIR, ParseError> {
        let line = self.line();
        self.expect_ident("kernel")?;
        let name = self.take_ident()?;

        let params_raw = if self.lookahead.kind == TokenKind::LParen {
            Some(self.raw_balanced_here('(', ')')?)
        } else {
            None
        };

        self.expect_ident("on")?;
        let workspace_name = self.take_ident()?;
        if workspace_name != workspace.name {
            return Err(self.err(format!("kernel references undeclared workspace '{workspace_name}'")));
        }

        self.expect(TokenKind::LBrace)?;
        let mut operations = Vec::new();
        while self.lookahead.kind != TokenKind::RBrace {
            operations.push(self.parse_kernel_stmt(workspace)?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(KernelIR { name, workspace_name, params_raw, operations, line })
    }

    fn parse_kernel_stmt(&mut self, workspace: &WorkspaceIR) -> Result<OperationIR, ParseError> {
        let line = self.line();
        let op = match &self.lookahead.kind {
            TokenKind::Ident(s) => s.clone(),
            other => return Err(self.err(format!("expected a kernel statement, found {other:?}"))),
        };

        match op.as_str() {
            "ctrl" => {
                self.bump()?;
                self.parse_ctrl_stmt(workspace, line)
            }
            "measure" => {
                self.bump()?;
                self.parse_measure_stmt(workspace, line)
            }
            "return" => {
                self.bump()?;
                self.parse_return_stmt(line)
            }
            "hysteresis_trace" => {
                self.bump()?;
                self.parse_hyst_stmt(line)
            }
            _ if SEMANTIC_OPS.contains(&op.as_str()) => self.parse_generic_stmt(op, OperationKind::Semantic, line),
            _ if BRAID_OPS.contains(&op.as_str()) => self.parse_generic_stmt(op, OperationKind::Braid, line),
            other => Err(self.err(format!("unknown kernel statement '{other}'"))),
        }
    }

    /// `op RAW;` — the lookahead is still the (unconsumed) op keyword, so the
    /// lexer's cursor already sits right at the start of `RAW`.
    fn parse_generic_stmt(&mut self, op: String, kind: OperationKind, line: usize) -> Result<OperationIR, ParseError> {
        let raw = self.raw_until_here(&[';'], &[])?;
        self.expect(TokenKind::Semicolon)?;
        Ok(OperationIR {
            kind,
            op,
            args: OpArgs { raw: Some(raw), ..Default::default() },
            overlay: Vec::new(),
            guard: None,
            line,
        })
    }

    fn parse_ctrl_stmt(&mut self, workspace: &WorkspaceIR, line: usize) -> Result<OperationIR, ParseError> {
        let gate = self.take_ident()?;
        let targets = self.parse_qtargets(workspace)?;

        let angle = if self.peek_is_ident("angle") {
            self.bump()?;
            if self.lookahead.kind != TokenKind::Eq {
                return Err(self.err("expected '=' after angle"));
            }
            Some(self.raw_until_here(&[';'], &["with", "unless"])?)
        } else {
            None
        };

        let overlay = if self.peek_is_ident("with") {
            self.bump()?;
            self.expect_ident("overlay")?;
            self.parse_overlay_clause()?
        } else {
            Vec::new()
        };

        let guard = self.parse_optional_guard()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(OperationIR {
            kind: OperationKind::Quantum,
            op: "ctrl".to_string(),
            args: OpArgs { gate: Some(gate), targets, angle, ..Default::default() },
            overlay,
            guard,
            line,
        })
    }

    fn parse_overlay_clause(&mut self) -> Result<Vec<(String, OverlayValue)>, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while self.lookahead.kind != TokenKind::RBrace {
            let key = self.take_ident()?;
            let raw = match &self.lookahead.kind {
                TokenKind::Ge | TokenKind::Le | TokenKind::Eq | TokenKind::EqEq => {
                    self.raw_until_here(&[',', '}'], &[])?
                }
                _ => String::new(),
            };
            entries.push((key.clone(), OverlayValue::from_raw(&key, &raw)));
            if self.lookahead.kind == TokenKind::Comma {
                self.bump()?;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(entries)
    }

    /// `unless EXPR` — the lookahead is still the (unconsumed) `unless`
    /// keyword when present, so the raw capture starts right after it.
    fn parse_optional_guard(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek_is_ident("unless") {
            Ok(Some(self.raw_until_here(&[';'], &[])?))
        } else {
            Ok(None)
        }
    }

    fn parse_measure_stmt(&mut self, workspace: &WorkspaceIR, line: usize) -> Result<OperationIR, ParseError> {
        let targets = self.parse_qtargets(workspace)?;
        self.expect(TokenKind::Arrow)?;
        let mut outs = vec![self.take_ident()?];
        while self.lookahead.kind == TokenKind::Comma {
            self.bump()?;
            outs.push(self.take_ident()?);
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(OperationIR {
            kind: OperationKind::Quantum,
            op: "measure".to_string(),
            args: OpArgs { targets, outs, ..Default::default() },
            overlay: Vec::new(),
            guard: None,
            line,
        })
    }

    fn parse_return_stmt(&mut self, line: usize) -> Result<OperationIR, ParseError> {
        if self.lookahead.kind != TokenKind::LBrace {
            return Err(self.err("expected '{' after return"));
        }
        let raw = self.raw_balanced_here('{', '}')?;
        self.expect(TokenKind::Semicolon)?;
        Ok(OperationIR {
            kind: OperationKind::Semantic,
            op: "return".to_string(),
            args: OpArgs { raw: Some(raw), ..Default::default() },
            overlay: Vec::new(),
            guard: None,
            line,
        })
    }

    fn parse_hyst_stmt(&mut self, line: usize) -> Result<OperationIR, ParseError> {
        if self.lookahead.kind != TokenKind::LParen {
            return Err(self.err("expected '(' after hysteresis_trace"));
        }
        let raw = self.raw_balanced_here('(', ')')?;
        self.expect(TokenKind::Semicolon)?;
        Ok(OperationIR {
            kind: OperationKind::Braid,
            op: "hysteresis_trace".to_string(),
            args: OpArgs { raw: Some(raw), ..Default::default() },
            overlay: Vec::new(),
            guard: None,
            line,
        })
    }

    fn parse_qtargets(&mut self, workspace: &WorkspaceIR) -> Result<Vec<String>, ParseError> {
        let mut targets = vec![self.parse_qref(workspace)?];
        while self.lookahead.kind == TokenKind::Comma {
            self.bump()?;
            targets.push(self.parse_qref(workspace)?);
        }
        if targets.len() >= 2 {
            let mut seen = std::collections::HashSet::new();
            for t in &targets {
                if !seen.insert(t.clone()) {
                    return Err(self.err(format!("duplicate qubit target '{t}' in the same ctrl statement")));
                }
            }
        }
        Ok(targets)
    }

    fn parse_qref(&mut self, workspace: &WorkspaceIR) -> Result<String, ParseError> {
        let line = self.line();
        let ident = self.take_ident()?;
        if ident != workspace.qubits_name {
            return Err(ParseError::new(line, format!("reference to undeclared qubit register '{ident}'")));
        }
        self.expect(TokenKind::LBracket)?;
        let index = self.take_int()?;
        self.expect(TokenKind::RBracket)?;

        let reference = format!("{ident}[{index}]");
        match parse_qubit_index(&reference) {
            Some(i) if i < workspace.qubits => Ok(reference),
            _ => Err(ParseError::new(line, format!("qubit index {index} is out of range for '{ident}[{}]'", workspace.qubits))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPR_SOURCE: &str = r#"
        workspace CalibratedEPR {
            qubits q[2];
            lattice L(2, 1) attach q;
        }

        kernel main on CalibratedEPR {
            ctrl h q[0];
            ctrl rx q[0] angle=π/2 with overlay { coherence_len >= 80ns };
            ctrl cx q[0], q[1] with overlay { damping = η(Φ=Gamma) };
            measure q[0], q[1] -> m0, m1;
            return { m0 ⊕ m1 };
        }
    "#;

    #[test]
    fn parses_calibrated_epr_scenario() {
        let program = parse_source(EPR_SOURCE).unwrap();
        assert_eq!(program.workspace.name, "CalibratedEPR");
        assert_eq!(program.workspace.qubits, 2);
        assert_eq!(program.kernel.operations.len(), 5);

        let rx = &program.kernel.operations[1];
        assert_eq!(rx.args.angle.as_deref(), Some("π/2"));
        assert_eq!(rx.overlay_value("coherence_len"), Some(&OverlayValue::CoherenceLenNs(Ok(80))));

        let cx = &program.kernel.operations[2];
        assert_eq!(cx.overlay_value("damping"), Some(&OverlayValue::Damping(Ok("Gamma".to_string()))));

        let ret = program.kernel.operations.last().unwrap();
        assert_eq!(ret.op, "return");
        assert_eq!(ret.args.raw.as_deref(), Some("m0 ⊕ m1"));
    }

    #[test]
    fn rejects_out_of_range_qubit_index() {
        let src = "workspace W { qubits q[2]; } kernel k on W { ctrl h q[5]; }";
        let err = parse_source(src).unwrap_err();
        assert!(err.message.contains("out of range"), "{}", err.message);
    }

    #[test]
    fn rejects_undeclared_workspace_reference() {
        let src = "workspace W { qubits q[1]; } kernel k on Other { ctrl h q[0]; }";
        let err = parse_source(src).unwrap_err();
        assert!(err.message.contains("undeclared workspace"), "{}", err.message);
    }

    #[test]
    fn rejects_repeated_two_target_qubits() {
        let src = "workspace W { qubits q[2]; } kernel k on W { ctrl cx q[0], q[0]; }";
        let err = parse_source(src).unwrap_err();
        assert!(err.message.contains("duplicate qubit target"), "{}", err.message);
    }

    #[test]
    fn rejects_missing_semicolon() {
        let src = "workspace W { qubits q[1]; } kernel k on W { ctrl h q[0] }";
        assert!(parse_source(src).is_err());
    }

    #[test]
    fn parses_floquet_overlay_keys() {
        let src = "workspace W { qubits q[1]; } kernel k on W { \
            ctrl rx q[0] with overlay { floquet_period=20ns, cycles=8, duty=0.4 }; }";
        let program = parse_source(src).unwrap();
        let op = &program.kernel.operations[0];
        assert_eq!(op.overlay_value("cycles"), Some(&OverlayValue::Cycles(Ok(8))));
        assert_eq!(op.overlay_value("duty"), Some(&OverlayValue::Duty(Ok(0.4))));
    }

    #[test]
    fn parses_guard_clause() {
        let src = "workspace W { qubits q[1]; } kernel k on W { ctrl h q[0] unless m0 == 1; }";
        let program = parse_source(src).unwrap();
        assert_eq!(program.kernel.operations[0].guard.as_deref(), Some("m0 == 1"));
    }

    #[test]
    fn parses_empty_defect_field_body() {
        let src = "workspace W { qubits q[1]; defect_field D: defects on L {}; } kernel k on W { return { 0 }; }";
        let program = parse_source(src).unwrap();
        assert_eq!(program.workspace.defect_fields[0].raw, "");
    }
}
