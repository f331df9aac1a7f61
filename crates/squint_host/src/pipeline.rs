//! Parse → validate → emit → (optional) simulate, as one pipeline: the
//! first `ParseError` or strict-mode `OverlayError` aborts before any
//! artifact is produced.

use squint_core::emit::{self, EmitOutput};
use squint_core::error::OverlayError;
use squint_core::ir::ProgramIR;
use squint_core::overlay as validator;
use squint_core::simulate::{self, SimulationTrace};
use squint_common::diagnostics::Diagnostic;
use squint_io::ParseError;

/// Either fatal error kind the core can raise — the outer shell maps
/// these to exit codes 1 and 2 respectively.
#[derive(Debug, Clone)]
pub enum CompileError {
    Parse(ParseError),
    Overlay(OverlayError),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "{e}"),
            CompileError::Overlay(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

impl From<OverlayError> for CompileError {
    fn from(e: OverlayError) -> Self {
        CompileError::Overlay(e)
    }
}

/// The full result of a successful compile: IR plus every artifact the CLI
/// might need to write out.
pub struct Compiled {
    pub program: ProgramIR,
    pub diagnostics: Vec<Diagnostic>,
    pub emit: EmitOutput,
}

pub fn compile(src: &str, strict_overlays: bool) -> Result<Compiled, CompileError> {
    let program = squint_io::parse_source(src)?;
    let mut diagnostics = validator::validate_program(&program, strict_overlays)?;
    let mut emit = emit::run(&program.kernel);
    diagnostics.append(&mut emit.diagnostics);
    Ok(Compiled { program, diagnostics, emit })
}

pub fn simulate(program: &ProgramIR) -> SimulationTrace {
    simulate::run(program)
}
