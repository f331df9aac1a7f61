mod cli;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use pipeline::CompileError;
use squint_core::error::OverlayError;
use squint_io::ParseError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::from(0),
        Err(Failure::Io(e)) => {
            eprintln!("error: {e:#}");
            ExitCode::from(3)
        }
        Err(Failure::Parse(e)) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
        Err(Failure::Overlay(e)) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

enum Failure {
    Io(anyhow::Error),
    Parse(ParseError),
    Overlay(OverlayError),
}

impl From<anyhow::Error> for Failure {
    fn from(e: anyhow::Error) -> Self {
        Failure::Io(e)
    }
}

impl From<CompileError> for Failure {
    fn from(e: CompileError) -> Self {
        match e {
            CompileError::Parse(p) => Failure::Parse(p),
            CompileError::Overlay(o) => Failure::Overlay(o),
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    info!(file = %cli.file.display(), "compiling");
    let src = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let compiled = pipeline::compile(&src, cli.strict_overlays)?;
    debug!(operations = compiled.program.kernel.operations.len(), "parsed and validated");

    for d in &compiled.diagnostics {
        eprintln!("{d}");
    }

    let out_path = cli.out.clone().unwrap_or_else(|| sibling(&cli.file, "qua.txt"));
    let control_text = compiled.emit.control_text.join("\n") + "\n";
    std::fs::write(&out_path, control_text)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    info!(path = %out_path.display(), "wrote control text");

    if cli.log {
        let log_path = sibling(&cli.file, "log.json");
        let doc = report::build_log_document(&compiled.program, &compiled.emit);
        let text = serde_json::to_string_pretty(&doc).context("failed to serialize log JSON")?;
        std::fs::write(&log_path, text).with_context(|| format!("failed to write {}", log_path.display()))?;
        info!(path = %log_path.display(), "wrote timeline log");
    }

    if cli.simulate {
        let trace = pipeline::simulate(&compiled.program);

        let sim_json_path = sibling(&cli.file, "sim.json");
        let json = serde_json::to_string_pretty(&trace).context("failed to serialize simulation JSON")?;
        std::fs::write(&sim_json_path, json)
            .with_context(|| format!("failed to write {}", sim_json_path.display()))?;

        let sim_text_path = sibling(&cli.file, "sim.txt");
        std::fs::write(&sim_text_path, report::render_sim_text(&trace))
            .with_context(|| format!("failed to write {}", sim_text_path.display()))?;
        info!(json = %sim_json_path.display(), text = %sim_text_path.display(), "wrote simulation trace");
    }

    Ok(())
}

/// `<FILE>.EXT`, where `<FILE>` drops its own extension first — so
/// `CalibratedEPR.squint` with `ext = "qua.txt"` becomes `CalibratedEPR.qua.txt`.
fn sibling(file: &Path, ext: &str) -> PathBuf {
    let stem = file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    file.with_file_name(format!("{stem}.{ext}"))
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
