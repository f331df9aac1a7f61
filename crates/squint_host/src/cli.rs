//! Command-line surface:
//! `squint [FILE.squint] [--out PATH] [--log] [--simulate] [--strict-overlays]`

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "squint", about = "Compiles a .squint program into control text, a timeline log, and a simulation trace")]
pub struct Cli {
    /// Source file to compile.
    #[arg(default_value = "CalibratedEPR.squint")]
    pub file: PathBuf,

    /// Control-text output path (default: `<FILE>.qua.txt`).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Write `<FILE>.log.json` alongside the control text.
    #[arg(long)]
    pub log: bool,

    /// Run the toy simulator and write `<FILE>.sim.json` / `<FILE>.sim.txt`.
    #[arg(long)]
    pub simulate: bool,

    /// Promote overlay violations and malformed overlay values to hard errors.
    #[arg(long)]
    pub strict_overlays: bool,

    /// Increase log verbosity (can be repeated: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
