//! The squint compiler core: IR, overlay validation, Floquet expansion, the
//! joint control-text/timeline emitter, and the toy field/defect simulator.
//!
//! Everything in this crate is pure — no filesystem access and no CLI
//! awareness. `squint_io` builds the `ProgramIR` this crate consumes;
//! `squint_host` drives the pipeline and writes the artifacts to disk.

pub mod dump;
pub mod emit;
pub mod error;
pub mod floquet;
pub mod ir;
pub mod lattice;
pub mod overlay;
pub mod simulate;
