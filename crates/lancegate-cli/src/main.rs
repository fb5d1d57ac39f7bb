//! # lancegate CLI
//!
//! Command-line interface for the lancegate vector store gateway.
//!
//! This binary provides human-friendly and scriptable access to
//! `lancegate-core`. Run `lancegate --help` for usage information.

mod cli;
mod session;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
