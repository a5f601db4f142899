//! Entry point for the `hatchet` console binary.
//!
//! All work happens in [`hatchet_cli::run`]; the binary only hands over the
//! process arguments and the standard error stream.

use std::io::{self, StderrLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    hatchet_cli::run(std::env::args_os(), &mut stderr)
}
