//! Shell escapes for `!` commands.

use std::io;
use std::process::Command;

/// Runs an operating-system command for the `!` prefix.
pub trait SystemRunner: Send + Sync {
    /// Runs `argv` to completion with inherited standard streams.
    ///
    /// A non-zero exit status is not an error; only failing to start is.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised when the program cannot be started.
    fn run(&self, argv: &[String]) -> io::Result<()>;
}

/// [`SystemRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl SystemRunner for ProcessRunner {
    fn run(&self, argv: &[String]) -> io::Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };
        Command::new(program).args(args).status().map(|_| ())
    }
}
