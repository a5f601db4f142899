//! The read-dispatch-reap loop.
//!
//! Each cycle tokenizes one line, reaps jobs and sessions and re-synthesizes
//! handler options, dispatches, and then reaps and synthesizes again, so a
//! command's option changes are visible in the handler maps before the next
//! prompt. Failures escaping a command are reported and the loop continues;
//! only an exit request or the end of input stops it.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::command::tokenize;
use crate::report::SharedWriter;
use crate::shell::Shell;

const CONSOLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::console");

/// Result of asking for one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    /// A line, without its terminator.
    Line(String),
    /// The wait was interrupted; the pending input is discarded.
    Interrupted,
    /// No more input.
    Eof,
}

/// Supplies lines to the console and answers to confirmations.
pub trait LineSource: Send {
    /// Shows `prompt` and waits for a line.
    fn read_line(&mut self, prompt: &str) -> ReadLine;
}

/// [`LineSource`] over a buffered reader, echoing prompts to a writer.
#[derive(Debug)]
pub struct StdinSource<R, W> {
    input: R,
    out: SharedWriter<W>,
}

impl<R, W> StdinSource<R, W> {
    /// Reads from `input` and writes prompts through `out`.
    pub const fn new(input: R, out: SharedWriter<W>) -> Self {
        Self { input, out }
    }
}

impl<R: BufRead + Send, W: Write + Send> LineSource for StdinSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> ReadLine {
        let shown = self.out.with(|writer| {
            writer.write_all(prompt.as_bytes())?;
            writer.flush()
        });
        if let Err(error) = shown {
            warn!(target: CONSOLE_TARGET, %error, "failed to write prompt");
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => ReadLine::Eof,
            Ok(_) => ReadLine::Line(line.trim_end_matches(['\r', '\n']).to_owned()),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => ReadLine::Interrupted,
            Err(error) => {
                warn!(target: CONSOLE_TARGET, %error, "failed to read input");
                ReadLine::Eof
            }
        }
    }
}

/// [`LineSource`] replaying a fixed sequence.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pending: VecDeque<ReadLine>,
}

impl ScriptedSource {
    /// Replays `lines` in order, then reports end of input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: lines
                .into_iter()
                .map(|line| ReadLine::Line(line.into()))
                .collect(),
        }
    }

    /// Queues an interrupt after the lines given so far.
    #[must_use]
    pub fn interrupt(mut self) -> Self {
        self.pending.push_back(ReadLine::Interrupted);
        self
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, _prompt: &str) -> ReadLine {
        self.pending.pop_front().unwrap_or(ReadLine::Eof)
    }
}

/// Console failures outside command dispatch.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// A script file could not be read.
    #[error("failed to read script {path}: {source}")]
    ReadScript {
        /// Script path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Drives a [`Shell`] from its line source.
#[derive(Debug, Clone)]
pub struct Console {
    shell: Arc<Shell>,
}

impl Console {
    /// Wraps a shell.
    #[must_use]
    pub const fn new(shell: Arc<Shell>) -> Self {
        Self { shell }
    }

    /// The driven shell.
    #[must_use]
    pub const fn shell(&self) -> &Arc<Shell> {
        &self.shell
    }

    /// Prompts and dispatches until exit is requested or input ends.
    pub fn run(&self) {
        while !self.shell.exit_requested() {
            match self.shell.read_line(&self.shell.prompt()) {
                ReadLine::Line(line) => self.cycle(&line),
                ReadLine::Interrupted => {
                    debug!(target: CONSOLE_TARGET, "input interrupted");
                }
                ReadLine::Eof => break,
            }
        }
    }

    /// Runs one line through the cycle.
    pub fn cycle(&self, line: &str) {
        let tokens = tokenize(line);
        self.shell.update_events();
        match panic::catch_unwind(AssertUnwindSafe(|| self.shell.execute(&tokens))) {
            Ok(Ok(outcome)) => {
                debug!(target: CONSOLE_TARGET, ?outcome, "line dispatched");
            }
            Ok(Err(error)) => {
                debug!(target: CONSOLE_TARGET, %error, "command failed");
                error.report(self.shell.reporter());
            }
            Err(_) => {
                warn!(target: CONSOLE_TARGET, line, "command panicked");
                self.shell
                    .reporter()
                    .error("An error occurred: command panicked!");
            }
        }
        self.shell.update_events();
    }

    /// Runs every non-blank line of each script in order.
    ///
    /// Stops early once a line requests exit.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::ReadScript`] when a file cannot be read; lines
    /// from earlier files have already run.
    pub fn script<P: AsRef<Utf8Path>>(&self, paths: &[P]) -> Result<(), ConsoleError> {
        for script in paths {
            let path = script.as_ref();
            let text = fs::read_to_string(path).map_err(|source| ConsoleError::ReadScript {
                path: path.to_owned(),
                source,
            })?;
            debug!(target: CONSOLE_TARGET, script = %path, "running script");
            for line in text.lines().filter(|line| !line.trim().is_empty()) {
                if self.shell.exit_requested() {
                    return Ok(());
                }
                self.cycle(line);
            }
        }
        Ok(())
    }
}
