//! Line dispatch for the console.
//!
//! A tokenized line is resolved in a fixed order and the first match wins:
//!
//! 1. builtin prefixes on the first token: `#` (comment), `?` (list every
//!    visible command), `&` (run the rest as a hidden background job), and
//!    `!` (hand the rest to the system runner);
//! 2. the core namespace;
//! 3. the current module's namespace;
//! 4. loaded plugins, in registration order and then group order.
//!
//! Misses, usage requests, and failed system commands are reported here and
//! come back as a [`Dispatched`] outcome. Only handler failures escape as a
//! [`DispatchError`], for the console loop to report.

mod builtin;
mod errors;
mod router;

use std::sync::Arc;

use crate::ids::JobId;
use crate::shell::Shell;

pub use self::errors::DispatchError;

/// What happened to a dispatched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The line had no tokens.
    Empty,
    /// The line was a `#` comment.
    Comment,
    /// `?` listed the visible commands.
    Listed,
    /// `&` started a hidden job.
    Background(JobId),
    /// `!` ran a system command.
    System,
    /// `!` could not start the system command.
    SystemFailed,
    /// Arguments were rejected and usage was printed.
    Usage,
    /// A command handler ran to completion.
    Executed,
    /// No namespace knows the command.
    Unrecognized,
}

pub(crate) fn execute(shell: &Arc<Shell>, tokens: &[String]) -> Result<Dispatched, DispatchError> {
    let Some(first) = tokens.first() else {
        return Ok(Dispatched::Empty);
    };
    if let Some(outcome) = builtin::dispatch(shell, first, tokens)? {
        return Ok(outcome);
    }
    router::route(shell, first, tokens)
}
