//! Failures that escape dispatch to the console loop.

use thiserror::Error;

use crate::command::CommandError;
use crate::jobs::JobError;
use crate::report::Reporter;

/// A dispatched line failed after a handler was found.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The command handler returned an error.
    #[error("{source}")]
    Command {
        /// Command name as typed.
        command: String,
        /// Handler failure.
        #[source]
        source: CommandError,
    },

    /// A `&` line could not be started as a job.
    #[error("{source}")]
    Background {
        /// Spawn failure.
        #[source]
        source: JobError,
    },
}

impl DispatchError {
    /// Builds a [`DispatchError::Command`].
    pub fn command(command: impl Into<String>, source: CommandError) -> Self {
        Self::Command {
            command: command.into(),
            source,
        }
    }

    /// Writes the failure for the operator; usage failures print as usage.
    pub fn report(&self, reporter: &dyn Reporter) {
        match self {
            Self::Command {
                source: CommandError::Usage { usage },
                ..
            } => reporter.usage(usage),
            _ => reporter.error(&self.to_string()),
        }
    }
}

impl From<JobError> for DispatchError {
    fn from(source: JobError) -> Self {
        Self::Background { source }
    }
}
