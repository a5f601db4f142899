//! Errors returned by command handlers.

use thiserror::Error;

use crate::entity::ModuleFailure;
use crate::jobs::JobError;
use crate::option::OptionError;
use crate::plugin::PluginError;
use crate::sessions::SessionError;

/// Failures a command handler hands back to the console loop.
///
/// Messages are operator-facing and already punctuated.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An option could not be set, unset, or found.
    #[error(transparent)]
    Option(#[from] OptionError),

    /// Arguments were syntactically valid but unusable.
    #[error("Usage: {usage}")]
    Usage {
        /// Usage line to print.
        usage: String,
    },

    /// `run` found a required option without a value.
    #[error("Missing option: {name}!")]
    MissingOption {
        /// Name of the empty option.
        name: String,
    },

    /// The command needs a selected module.
    #[error("No module selected.")]
    NoModuleSelected,

    /// No module with that name exists.
    #[error("Invalid module: {name}!")]
    UnknownModule {
        /// Name as typed.
        name: String,
    },

    /// No plugin with that name exists.
    #[error("Invalid plugin: {name}!")]
    UnknownPlugin {
        /// Name as typed.
        name: String,
    },

    /// A job or session id was not a number.
    #[error("Invalid {kind} given: {raw}!")]
    InvalidId {
        /// `job` or `session`.
        kind: &'static str,
        /// Id as typed.
        raw: String,
    },

    /// Loading or unloading a plugin failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// A job could not be started or stopped.
    #[error(transparent)]
    Job(#[from] JobError),

    /// A session could not be closed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The module's action failed.
    #[error("An error occurred: {0}!")]
    Module(#[from] ModuleFailure),

    /// Any other failure inside a handler.
    #[error("An error occurred: {message}!")]
    Failed {
        /// Human-readable failure description.
        message: String,
    },
}

impl CommandError {
    /// Builds a [`CommandError::Usage`].
    pub fn usage(usage: impl Into<String>) -> Self {
        Self::Usage {
            usage: usage.into(),
        }
    }

    /// Builds a [`CommandError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
