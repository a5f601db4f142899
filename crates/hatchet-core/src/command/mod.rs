//! Command descriptors and namespaces.
//!
//! A [`CommandNamespace`] maps command names to a [`Command`]: the
//! descriptor used for help and argument checks plus the handler closure.
//! Namespaces are immutable once built; the shell swaps whole namespaces
//! when the selection or the plugin set changes.

mod error;
mod tokenize;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::shell::Shell;

pub use self::error::CommandError;
pub use self::tokenize::tokenize;

/// Handler invoked with the full token list, command name included.
pub type CommandHandler =
    Arc<dyn Fn(&Arc<Shell>, &[String]) -> Result<(), CommandError> + Send + Sync>;

/// A sub-option accepted as the first argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubOption {
    /// Space-separated argument placeholders, e.g. `<id>`.
    pub arguments: String,
    /// One-line description.
    pub description: String,
}

impl SubOption {
    /// Number of arguments the sub-option consumes.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arguments.split_whitespace().count()
    }
}

/// Help and validation metadata for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDetails {
    /// Help grouping, e.g. `core` or `module`.
    pub category: String,
    /// Name typed at the prompt.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Usage line printed on argument errors.
    pub usage: String,
    /// Minimum number of arguments after the name.
    pub min_args: usize,
    /// Sub-options keyed by their token.
    pub options: IndexMap<String, SubOption>,
}

impl CommandDetails {
    /// Creates details with no arguments or sub-options.
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            description: description.into(),
            usage: usage.into(),
            min_args: 0,
            options: IndexMap::new(),
        }
    }

    /// Sets the minimum argument count.
    #[must_use]
    pub const fn min_args(mut self, min_args: usize) -> Self {
        self.min_args = min_args;
        self
    }

    /// Declares a sub-option.
    #[must_use]
    pub fn option(mut self, token: &str, arguments: &str, description: &str) -> Self {
        self.options.insert(
            token.to_owned(),
            SubOption {
                arguments: arguments.to_owned(),
                description: description.to_owned(),
            },
        );
        self
    }

    /// Returns `true` when `tokens` may be passed to the handler.
    ///
    /// Fails when too few arguments are given, when sub-options exist and the
    /// first argument is not one of them or lacks its arguments, and when the
    /// first argument is `?`.
    #[must_use]
    pub fn check_arguments(&self, tokens: &[String]) -> bool {
        let given = tokens.len().saturating_sub(1);
        if given < self.min_args {
            return false;
        }
        if let Some(first) = tokens.get(1) {
            if first == "?" {
                return false;
            }
            if !self.options.is_empty() {
                let Some(option) = self.options.get(first) else {
                    return false;
                };
                if given.saturating_sub(1) < option.arity() {
                    return false;
                }
            }
        }
        true
    }
}

/// A named, invocable command.
#[derive(Clone)]
pub struct Command {
    details: CommandDetails,
    handler: CommandHandler,
}

impl Command {
    /// Binds a handler to its descriptor.
    pub fn new<F>(details: CommandDetails, handler: F) -> Self
    where
        F: Fn(&Arc<Shell>, &[String]) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            details,
            handler: Arc::new(handler),
        }
    }

    /// Help and validation metadata.
    #[must_use]
    pub const fn details(&self) -> &CommandDetails {
        &self.details
    }

    /// Name typed at the prompt.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.details.name
    }

    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's [`CommandError`].
    pub fn invoke(&self, shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
        (self.handler)(shell, tokens)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}

/// Ordered mapping from command name to command.
#[derive(Debug, Clone, Default)]
pub struct CommandNamespace {
    commands: IndexMap<String, Command>,
}

impl CommandNamespace {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command, builder style; a later command replaces an earlier
    /// one of the same name.
    #[must_use]
    pub fn with(mut self, command: Command) -> Self {
        self.insert(command);
        self
    }

    /// Adds or replaces a command.
    pub fn insert(&mut self, command: Command) {
        self.commands.insert(command.name().to_owned(), command);
    }

    /// Looks up a command by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when the namespace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
