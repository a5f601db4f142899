//! The built-in core command set.
//!
//! [`core_namespace`] is what a [`crate::shell::Shell`] starts with unless a
//! builder supplies its own. Handlers report through the shell's reporter
//! and return [`crate::command::CommandError`] for anything the console loop
//! should print as a failure.

mod catalog;
mod interface;
mod manage;
mod module;

use crate::command::CommandNamespace;

/// Tracing target for command handlers.
const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Builds the core namespace: interface, module, job/session, and catalog
/// commands, in that listing order.
#[must_use]
pub fn core_namespace() -> CommandNamespace {
    let commands = interface::commands()
        .into_iter()
        .chain(module::commands())
        .chain(manage::commands())
        .chain(catalog::commands());
    commands.fold(CommandNamespace::new(), CommandNamespace::with)
}
