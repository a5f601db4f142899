//! Namespace lookup and argument gating.

use std::sync::Arc;

use tracing::debug;

use super::{DispatchError, Dispatched};
use crate::command::Command;
use crate::shell::Shell;
use crate::show;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Walks core, module, then plugin namespaces and runs the first match.
pub(super) fn route(
    shell: &Arc<Shell>,
    name: &str,
    tokens: &[String],
) -> Result<Dispatched, DispatchError> {
    let core = shell.core_commands();
    if let Some(command) = core.get(name) {
        return invoke(shell, "core", command, tokens);
    }
    let module = shell.module_commands();
    if let Some(command) = module.as_deref().and_then(|commands| commands.get(name)) {
        return invoke(shell, "module", command, tokens);
    }
    let plugins = shell.plugins();
    if let Some(command) = plugins.find_command(name) {
        return invoke(shell, "plugin", command, tokens);
    }

    debug!(target: DISPATCH_TARGET, command = name, "no namespace matched");
    shell
        .reporter()
        .warning(&format!("Unrecognized command: {name}!"));
    Ok(Dispatched::Unrecognized)
}

fn invoke(
    shell: &Arc<Shell>,
    namespace: &'static str,
    command: &Command,
    tokens: &[String],
) -> Result<Dispatched, DispatchError> {
    if !command.details().check_arguments(tokens) {
        show::usage(shell.reporter(), command.details());
        return Ok(Dispatched::Usage);
    }
    debug!(target: DISPATCH_TARGET, command = command.name(), namespace, "invoking command");
    command
        .invoke(shell, tokens)
        .map_err(|source| DispatchError::command(command.name(), source))?;
    Ok(Dispatched::Executed)
}
