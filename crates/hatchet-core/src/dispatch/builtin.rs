//! Prefix meta-commands matched on the first character of a line.

use std::sync::Arc;

use tracing::debug;

use super::router::DISPATCH_TARGET;
use super::{DispatchError, Dispatched};
use crate::shell::Shell;
use crate::show;

/// Handles `#`, `?`, `&`, and `!`; `None` means the line is not a builtin.
pub(super) fn dispatch(
    shell: &Arc<Shell>,
    first: &str,
    tokens: &[String],
) -> Result<Option<Dispatched>, DispatchError> {
    if first.starts_with('#') {
        return Ok(Some(Dispatched::Comment));
    }
    if first.starts_with('?') {
        show::all_commands(shell);
        return Ok(Some(Dispatched::Listed));
    }
    if let Some(rest) = first.strip_prefix('&') {
        return background(shell, rest, tokens).map(Some);
    }
    if let Some(rest) = first.strip_prefix('!') {
        return Ok(Some(system(shell, rest, tokens)));
    }
    Ok(None)
}

/// Replaces the prefixed first token with its remainder, dropping it when
/// nothing is left.
fn strip_first(rest: &str, tokens: &[String]) -> Vec<String> {
    let tail = tokens.get(1..).unwrap_or_default();
    std::iter::once(rest.to_owned())
        .filter(|first| !first.is_empty())
        .chain(tail.iter().cloned())
        .collect()
}

fn background(
    shell: &Arc<Shell>,
    rest: &str,
    tokens: &[String],
) -> Result<Dispatched, DispatchError> {
    let remaining = strip_first(rest, tokens);
    let Some(name) = remaining.first().cloned() else {
        shell.reporter().usage("&<command>");
        return Ok(Dispatched::Usage);
    };
    let worker = Arc::clone(shell);
    let id = shell.jobs().create(&name, None, true, move |_| {
        if let Err(error) = worker.execute(&remaining) {
            error.report(worker.reporter());
        }
    })?;
    debug!(target: DISPATCH_TARGET, job = %id, command = %name, "dispatched in background");
    Ok(Dispatched::Background(id))
}

fn system(shell: &Arc<Shell>, rest: &str, tokens: &[String]) -> Dispatched {
    if rest.is_empty() {
        shell.reporter().usage("!<command>");
        return Dispatched::Usage;
    }
    let argv = strip_first(rest, tokens);
    shell
        .reporter()
        .process(&format!("Executing system command: {rest}"));
    match shell.system().run(&argv) {
        Ok(()) => Dispatched::System,
        Err(error) => {
            debug!(target: DISPATCH_TARGET, command = rest, %error, "system command failed");
            shell
                .reporter()
                .error(&format!("Unrecognized system command: {rest}!"));
            Dispatched::SystemFailed
        }
    }
}
