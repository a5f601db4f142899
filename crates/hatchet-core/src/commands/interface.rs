//! `help` and `exit`.

use std::sync::Arc;

use tracing::info;

use super::COMMANDS_TARGET;
use crate::command::{Command, CommandDetails, CommandError};
use crate::shell::Shell;
use crate::show;

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new(
            CommandDetails::new("core", "help", "Show available commands.", "help"),
            help,
        ),
        Command::new(
            CommandDetails::new("core", "exit", "Exit the console.", "exit"),
            exit,
        ),
    ]
}

fn help(shell: &Arc<Shell>, _tokens: &[String]) -> Result<(), CommandError> {
    show::all_commands(shell);
    Ok(())
}

fn exit(shell: &Arc<Shell>, _tokens: &[String]) -> Result<(), CommandError> {
    let reporter = shell.reporter();
    let mut busy = false;
    if shell.jobs().has_visible() {
        reporter.warning("You have some running jobs.");
        busy = true;
    }
    if shell.sessions().has_open() {
        reporter.warning("You have some opened sessions.");
        busy = true;
    }
    if busy && !shell.confirm("Exit anyway? [y/N] ") {
        return Ok(());
    }
    shell.jobs().stop_all();
    shell.sessions().close_all();
    info!(target: COMMANDS_TARGET, "exit requested");
    shell.request_exit();
    Ok(())
}
