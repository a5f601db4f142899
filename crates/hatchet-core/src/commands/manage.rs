//! `jobs` and `sessions`.

use std::str::FromStr;
use std::sync::Arc;

use crate::command::{Command, CommandDetails, CommandError};
use crate::ids::{JobId, SessionId};
use crate::shell::Shell;
use crate::show;

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new(
            CommandDetails::new(
                "manage",
                "jobs",
                "Manage background jobs.",
                "jobs <option> [arguments]",
            )
            .min_args(1)
            .option("-l", "", "List all active jobs.")
            .option("-k", "<id>", "Kill specified job."),
            jobs,
        ),
        Command::new(
            CommandDetails::new(
                "manage",
                "sessions",
                "Manage opened sessions.",
                "sessions <option> [arguments]",
            )
            .min_args(1)
            .option("-l", "", "List all opened sessions.")
            .option("-c", "<id>", "Close specified session.")
            .option("-C", "", "Close all sessions."),
            sessions,
        ),
    ]
}

fn parse_id<T: FromStr>(tokens: &[String], kind: &'static str) -> Result<T, CommandError> {
    let raw = tokens.get(2).map(String::as_str).unwrap_or_default();
    raw.parse().map_err(|_| CommandError::InvalidId {
        kind,
        raw: raw.to_owned(),
    })
}

fn jobs(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    match tokens.get(1).map(String::as_str) {
        Some("-l") => show::jobs(shell),
        Some("-k") => {
            let id: JobId = parse_id(tokens, "job")?;
            shell.reporter().process(&format!("Killing job {id}..."));
            shell.jobs().stop(id)?;
        }
        _ => return Err(CommandError::usage("jobs <option> [arguments]")),
    }
    Ok(())
}

fn sessions(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    match tokens.get(1).map(String::as_str) {
        Some("-l") => show::sessions(shell),
        Some("-c") => {
            let id: SessionId = parse_id(tokens, "session")?;
            shell.reporter().process(&format!("Closing session {id}..."));
            shell.sessions().close(id)?;
        }
        Some("-C") => {
            shell.reporter().process("Closing all sessions...");
            shell.sessions().close_all();
        }
        _ => return Err(CommandError::usage("sessions <option> [arguments]")),
    }
    Ok(())
}
