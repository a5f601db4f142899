//! Module selection, option assignment, and `run`.

use std::sync::Arc;

use tracing::{debug, info};

use super::COMMANDS_TARGET;
use crate::command::{Command, CommandDetails, CommandError};
use crate::entity::{EntityKind, RunContext};
use crate::ids::ModuleId;
use crate::shell::Shell;
use crate::show;

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new(
            CommandDetails::new("module", "use", "Select a module.", "use <module>").min_args(1),
            use_module,
        ),
        Command::new(
            CommandDetails::new("module", "back", "Leave the current module.", "back"),
            back,
        ),
        Command::new(
            CommandDetails::new(
                "module",
                "options",
                "Show options of the current module.",
                "options",
            ),
            options,
        ),
        Command::new(
            CommandDetails::new(
                "module",
                "set",
                "Set an option of the current module.",
                "set <option> <value>",
            )
            .min_args(2),
            set,
        ),
        Command::new(
            CommandDetails::new(
                "module",
                "unset",
                "Clear an option of the current module.",
                "unset <option>",
            )
            .min_args(1),
            unset,
        ),
        Command::new(
            CommandDetails::new("module", "run", "Run the current module.", "run [-j]"),
            run,
        ),
    ]
}

fn argument(tokens: &[String], index: usize, usage: &str) -> Result<String, CommandError> {
    tokens
        .get(index)
        .cloned()
        .ok_or_else(|| CommandError::usage(usage))
}

fn use_module(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    let raw = argument(tokens, 1, "use <module>")?;
    let id = ModuleId::new(shell.catalog().find_shorthand(EntityKind::Module, &raw));
    if !shell.selection().select(&id, shell.catalog()) {
        return Err(CommandError::UnknownModule { name: raw });
    }
    debug!(target: COMMANDS_TARGET, module = %id, "module selected");
    Ok(())
}

fn back(shell: &Arc<Shell>, _tokens: &[String]) -> Result<(), CommandError> {
    shell.selection().deselect();
    Ok(())
}

fn options(shell: &Arc<Shell>, _tokens: &[String]) -> Result<(), CommandError> {
    if show::options(shell) {
        Ok(())
    } else {
        Err(CommandError::NoModuleSelected)
    }
}

fn set(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    let name = argument(tokens, 1, "set <option> <value>")?;
    let value = argument(tokens, 2, "set <option> <value>")?;
    shell
        .selection()
        .set_option(&name, &value, shell.catalog(), shell.sessions())?;
    shell
        .reporter()
        .information(&format!("{} => {value}", name.to_ascii_uppercase()));
    Ok(())
}

fn unset(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    let name = argument(tokens, 1, "unset <option>")?;
    shell.selection().unset_option(&name)?;
    shell
        .reporter()
        .information(&format!("{} cleared.", name.to_ascii_uppercase()));
    Ok(())
}

fn run(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    let background = match tokens.get(1).map(String::as_str) {
        None => false,
        Some("-j") => true,
        Some(_) => return Err(CommandError::usage("run [-j]")),
    };

    let (context, action) = {
        let selection = shell.selection();
        let module = selection.current().ok_or(CommandError::NoModuleSelected)?;
        if let Some(name) = module.missing_required().into_iter().next() {
            return Err(CommandError::MissingOption { name });
        }
        let context = RunContext {
            details: module.details().clone(),
            options: module.options().clone(),
            handler: module.handler().cloned(),
            payload: module.current_payload().cloned(),
            sessions: shell.sessions().clone(),
            reporter: shell.reporter_handle(),
            job: None,
        };
        (context, module.action())
    };

    if !background {
        info!(target: COMMANDS_TARGET, module = %context.details.id, "running module");
        action.run(&context)?;
        return Ok(());
    }

    let name = context.details.name.clone();
    let module = context.details.id.to_string();
    let id = shell.jobs().create(&name, Some(module), false, move |job| {
        let job_context = RunContext {
            job: Some(job),
            ..context
        };
        if let Err(failure) = action.run(&job_context) {
            job_context
                .reporter
                .error(&CommandError::from(failure).to_string());
        }
    })?;
    shell
        .reporter()
        .process(&format!("Module started as a background job {id}."));
    Ok(())
}
