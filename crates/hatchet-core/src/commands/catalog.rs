//! Catalog listings and plugin loading.

use std::sync::Arc;

use crate::command::{Command, CommandDetails, CommandError};
use crate::entity::EntityKind;
use crate::shell::Shell;
use crate::show;

pub(super) fn commands() -> Vec<Command> {
    let listings = [
        ("modules", "Show available modules.", EntityKind::Module),
        ("payloads", "Show available payloads.", EntityKind::Payload),
        ("encoders", "Show available encoders.", EntityKind::Encoder),
        ("plugins", "Show available plugins.", EntityKind::Plugin),
    ]
    .into_iter()
    .map(|(name, description, kind)| {
        Command::new(
            CommandDetails::new("catalog", name, description, name),
            move |shell: &Arc<Shell>, _: &[String]| {
                show::catalog(shell, kind);
                Ok(())
            },
        )
    });

    listings
        .chain([
            Command::new(
                CommandDetails::new("catalog", "load", "Load a plugin.", "load <plugin>")
                    .min_args(1),
                load,
            ),
            Command::new(
                CommandDetails::new("catalog", "unload", "Unload a plugin.", "unload <plugin>")
                    .min_args(1),
                unload,
            ),
        ])
        .collect()
}

fn plugin_name(shell: &Shell, tokens: &[String], usage: &str) -> Result<String, CommandError> {
    let raw = tokens.get(1).ok_or_else(|| CommandError::usage(usage))?;
    Ok(shell.catalog().find_shorthand(EntityKind::Plugin, raw))
}

fn load(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    let name = plugin_name(shell, tokens, "load <plugin>")?;
    let plugin = shell
        .catalog()
        .plugin(&name)
        .ok_or_else(|| CommandError::UnknownPlugin { name: name.clone() })?;
    shell.reporter().process(&format!("Loading {name} plugin..."));
    shell.load_plugin(plugin)?;
    shell
        .reporter()
        .success(&format!("Successfully loaded {name} plugin!"));
    Ok(())
}

fn unload(shell: &Arc<Shell>, tokens: &[String]) -> Result<(), CommandError> {
    let name = plugin_name(shell, tokens, "unload <plugin>")?;
    shell.unload_plugin(&name)?;
    shell
        .reporter()
        .success(&format!("Successfully unloaded {name} plugin!"));
    Ok(())
}
