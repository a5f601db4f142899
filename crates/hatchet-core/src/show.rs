//! Listings rendered through the reporter.

use indexmap::IndexMap;

use crate::command::{CommandDetails, CommandNamespace};
use crate::entity::{CatalogEntry, EntityKind};
use crate::option::OptionSet;
use crate::report::Reporter;
use crate::shell::Shell;

/// Prints the usage line and, when present, the sub-option table.
pub(crate) fn usage(reporter: &dyn Reporter, details: &CommandDetails) {
    reporter.usage(&details.usage);
    if details.options.is_empty() {
        return;
    }
    let rows: Vec<Vec<String>> = details
        .options
        .iter()
        .map(|(token, option)| {
            let arguments = if option.arguments.is_empty() {
                String::from("none")
            } else {
                option.arguments.clone()
            };
            vec![token.clone(), arguments, option.description.clone()]
        })
        .collect();
    reporter.table("Options", &["Option", "Arguments", "Description"], &rows);
}

/// Lists every command reachable from the prompt, grouped as dispatch sees
/// them.
pub(crate) fn all_commands(shell: &Shell) {
    let reporter = shell.reporter();
    let core = shell.core_commands();
    let mut categories: IndexMap<&str, Vec<Vec<String>>> = IndexMap::new();
    for command in core.iter() {
        categories
            .entry(command.details().category.as_str())
            .or_default()
            .push(command_row(&command.details().name, &command.details().description));
    }
    for (category, rows) in &categories {
        reporter.table(&commands_title(category), &["Command", "Description"], rows);
    }

    if let Some(module) = shell.module_commands() {
        namespace_table(reporter, "module", &module);
    }
    let plugins = shell.plugins();
    for plugin in plugins.iter() {
        for (label, commands) in plugin.groups() {
            namespace_table(reporter, label, commands);
        }
    }
}

fn namespace_table(reporter: &dyn Reporter, label: &str, commands: &CommandNamespace) {
    if commands.is_empty() {
        return;
    }
    let rows: Vec<Vec<String>> = commands
        .iter()
        .map(|command| command_row(command.name(), &command.details().description))
        .collect();
    reporter.table(&commands_title(label), &["Command", "Description"], &rows);
}

fn command_row(name: &str, description: &str) -> Vec<String> {
    vec![name.to_owned(), description.to_owned()]
}

fn commands_title(label: &str) -> String {
    let mut chars = label.chars();
    let head: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
    format!("{head}{} Commands", chars.as_str())
}

/// Option tables for the current module and its payload.
///
/// Returns `false` when no module is selected.
pub(crate) fn options(shell: &Shell) -> bool {
    let selection = shell.selection();
    let Some(module) = selection.current() else {
        return false;
    };
    let reporter = shell.reporter();
    option_table(reporter, "Module Options", module.options());
    if let Some(payload) = module.current_payload() {
        option_table(
            reporter,
            &format!("Payload Options ({})", payload.id()),
            payload.options(),
        );
    }
    true
}

fn option_table(reporter: &dyn Reporter, title: &str, options: &OptionSet) {
    if options.is_empty() {
        return;
    }
    let rows: Vec<Vec<String>> = options
        .iter()
        .map(|(name, option)| {
            vec![
                name.to_owned(),
                option.display_value(),
                yes_no(option.is_required()),
                option.description().to_owned(),
            ]
        })
        .collect();
    reporter.table(title, &["Option", "Value", "Required", "Description"], &rows);
}

/// Numbered listing of one catalog kind; the number is a valid shorthand.
pub(crate) fn catalog(shell: &Shell, kind: EntityKind) {
    let entries = shell.catalog().entries(kind);
    let (title, column) = match kind {
        EntityKind::Module => ("Modules", "Module"),
        EntityKind::Payload => ("Payloads", "Payload"),
        EntityKind::Encoder => ("Encoders", "Encoder"),
        EntityKind::Plugin => ("Plugins", "Plugin"),
    };
    if entries.is_empty() {
        shell
            .reporter()
            .warning(&format!("No {} available.", title.to_lowercase()));
        return;
    }
    let loaded = shell.plugins();
    let rows: Vec<Vec<String>> = entries
        .into_iter()
        .enumerate()
        .map(|(number, CatalogEntry { id, name, .. })| {
            let state = (kind == EntityKind::Plugin).then(|| yes_no(loaded.get(&id).is_some()));
            let mut row = vec![number.to_string(), id, name];
            row.extend(state);
            row
        })
        .collect();
    let headers: &[&str] = if kind == EntityKind::Plugin {
        &["Number", column, "Name", "Loaded"]
    } else {
        &["Number", column, "Name"]
    };
    shell.reporter().table(title, headers, &rows);
}

fn yes_no(flag: bool) -> String {
    String::from(if flag { "yes" } else { "no" })
}

/// Running visible jobs.
pub(crate) fn jobs(shell: &Shell) {
    let jobs = shell.jobs().list();
    if jobs.is_empty() {
        shell.reporter().warning("No running jobs available.");
        return;
    }
    let rows: Vec<Vec<String>> = jobs
        .into_iter()
        .map(|job| {
            vec![
                job.id.to_string(),
                job.name,
                job.module.unwrap_or_default(),
            ]
        })
        .collect();
    shell
        .reporter()
        .table("Active Jobs", &["ID", "Name", "Module"], &rows);
}

/// Open sessions.
pub(crate) fn sessions(shell: &Shell) {
    let sessions = shell.sessions().list();
    if sessions.is_empty() {
        shell.reporter().warning("No opened sessions available.");
        return;
    }
    let rows: Vec<Vec<String>> = sessions
        .into_iter()
        .map(|session| {
            vec![
                session.id.to_string(),
                session.platform,
                session.session_type,
                session.host,
                session.port.to_string(),
            ]
        })
        .collect();
    shell.reporter().table(
        "Opened Sessions",
        &["ID", "Platform", "Type", "Host", "Port"],
        &rows,
    );
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("core", "Core Commands")]
    #[case("module", "Module Commands")]
    #[case("", " Commands")]
    fn titles_capitalise_the_label(#[case] label: &str, #[case] expected: &str) {
        assert_eq!(commands_title(label), expected);
    }
}
