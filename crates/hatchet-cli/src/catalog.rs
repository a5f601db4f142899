//! Modules, payloads, encoders, and plugins shipped with the binary.
//!
//! None of these touch the network: they exist so an operator can exercise
//! selection, option synthesis, jobs, and sessions without an external
//! module tree.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hatchet_core::command::{Command, CommandDetails, CommandError, CommandNamespace};
use hatchet_core::entity::{
    CatalogError, ConnectionType, Encoder, EntityKind, InMemoryCatalog, Module, ModuleDetails,
    ModuleFailure, Payload, PayloadBinding, PayloadDetails, RunContext,
};
use hatchet_core::handler::HandlerField;
use hatchet_core::ids::{EncoderId, PayloadId};
use hatchet_core::option::{ModuleOption, OptionError, OptionKind, OptionValue};
use hatchet_core::plugin::Plugin;
use hatchet_core::shell::Shell;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

const CATALOG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::catalog");

pub(crate) const SLEEP_MODULE: &str = "auxiliary/generic/sleep";
pub(crate) const LOOPBACK_MODULE: &str = "exploit/linux/generic/loopback";
pub(crate) const SESSION_INFO_MODULE: &str = "post/multi/gather/session_info";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub(crate) enum BuiltinError {
    #[error(transparent)]
    Register(#[from] CatalogError),
    #[error("invalid default for {option}: {source}")]
    Default {
        option: &'static str,
        #[source]
        source: OptionError,
    },
}

fn with_default(
    option: ModuleOption,
    name: &'static str,
    raw: &str,
) -> Result<ModuleOption, BuiltinError> {
    option
        .with_default(raw)
        .map_err(|source| BuiltinError::Default { option: name, source })
}

/// Builds the built-in catalog.
pub(crate) fn builtin() -> Result<InMemoryCatalog, BuiltinError> {
    let mut catalog = InMemoryCatalog::new();
    for module in [sleep_module()?, loopback_module(), session_info_module()] {
        catalog.add_module(module)?;
    }
    for payload in payloads()? {
        catalog.add_payload(payload)?;
    }
    for encoder in [
        encoder("x64/xor", "x64", "Single-byte XOR encoder."),
        encoder("generic/base64", "generic", "Base64 encoder for any architecture."),
        encoder("x86/shikata_ga_nai", "x86", "Polymorphic XOR additive feedback encoder."),
    ] {
        catalog.add_encoder(encoder)?;
    }
    catalog.add_plugin(notes_plugin())?;
    catalog.add_alias(EntityKind::Module, "sleep", SLEEP_MODULE);
    catalog.add_alias(EntityKind::Module, "loopback", LOOPBACK_MODULE);
    debug!(target: CATALOG_TARGET, "built-in catalog ready");
    Ok(catalog)
}

fn sleep_module() -> Result<Module, BuiltinError> {
    let seconds = with_default(
        ModuleOption::new(OptionKind::Number, "Seconds to sleep.").with_required(true),
        "SECONDS",
        "5",
    )?;
    Ok(Module::new(
        ModuleDetails::new(SLEEP_MODULE, "Sleep")
            .platform("multi")
            .description("Sleeps for a while; useful for trying out background jobs."),
        sleep,
    )
    .with_option("SECONDS", seconds))
}

fn sleep(context: &RunContext) -> Result<(), ModuleFailure> {
    let seconds = match context.option("SECONDS") {
        Some(OptionValue::Integer(seconds)) => u64::try_from(*seconds)
            .map_err(|_| ModuleFailure::new("SECONDS must not be negative"))?,
        _ => return Err(ModuleFailure::new("SECONDS is not set")),
    };
    let deadline = Instant::now()
        .checked_add(Duration::from_secs(seconds))
        .ok_or_else(|| ModuleFailure::new(format!("cannot sleep for {seconds} seconds")))?;
    context
        .reporter
        .process(&format!("Sleeping for {seconds} seconds..."));

    while Instant::now() < deadline {
        if context.is_stopped() {
            context.reporter.warning("Sleep interrupted.");
            return Ok(());
        }
        thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
    }
    context.reporter.success("Woke up.");
    Ok(())
}

fn loopback_module() -> Module {
    Module::new(
        ModuleDetails::new(LOOPBACK_MODULE, "Loopback Session")
            .platform("linux")
            .rank("low")
            .description("Registers a local session as if the payload had connected."),
        loopback,
    )
    .with_option(
        "RHOST",
        ModuleOption::new(OptionKind::Ip, "Host the session is attributed to.")
            .with_required(true),
    )
    .with_option(
        "ENCODER",
        ModuleOption::new(OptionKind::Encoder, "Encoder applied to the payload."),
    )
    .with_payload_binding(PayloadBinding {
        platforms: Some(vec![String::from("linux")]),
        architectures: Some(vec![String::from("x64")]),
        ..PayloadBinding::with_default("linux/x64/shell_reverse_tcp")
    })
}

fn loopback(context: &RunContext) -> Result<(), ModuleFailure> {
    let host = context
        .option("RHOST")
        .map(ToString::to_string)
        .ok_or_else(|| ModuleFailure::new("RHOST is not set"))?;
    let Some(payload) = context.payload.as_ref() else {
        return Err(ModuleFailure::new("no payload chosen"));
    };
    let port = [context.handler.as_ref(), payload.handler()]
        .into_iter()
        .flatten()
        .find_map(|handler| {
            [HandlerField::Lport, HandlerField::Rbport, HandlerField::Bport]
                .into_iter()
                .find_map(|field| handler.port(field))
        })
        .ok_or_else(|| ModuleFailure::new("payload publishes no handler port"))?;

    if let Some(encoder) = payload.encoder() {
        context
            .reporter
            .process(&format!("Encoding {} with {encoder}...", payload.id()));
    }
    context
        .reporter
        .process(&format!("Sending {} to {host}...", payload.id()));
    let session_type = payload.details().name.split('_').next().unwrap_or("shell");
    let (id, _liveness) = context.sessions.open("linux", session_type, &host, port);
    context
        .reporter
        .success(&format!("Session {id} opened ({host}:{port})."));
    Ok(())
}

fn session_info_module() -> Module {
    Module::new(
        ModuleDetails::new(SESSION_INFO_MODULE, "Session Info")
            .platform("multi")
            .description("Prints what is known about an open session."),
        session_info,
    )
    .with_option(
        "SESSION",
        ModuleOption::new(OptionKind::Session, "Session to describe.").with_required(true),
    )
}

fn session_info(context: &RunContext) -> Result<(), ModuleFailure> {
    let Some(OptionValue::Session(id)) = context.option("SESSION") else {
        return Err(ModuleFailure::new("SESSION is not set"));
    };
    let summary = context
        .sessions
        .get(*id)
        .ok_or_else(|| ModuleFailure::new(format!("session {id} is gone")))?;
    context.reporter.table(
        "Session Information:",
        &["Property", "Value"],
        &[
            vec![String::from("ID"), summary.id.to_string()],
            vec![String::from("Platform"), summary.platform],
            vec![String::from("Type"), summary.session_type],
            vec![String::from("Host"), summary.host],
            vec![String::from("Port"), summary.port.to_string()],
        ],
    );
    Ok(())
}

fn payload(
    id: &str,
    kind: ConnectionType,
    handler: Vec<ConnectionType>,
    description: &str,
) -> Payload {
    Payload::new(PayloadDetails {
        id: PayloadId::from(id),
        name: id.rsplit('/').next().unwrap_or(id).to_owned(),
        platform: String::from("linux"),
        architecture: String::from("x64"),
        kind,
        handler,
        description: description.to_owned(),
    })
}

fn payloads() -> Result<Vec<Payload>, BuiltinError> {
    let tty = with_default(
        ModuleOption::new(OptionKind::Boolean, "Spawn an interactive TTY."),
        "TTY",
        "no",
    )?;
    Ok(vec![
        payload(
            "linux/x64/shell_reverse_tcp",
            ConnectionType::ReverseTcp,
            Vec::new(),
            "Reverse shell that connects back to LHOST:LPORT.",
        )
        .with_option("TTY", tty),
        payload(
            "linux/x64/shell_bind_tcp",
            ConnectionType::BindTcp,
            Vec::new(),
            "Shell listening on BPORT.",
        ),
        payload(
            "linux/x64/pwny_reverse_tcp",
            ConnectionType::ReverseTcp,
            vec![ConnectionType::BindTcp],
            "Agent that calls back and can also be reached on RBPORT.",
        ),
        payload(
            "linux/x64/kill_all",
            ConnectionType::OneSide,
            Vec::new(),
            "Kills every process the target user owns.",
        ),
    ])
}

fn encoder(id: &str, architecture: &str, description: &str) -> Encoder {
    Encoder {
        id: EncoderId::from(id),
        name: id.to_owned(),
        architecture: architecture.to_owned(),
        description: description.to_owned(),
    }
}

fn notes_plugin() -> Plugin {
    let notes: Arc<Mutex<Vec<String>>> = Arc::default();

    let store = Arc::clone(&notes);
    let note = Command::new(
        CommandDetails::new("notes", "note", "Record a note.", "note <text>").min_args(1),
        move |shell: &Arc<Shell>, tokens: &[String]| {
            let text = tokens.get(1..).unwrap_or_default().join(" ");
            let mut stored = store.lock();
            stored.push(text);
            shell
                .reporter()
                .information(&format!("Note {} saved.", stored.len() - 1));
            Ok(())
        },
    );

    let notes_command = Command::new(
        CommandDetails::new(
            "notes",
            "notes",
            "Manage recorded notes.",
            "notes <option> [arguments]",
        )
        .min_args(1)
        .option("-l", "", "List all notes.")
        .option("-d", "<id>", "Delete a note.")
        .option("-c", "", "Delete all notes."),
        move |shell: &Arc<Shell>, tokens: &[String]| {
            let mut stored = notes.lock();
            match (tokens.get(1).map(String::as_str), tokens.get(2)) {
                (Some("-l"), _) if stored.is_empty() => {
                    shell.reporter().warning("No notes recorded.");
                }
                (Some("-l"), _) => {
                    let rows: Vec<Vec<String>> = stored
                        .iter()
                        .enumerate()
                        .map(|(index, text)| vec![index.to_string(), text.clone()])
                        .collect();
                    shell.reporter().table("Notes:", &["ID", "Note"], &rows);
                }
                (Some("-d"), Some(raw)) => {
                    let index = raw
                        .parse::<usize>()
                        .ok()
                        .filter(|index| *index < stored.len())
                        .ok_or_else(|| CommandError::InvalidId {
                            kind: "note",
                            raw: raw.clone(),
                        })?;
                    stored.remove(index);
                    shell.reporter().information(&format!("Note {index} deleted."));
                }
                (Some("-c"), _) => {
                    stored.clear();
                    shell.reporter().information("All notes deleted.");
                }
                _ => return Err(CommandError::usage("notes <option> [arguments]")),
            }
            Ok(())
        },
    );

    Plugin::new("notes", "Keeps short notes for the current engagement.")
        .with_group("notes", CommandNamespace::new().with(note).with(notes_command))
}

#[cfg(test)]
mod tests {
    use hatchet_core::entity::Catalog;
    use hatchet_core::ids::ModuleId;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn builtin_catalog_registers_everything() {
        let catalog = builtin().expect("catalog builds");
        assert_eq!(catalog.entries(EntityKind::Module).len(), 3);
        assert_eq!(catalog.entries(EntityKind::Payload).len(), 4);
        assert_eq!(catalog.entries(EntityKind::Encoder).len(), 3);
        assert!(catalog.plugin("notes").is_some());
    }

    #[rstest]
    #[case("sleep", SLEEP_MODULE)]
    #[case("1", LOOPBACK_MODULE)]
    fn shorthands_resolve(#[case] raw: &str, #[case] expected: &str) {
        let catalog = builtin().expect("catalog builds");
        assert_eq!(catalog.find_shorthand(EntityKind::Module, raw), expected);
    }

    #[rstest]
    fn loopback_takes_only_linux_x64_payloads() {
        let catalog = builtin().expect("catalog builds");
        let module = catalog
            .module(&ModuleId::from(LOOPBACK_MODULE))
            .expect("registered");
        for id in [
            "linux/x64/shell_reverse_tcp",
            "linux/x64/shell_bind_tcp",
            "linux/x64/kill_all",
        ] {
            assert!(catalog.check_payload_compatible(&PayloadId::from(id), &module));
        }
    }
}
