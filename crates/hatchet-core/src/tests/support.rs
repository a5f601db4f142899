//! Shared fixtures: a small catalog and a shell wired to a recorder.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::command::{Command, CommandDetails, CommandNamespace, tokenize};
use crate::console::ScriptedSource;
use crate::dispatch::{DispatchError, Dispatched};
use crate::entity::{
    ConnectionType, Encoder, InMemoryCatalog, Module, ModuleDetails, ModuleFailure, Payload,
    PayloadBinding, PayloadDetails, RunContext,
};
use crate::ids::{EncoderId, PayloadId};
use crate::option::{ModuleOption, OptionKind};
use crate::plugin::Plugin;
use crate::report::{RecordingReporter, Reporter};
use crate::shell::Shell;

pub(crate) const DEMO_MODULE: &str = "exploit/linux/demo/backdoor";
pub(crate) const SCANNER_MODULE: &str = "auxiliary/multi/scan/ports";
pub(crate) const BROKEN_MODULE: &str = "auxiliary/linux/demo/broken";

pub(crate) const REVERSE_PAYLOAD: &str = "linux/x64/shell_reverse_tcp";
pub(crate) const BIND_PAYLOAD: &str = "linux/x64/shell_bind_tcp";
pub(crate) const DUAL_PAYLOAD: &str = "linux/x64/pwny_reverse_tcp";
pub(crate) const ONE_SIDE_PAYLOAD: &str = "linux/x64/kill_all";
pub(crate) const FOREIGN_PAYLOAD: &str = "windows/x86/shell_reverse_tcp";

fn payload(id: &str, platform: &str, architecture: &str, kind: ConnectionType) -> Payload {
    payload_with(id, platform, architecture, kind, Vec::new())
}

fn payload_with(
    id: &str,
    platform: &str,
    architecture: &str,
    kind: ConnectionType,
    handler: Vec<ConnectionType>,
) -> Payload {
    Payload::new(PayloadDetails {
        id: PayloadId::from(id),
        name: id.rsplit('/').next().unwrap_or(id).to_owned(),
        platform: platform.to_owned(),
        architecture: architecture.to_owned(),
        kind,
        handler,
        description: format!("{kind} payload for {platform}."),
    })
}

fn encoder(id: &str, architecture: &str) -> Encoder {
    Encoder {
        id: EncoderId::from(id),
        name: id.to_owned(),
        architecture: architecture.to_owned(),
        description: String::from("Test encoder."),
    }
}

fn backdoor(context: &RunContext) -> Result<(), ModuleFailure> {
    let host = context
        .option("RHOST")
        .map(ToString::to_string)
        .unwrap_or_default();
    context
        .reporter
        .process(&format!("Triggering backdoor on {host}..."));
    Ok(())
}

fn scan(context: &RunContext) -> Result<(), ModuleFailure> {
    let wait = context.option("WAIT").is_some_and(|value| value.is_truthy());
    while wait && !context.is_stopped() {
        thread::sleep(Duration::from_millis(5));
    }
    context.reporter.success("Scan complete.");
    Ok(())
}

fn broken(_: &RunContext) -> Result<(), ModuleFailure> {
    Err(ModuleFailure::new("target unreachable"))
}

fn demo_commands() -> CommandNamespace {
    CommandNamespace::new()
        .with(Command::new(
            CommandDetails::new(
                "module",
                "check",
                "Check whether the target is vulnerable.",
                "check",
            ),
            |shell: &Arc<Shell>, _: &[String]| {
                shell.reporter().success("Target is vulnerable!");
                Ok(())
            },
        ))
        .with(Command::new(
            CommandDetails::new("module", "crash", "Panic inside the handler.", "crash"),
            |_: &Arc<Shell>, _: &[String]| panic!("handler failure"),
        ))
        .with(Command::new(
            CommandDetails::new("module", "options", "Shadowed by the core command.", "options"),
            |shell: &Arc<Shell>, _: &[String]| {
                shell.reporter().empty("module options handler");
                Ok(())
            },
        ))
}

fn demo_plugin() -> Plugin {
    let greet = Command::new(
        CommandDetails::new("demo", "greet", "Greet someone.", "greet <name>").min_args(1),
        |shell: &Arc<Shell>, tokens: &[String]| {
            let name = tokens.get(1).map(String::as_str).unwrap_or_default();
            shell.reporter().success(&format!("Hello, {name}!"));
            Ok(())
        },
    );
    let help = Command::new(
        CommandDetails::new("demo", "help", "Shadowed by the core command.", "help"),
        |shell: &Arc<Shell>, _: &[String]| {
            shell.reporter().empty("plugin help handler");
            Ok(())
        },
    );
    Plugin::new("demo", "Demonstration plugin.")
        .with_group("demo", CommandNamespace::new().with(greet).with(help))
}

/// Catalog with two Linux modules, a failing module, five payloads, three
/// encoders, and one plugin.
pub(crate) fn demo_catalog() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();

    let demo = Module::new(
        ModuleDetails::new(DEMO_MODULE, "Demo Backdoor")
            .platform("linux")
            .description("Triggers a demonstration backdoor."),
        backdoor,
    )
    .with_option(
        "RHOST",
        ModuleOption::new(OptionKind::Ip, "Remote host.").with_required(true),
    )
    .with_option(
        "VERBOSE",
        ModuleOption::new(OptionKind::Boolean, "Print extra detail.")
            .with_default("no")
            .expect("valid default"),
    )
    .with_option("SESSION", ModuleOption::new(OptionKind::Session, "Session to use."))
    .with_option("ENCODER", ModuleOption::new(OptionKind::Encoder, "Encoder to apply."))
    .with_payload_binding(PayloadBinding {
        blinder: Some(true),
        platforms: Some(vec![String::from("linux")]),
        ..PayloadBinding::default()
    })
    .with_commands(demo_commands());

    let scanner = Module::new(
        ModuleDetails::new(SCANNER_MODULE, "Port Scanner").platform("multi"),
        scan,
    )
    .with_option(
        "WAIT",
        ModuleOption::new(OptionKind::Boolean, "Run until stopped.")
            .with_default("no")
            .expect("valid default"),
    )
    .with_payload_binding(PayloadBinding::with_default(REVERSE_PAYLOAD));

    let failing = Module::new(
        ModuleDetails::new(BROKEN_MODULE, "Broken").platform("linux"),
        broken,
    );

    for module in [demo, scanner, failing] {
        catalog.add_module(module).expect("unique module");
    }

    let bind = payload(BIND_PAYLOAD, "linux", "x64", ConnectionType::BindTcp).with_option(
        "TIMEOUT",
        ModuleOption::new(OptionKind::Number, "Connection timeout.")
            .with_default("10")
            .expect("valid default"),
    );
    for instance in [
        payload(REVERSE_PAYLOAD, "linux", "x64", ConnectionType::ReverseTcp),
        bind,
        payload_with(
            DUAL_PAYLOAD,
            "linux",
            "x64",
            ConnectionType::ReverseTcp,
            vec![ConnectionType::BindTcp],
        ),
        payload(ONE_SIDE_PAYLOAD, "linux", "x64", ConnectionType::OneSide),
        payload(FOREIGN_PAYLOAD, "windows", "x86", ConnectionType::ReverseTcp),
    ] {
        catalog.add_payload(instance).expect("unique payload");
    }

    for instance in [
        encoder("x64/xor", "x64"),
        encoder("generic/base64", "generic"),
        encoder("x86/shikata", "x86"),
    ] {
        catalog.add_encoder(instance).expect("unique encoder");
    }

    catalog.add_plugin(demo_plugin()).expect("unique plugin");
    catalog
}

/// Shell over [`demo_catalog`] whose output is recorded and whose input
/// replays `lines`.
pub(crate) fn shell_with_input(lines: &[&str]) -> (Arc<Shell>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::new());
    let shell = Shell::builder(Arc::new(demo_catalog()))
        .reporter(Arc::clone(&reporter) as Arc<dyn Reporter>)
        .input(Box::new(ScriptedSource::new(lines.iter().copied())))
        .build();
    (shell, reporter)
}

/// Shell over [`demo_catalog`] with no input.
pub(crate) fn test_shell() -> (Arc<Shell>, Arc<RecordingReporter>) {
    shell_with_input(&[])
}

/// Tokenizes and dispatches `line` the way the console does, without
/// reporting escaped errors.
pub(crate) fn run_line(shell: &Arc<Shell>, line: &str) -> Result<Dispatched, DispatchError> {
    shell.update_events();
    let outcome = shell.execute(&tokenize(line));
    shell.update_events();
    outcome
}

/// Polls `condition` for up to two seconds.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
