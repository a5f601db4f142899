//! Crate-level tests driving a whole console session.

pub(crate) mod support;

use std::sync::Arc;

use rstest::rstest;

use self::support::{DEMO_MODULE, SCANNER_MODULE, shell_with_input, wait_until};
use crate::console::Console;
use crate::handler::HandlerField;

#[rstest]
fn operator_session_end_to_end() {
    let (shell, reporter) = shell_with_input(&[
        "modules",
        &format!("use {DEMO_MODULE}"),
        "set RHOST 10.0.0.7",
        "set PAYLOAD linux/x64/shell_reverse_tcp",
        "set LPORT 9001",
        "run",
        "back",
        "exit",
    ]);
    let console = Console::new(Arc::clone(&shell));
    console.run();

    assert!(reporter.has_line("Modules:"));
    assert!(reporter.has_line("[i] RHOST => 10.0.0.7"));
    assert!(reporter.has_line("[i] LPORT => 9001"));
    assert!(reporter.has_line("[*] Triggering backdoor on 10.0.0.7..."));
    assert!(shell.exit_requested());
    assert!(shell.selection().current().is_none());
}

#[rstest]
fn run_context_sees_the_published_handler_map() {
    let (shell, _) = shell_with_input(&[]);
    let console = Console::new(Arc::clone(&shell));
    console.cycle(&format!("use {DEMO_MODULE}"));
    console.cycle("set PAYLOAD linux/x64/shell_reverse_tcp");
    console.cycle("set LPORT 9001");

    let selection = shell.selection();
    let module = selection.current().expect("module selected");
    let handler = module.handler().expect("handler published");
    assert_eq!(handler.port(HandlerField::Lport), Some(9001));
    assert_eq!(handler.host(HandlerField::Lhost), Some("0.0.0.0"));
    assert!(!handler.contains(HandlerField::Rbport));
}

#[rstest]
fn background_module_outlives_the_command_and_is_reaped() {
    let (shell, reporter) = shell_with_input(&[]);
    let console = Console::new(Arc::clone(&shell));
    console.cycle(&format!("use {SCANNER_MODULE}"));
    console.cycle("run -j");

    assert!(wait_until(|| reporter.has_line("[+] Scan complete.")));
    assert!(wait_until(|| {
        console.cycle("# reap");
        shell.jobs().is_empty()
    }));
}

#[rstest]
fn exit_declined_keeps_the_loop_running() {
    let (shell, reporter) = shell_with_input(&["exit", "no", "sessions -l", "exit", "y"]);
    shell.sessions().open("linux", "shell", "10.0.0.2", 4444);
    Console::new(Arc::clone(&shell)).run();

    assert!(reporter.has_line("Opened Sessions:"));
    assert!(shell.exit_requested());
    assert!(!shell.sessions().has_open());
}
