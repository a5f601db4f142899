//! Command-line runtime for the Hatchet console.
//!
//! [`run`] splits configuration flags from console flags, loads the layered
//! [`Config`], installs telemetry, and drives a [`Console`] over the built-in
//! catalog. Scripts given with `--script` run first; the interactive prompt
//! follows when no scripts were given or `--no-exit` was passed.

mod catalog;
mod cli;
mod config;
mod errors;
mod telemetry;

use std::ffi::OsString;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use hatchet_config::Config;
use hatchet_core::console::{LineSource, StdinSource};
use hatchet_core::report::{Reporter, SharedWriter, TerminalReporter};
use hatchet_core::{Console, Shell};
use tracing::info;

use crate::cli::Cli;
use crate::config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use crate::errors::AppError;

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

/// Runs the console over the process's standard input and output.
///
/// Returns success after a normal exit or end of input, and failure when
/// configuration, telemetry, or a script file cannot be loaded. Diagnostics
/// for those failures are written to `stderr`.
pub fn run<I, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    E: Write,
{
    let out = SharedWriter::new(io::stdout());
    let input = StdinSource::new(BufReader::new(io::stdin()), out.clone());
    run_with_loader(args, Box::new(input), &out, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E>(
    args: I,
    input: Box<dyn LineSource>,
    out: &SharedWriter<W>,
    stderr: &mut E,
    loader: &dyn ConfigLoader,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write + Send + 'static,
    E: Write,
{
    match execute(args, input, out, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(out.clone(), "{}", error.render());
            ExitCode::SUCCESS
        }
        Err(AppError::CliUsage(error)) => {
            let _ = write!(stderr, "{}", error.render());
            ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(2))
        }
        Err(error) => {
            let _ = writeln!(stderr, "hatchet: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, W>(
    args: I,
    input: Box<dyn LineSource>,
    out: &SharedWriter<W>,
    loader: &dyn ConfigLoader,
) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write + Send + 'static,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&arguments);
    let cli = Cli::try_parse_from(&split.console_arguments).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    config.validate()?;
    let _telemetry = telemetry::initialise(&config)?;

    let console = build_console(&config, input, out)?;
    info!(
        target: CLI_TARGET,
        scripts = cli.scripts.len(),
        interactive = cli.interactive(),
        "console starting"
    );
    if !cli.scripts.is_empty() {
        console.script(&cli.scripts)?;
    }
    if cli.interactive() {
        console.run();
    }
    info!(target: CLI_TARGET, "console stopped");
    Ok(())
}

fn build_console<W>(
    config: &Config,
    input: Box<dyn LineSource>,
    out: &SharedWriter<W>,
) -> Result<Console, AppError>
where
    W: Write + Send + 'static,
{
    let reporter: Arc<dyn Reporter> = Arc::new(TerminalReporter::new(out.clone()));
    let shell = Shell::builder(Arc::new(catalog::builtin()?))
        .config(config)
        .reporter(reporter)
        .input(input)
        .build();
    Ok(Console::new(shell))
}
