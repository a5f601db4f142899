//! Console flags parsed after configuration flags are split off.

use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "hatchet",
    version,
    about = "Interactive console for security testing modules.",
    after_help = "Configuration flags (--config-path, --log-filter, --log-format, --prompt, \
                  --listen-host, --connect-back-host, --handler-port) are also accepted and \
                  may be set through HATCHET_* environment variables."
)]
pub(crate) struct Cli {
    /// Run the commands in FILE before anything else; may be repeated.
    #[arg(short = 's', long = "script", value_name = "FILE")]
    pub(crate) scripts: Vec<Utf8PathBuf>,
    /// Stay in the interactive prompt after the scripts finish.
    #[arg(long, requires = "scripts")]
    pub(crate) no_exit: bool,
}

impl Cli {
    /// Returns `true` when the interactive prompt should run.
    pub(crate) fn interactive(&self) -> bool {
        self.scripts.is_empty() || self.no_exit
    }
}
