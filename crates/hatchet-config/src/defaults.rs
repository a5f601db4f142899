//! Built-in defaults applied when no other configuration layer sets a value.

use crate::logging::LogFormat;

/// Default log filter expression used by the console.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default prompt label.
pub const DEFAULT_PROMPT: &str = "hsf";

/// Default host a reverse handler listens on (`LHOST`).
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

/// Default host a payload connects back to (`CBHOST`).
pub const DEFAULT_CONNECT_BACK_HOST: &str = "127.0.0.1";

/// Default port shared by the listener and bind handler fields.
pub const DEFAULT_HANDLER_PORT: u16 = 8888;

/// Default log filter expression used by the console.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the console.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Owned prompt label.
#[must_use]
pub fn default_prompt() -> String {
    DEFAULT_PROMPT.to_owned()
}

/// Owned listen host.
#[must_use]
pub fn default_listen_host() -> String {
    DEFAULT_LISTEN_HOST.to_owned()
}

/// Owned connect-back host.
#[must_use]
pub fn default_connect_back_host() -> String {
    DEFAULT_CONNECT_BACK_HOST.to_owned()
}

/// Default handler port.
#[must_use]
pub const fn default_handler_port() -> u16 {
    DEFAULT_HANDLER_PORT
}
