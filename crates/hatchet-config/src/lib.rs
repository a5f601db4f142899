//! Shared configuration for the Hatchet console.
//!
//! Configuration is layered with `ortho_config`: built-in defaults are
//! overridden by a TOML file (`--config-path` or `HATCHET_CONFIG_PATH`),
//! then by `HATCHET_*` environment variables, and finally by command-line
//! flags. The resolved [`Config`] carries the logging setup, the prompt label,
//! and the default values seeded into the handler option templates
//! (`LHOST`, `CBHOST`, and the handler ports).

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_CONNECT_BACK_HOST, DEFAULT_HANDLER_PORT, DEFAULT_LISTEN_HOST, DEFAULT_LOG_FILTER,
    DEFAULT_PROMPT, default_connect_back_host, default_handler_port, default_listen_host,
    default_log_filter, default_log_filter_string, default_log_format, default_prompt,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HATCHET")]
pub struct Config {
    /// Filter expression applied to structured logs.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Label rendered inside the interactive prompt.
    #[serde(default = "default_prompt")]
    #[ortho_config(default = default_prompt())]
    pub prompt: String,
    /// Default `LHOST` for reverse handlers.
    #[serde(default = "default_listen_host")]
    #[ortho_config(default = default_listen_host())]
    pub listen_host: String,
    /// Default `CBHOST` for connect-back payloads.
    #[serde(default = "default_connect_back_host")]
    #[ortho_config(default = default_connect_back_host())]
    pub connect_back_host: String,
    /// Default port for `LPORT`, `RBPORT`, `CBPORT`, and `BPORT`.
    #[serde(default = "default_handler_port")]
    #[ortho_config(default = default_handler_port())]
    pub handler_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            prompt: default_prompt(),
            listen_host: default_listen_host(),
            connect_back_host: default_connect_back_host(),
            handler_port: default_handler_port(),
        }
    }
}

impl Config {
    /// Filter expression applied to structured logs.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for structured logs.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Label rendered inside the interactive prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        self.prompt.as_str()
    }

    /// Default `LHOST` for reverse handlers.
    #[must_use]
    pub fn listen_host(&self) -> &str {
        self.listen_host.as_str()
    }

    /// Default `CBHOST` for connect-back payloads.
    #[must_use]
    pub fn connect_back_host(&self) -> &str {
        self.connect_back_host.as_str()
    }

    /// Default handler port.
    #[must_use]
    pub const fn handler_port(&self) -> u16 {
        self.handler_port
    }

    /// Checks values that the layered loader cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the prompt is blank, the handler port is
    /// zero, or either default host is not an IP address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prompt.trim().is_empty() {
            return Err(ConfigError::BlankPrompt);
        }
        if self.handler_port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        for (field, value) in [
            ("listen_host", self.listen_host.as_str()),
            ("connect_back_host", self.connect_back_host.as_str()),
        ] {
            if value.parse::<std::net::IpAddr>().is_err() {
                return Err(ConfigError::InvalidHost {
                    field,
                    value: value.to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Semantic validation failures for a loaded [`Config`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The prompt label was empty or whitespace.
    #[error("prompt must not be blank")]
    BlankPrompt,
    /// The handler port was zero.
    #[error("handler_port must be between 1 and 65535")]
    ZeroPort,
    /// A default host was not a literal IP address.
    #[error("{field} must be an IP address, got '{value}'")]
    InvalidHost {
        /// Configuration field that failed.
        field: &'static str,
        /// Rejected value.
        value: String,
    },
}
