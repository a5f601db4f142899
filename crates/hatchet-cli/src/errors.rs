//! Failures that end the CLI before or around the console loop.

use std::sync::Arc;

use hatchet_config::ConfigError;
use hatchet_core::ConsoleError;
use thiserror::Error;

use crate::catalog::BuiltinError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to build the module catalog: {0}")]
    Catalog(#[from] BuiltinError),
    #[error(transparent)]
    Script(#[from] ConsoleError),
}
