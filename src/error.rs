use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{FeasibilityError, ReportError};
use crate::telemetry::TelemetryError;

/// Failures surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Telemetry(#[from] TelemetryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid arguments: {0}")]
    Arguments(String),

    #[error("{0}")]
    Feasibility(#[from] FeasibilityError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
