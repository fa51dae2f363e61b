//! Simulator errors

use stride_nav::NavError;
use thiserror::Error;

/// Simulator errors
#[derive(Debug, Error)]
pub enum SimError {
    /// Controller construction failed
    #[error(transparent)]
    Nav(#[from] NavError),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Preset could not be converted for layering
    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
