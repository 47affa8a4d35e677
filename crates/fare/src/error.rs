//! Error types for project configuration

use thiserror::Error;

/// Errors raised while loading the project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed YAML, missing field or wrong type
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Well-formed but unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
