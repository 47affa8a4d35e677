//! Error types for model training and tracking.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while fitting, scoring or tracking models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A configured column is absent from the input
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A numeric feature or target holds nulls or a non-numeric dtype
    #[error("Column {column} is not usable as numeric input: {reason}")]
    NonNumeric {
        /// Column name
        column: String,
        /// What was wrong
        reason: String,
    },

    /// Predict called before fit
    #[error("Model has not been fitted")]
    NotFitted,

    /// Training requested on zero rows
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    /// Array shapes do not line up
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Trainer step called out of order
    #[error("Invalid trainer state: {0}")]
    InvalidState(String),

    /// Run id unknown to the tracking store
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// Model version unknown to the registry
    #[error("Model {name} has no version {version}")]
    VersionNotFound {
        /// Registered model name
        name: String,
        /// Requested version
        version: i64,
    },

    /// Alias unknown to the registry
    #[error("Model {name} has no alias {alias}")]
    AliasNotFound {
        /// Registered model name
        name: String,
        /// Requested alias
        alias: String,
    },

    /// Artifact missing from a run
    #[error("Artifact {path} not found in run {run_id}")]
    ArtifactNotFound {
        /// Run id
        run_id: String,
        /// Artifact path within the run
        path: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
