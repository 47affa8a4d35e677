//! Error types for feature engineering.

use thiserror::Error;

/// Result type for feature engineering operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while turning raw trips into features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A column required by a step is absent from the input table
    #[error("Missing column: {column}")]
    MissingColumn {
        /// Name of the absent column
        column: String,
    },

    /// Test fraction outside the open interval (0, 1)
    #[error("Invalid test size {0}: must be strictly between 0 and 1")]
    InvalidSplit(f64),

    /// Invalid step parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Polars error, including timestamp parse failures
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl FeatureError {
    /// Build a missing-column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }
}
