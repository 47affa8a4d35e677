//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status} fetching {url}")]
    Http {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Month outside 1..=12
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema declares a type the validator does not know
    #[error("Unsupported type {field_type} for column '{column}'")]
    UnsupportedType {
        /// Declared type name
        field_type: String,
        /// Column the type was declared for
        column: String,
    },

    /// Declared columns absent from the data
    #[error("Missing columns: {}", format_set(.0))]
    MissingColumns(Vec<String>),

    /// Data columns not declared in the schema
    #[error("Extra columns: {}", format_set(.0))]
    ExtraColumns(Vec<String>),

    /// Column dtype does not match the declared type
    #[error("Column '{column}' has type {actual}, expected {expected}")]
    TypeMismatch {
        /// Column name
        column: String,
        /// Declared type
        expected: String,
        /// Actual polars dtype
        actual: String,
    },

    /// Blob name that cannot be mapped to storage
    #[error("Invalid blob name: {0}")]
    InvalidBlobName(String),

    /// Blob not found in bucket
    #[error("Blob {name} not found in bucket {bucket}")]
    BlobNotFound {
        /// Bucket name
        bucket: String,
        /// Blob name
        name: String,
    },

    /// No parquet blob matched a taxi type
    #[error("No {taxi_type} parquet blobs in bucket {bucket}")]
    NoMatchingBlobs {
        /// Bucket name
        bucket: String,
        /// Taxi type filter
        taxi_type: String,
    },
}

/// Render column names as `{'a', 'b'}`.
fn format_set(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    format!("{{{}}}", quoted.join(", "))
}
