//! Error types for the server

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fare_model::ModelError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the prediction service.
#[derive(Debug, Error)]
pub enum ServeError {
    /// No model has been loaded
    #[error("No model loaded")]
    ModelNotLoaded,

    /// Input the model cannot score
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model failure
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Bind address that does not parse
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress {
        /// Offending address
        address: String,
        /// Parse error
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::ModelNotLoaded => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Self::InvalidInput(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::Model(ModelError::MissingColumn(_) | ModelError::NonNumeric { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            Self::Model(e) => {
                tracing::error!(detail = %e, "prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Prediction failed".to_string(),
                )
            }
            Self::InvalidAddress { .. } | Self::Io(_) => {
                tracing::error!(detail = %self, "server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServeError>;
