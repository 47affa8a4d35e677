//! Server settings.

use fare_model::LATEST_ALIAS;
use std::path::PathBuf;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port.
pub const DEFAULT_PORT: u16 = 8000;

/// Where to listen and which model to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Tracking store holding the registered model
    pub tracking_db: PathBuf,
    /// Registered model name
    pub model_name: String,
    /// Alias of the version to serve
    pub model_alias: String,
}

impl ServeConfig {
    /// Settings for `model_name` in `tracking_db`, with host and port taken
    /// from `API_HOST` / `API_PORT` when set.
    pub fn from_env(tracking_db: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            tracking_db: tracking_db.into(),
            model_name: model_name.into(),
            model_alias: LATEST_ALIAS.to_string(),
        }
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
