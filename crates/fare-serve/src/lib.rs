#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/farepipe/fare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use api::{create_router, serve};
pub use config::ServeConfig;
pub use error::{Result, ServeError};
pub use handlers::{PredictRequest, PredictResponse};
pub use state::{AppState, LoadedModel};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
