#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/farepipe/fare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;

// Re-export main types from sub-crates
pub use fare_data as data;
pub use fare_features as features;
pub use fare_model as model;
pub use fare_output as output;
pub use fare_serve as serve;

pub use config::ProjectConfig;
pub use error::{ConfigError, Result};
pub use fare_model::Tags;

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
