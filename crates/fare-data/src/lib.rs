#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/farepipe/fare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fetch;
pub mod schema;
pub mod storage;

pub use error::{DataError, Result};
pub use fetch::{DEFAULT_BASE_URL, NycTaxiFetcher, months_ago};
pub use schema::{FieldType, SchemaField, validate_schema};
pub use storage::{BlobStore, LocalBlobStore};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
