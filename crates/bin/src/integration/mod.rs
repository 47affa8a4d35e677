//! Glue between the CLI and the library crates.
//!
//! Resolves where buckets and the tracking store live, and drives the
//! concurrent monthly downloads.

pub(crate) mod loader;
pub(crate) mod paths;
