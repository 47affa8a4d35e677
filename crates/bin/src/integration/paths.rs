//! Locations of buckets and the tracking store.
//!
//! Both default to a platform data directory and can be moved with
//! environment variables.

use fare_data::LocalBlobStore;
use fare_model::{ModelError, TrackingStore};
use std::path::PathBuf;

/// Overrides the tracking store path.
pub(crate) const TRACKING_DB_ENV: &str = "FARE_TRACKING_DB";

/// Overrides the directory holding the buckets.
pub(crate) const STORAGE_ROOT_ENV: &str = "FARE_STORAGE_ROOT";

/// Get the default data directory.
///
/// - Linux: `~/.local/share/fare/`
/// - macOS: `~/Library/Application Support/fare/`
/// - Windows: `%APPDATA%\fare\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fare")
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Directory holding one subdirectory per bucket.
pub(crate) fn storage_root() -> PathBuf {
    env_path(STORAGE_ROOT_ENV).unwrap_or_else(|| default_data_dir().join("buckets"))
}

/// Path of the SQLite tracking store.
pub(crate) fn tracking_db_path() -> PathBuf {
    env_path(TRACKING_DB_ENV).unwrap_or_else(|| default_data_dir().join("tracking.db"))
}

/// Bucket `name` under the storage root.
pub(crate) fn open_bucket(name: &str) -> LocalBlobStore {
    LocalBlobStore::new(storage_root(), name)
}

/// Open the tracking store, creating the directory if needed.
pub(crate) fn open_tracking_store() -> Result<TrackingStore, ModelError> {
    let path = tracking_db_path();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    TrackingStore::open(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir() {
        assert!(default_data_dir().ends_with("fare"));
    }

    #[test]
    fn test_env_path_ignores_empty() {
        assert_eq!(env_path("FARE_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
