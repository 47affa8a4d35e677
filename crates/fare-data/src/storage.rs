//! Parquet blob storage.
//!
//! Raw monthly files and processed train/test partitions live as named
//! parquet blobs inside a bucket. [`LocalBlobStore`] backs a bucket with a
//! directory.

use crate::error::{DataError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PARQUET_SUFFIX: &str = ".parquet";

/// A bucket of named parquet blobs.
pub trait BlobStore {
    /// Bucket name.
    fn bucket(&self) -> &str;

    /// Write `df` as parquet under `name`, replacing any existing blob.
    fn upload(&self, df: &mut DataFrame, name: &str) -> Result<()>;

    /// Whether a blob named `name` exists.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Read one blob.
    fn read_one(&self, name: &str) -> Result<DataFrame>;

    /// Names of all blobs, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Read every `.parquet` blob whose name contains `taxi_type` and stack
    /// them in name order.
    fn read_many(&self, taxi_type: &str) -> Result<DataFrame> {
        let names: Vec<String> = self
            .list()?
            .into_iter()
            .filter(|name| name.ends_with(PARQUET_SUFFIX) && name.contains(taxi_type))
            .collect();

        if names.is_empty() {
            return Err(DataError::NoMatchingBlobs {
                bucket: self.bucket().to_string(),
                taxi_type: taxi_type.to_string(),
            });
        }

        let frames = names
            .iter()
            .map(|name| self.read_one(name).map(IntoLazy::lazy))
            .collect::<Result<Vec<_>>>()?;

        let args = UnionArgs {
            to_supertypes: true,
            ..Default::default()
        };
        let df = concat(frames, args)?.collect()?;

        info!(
            bucket = self.bucket(),
            taxi_type,
            blobs = names.len(),
            rows = df.height(),
            "read raw blobs"
        );
        Ok(df)
    }
}

/// Bucket stored as `<root>/<bucket>/<name>`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    bucket: String,
    dir: PathBuf,
}

impl LocalBlobStore {
    /// Create a store for `bucket` under `root`. The directory is created on
    /// first upload.
    pub fn new(root: impl AsRef<Path>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let dir = root.as_ref().join(&bucket);
        Self { bucket, dir }
    }

    /// Directory holding the bucket's blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name.contains(['/', '\\'])
            || name == "."
            || name == "..";
        if invalid {
            return Err(DataError::InvalidBlobName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

impl BlobStore for LocalBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload(&self, df: &mut DataFrame, name: &str) -> Result<()> {
        let path = self.blob_path(name)?;
        fs::create_dir_all(&self.dir)?;

        // write beside the target, then rename into place
        let tmp = self.dir.join(format!(".{name}.partial"));
        let file = File::create(&tmp)?;
        ParquetWriter::new(file).finish(df)?;
        fs::rename(&tmp, &path)?;

        info!(
            bucket = %self.bucket,
            blob = name,
            rows = df.height(),
            "uploaded blob"
        );
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.blob_path(name)?.is_file())
    }

    fn read_one(&self, name: &str) -> Result<DataFrame> {
        let path = self.blob_path(name)?;
        if !path.is_file() {
            return Err(DataError::BlobNotFound {
                bucket: self.bucket.clone(),
                name: name.to_string(),
            });
        }

        let df = ParquetReader::new(File::open(&path)?).finish()?;
        debug!(bucket = %self.bucket, blob = name, rows = df.height(), "read blob");
        Ok(df)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && !name.starts_with('.')
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
