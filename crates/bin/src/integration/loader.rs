//! Download monthly trip files into the raw bucket.

use fare_data::{BlobStore, DataError, NycTaxiFetcher, SchemaField, validate_schema};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{info, warn};

/// Default number of concurrent downloads.
pub(crate) const DEFAULT_CONCURRENCY: usize = 4;

/// What happened to each requested month.
#[derive(Debug, Default)]
pub(crate) struct LoadSummary {
    /// Blobs written
    pub uploaded: Vec<String>,
    /// Blobs already present
    pub skipped: Vec<String>,
    /// Months that failed with their error
    pub failed: Vec<(String, DataError)>,
}

impl LoadSummary {
    pub(crate) fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Outcome {
    Uploaded(String),
    Failed(String, DataError),
}

/// Fetch every month missing from `store`, validate it against `schema`
/// when one is given and upload it under its canonical file name.
///
/// Failures are collected rather than aborting the remaining months.
pub(crate) async fn load_months<S: BlobStore + Sync>(
    fetcher: &NycTaxiFetcher,
    store: &S,
    months: &[(i32, u32)],
    schema: &[SchemaField],
    progress: Option<&ProgressBar>,
) -> LoadSummary {
    let mut summary = LoadSummary::default();
    let mut pending = Vec::new();

    for &(year, month) in months {
        let name = fetcher.file_name(year, month);
        match store.exists(&name) {
            Ok(true) => {
                info!(blob = %name, bucket = store.bucket(), "already in bucket, skipping");
                summary.skipped.push(name);
            }
            Ok(false) => pending.push((year, month, name)),
            Err(e) => summary.failed.push((name, e)),
        }
    }

    if let Some(pb) = progress {
        pb.set_length(months.len() as u64);
        pb.set_position((summary.skipped.len() + summary.failed.len()) as u64);
        pb.set_message(format!(
            "Fetching {} files ({} concurrent)...",
            pending.len(),
            DEFAULT_CONCURRENCY
        ));
    }

    let outcomes: Vec<Outcome> = stream::iter(pending)
        .map(|(year, month, name)| async move {
            match fetch_and_store(fetcher, store, year, month, &name, schema).await {
                Ok(()) => Outcome::Uploaded(name),
                Err(e) => Outcome::Failed(name, e),
            }
        })
        .buffer_unordered(DEFAULT_CONCURRENCY)
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    for outcome in outcomes {
        match outcome {
            Outcome::Uploaded(name) => summary.uploaded.push(name),
            Outcome::Failed(name, e) => {
                warn!(blob = %name, error = %e, "failed to load month");
                summary.failed.push((name, e));
            }
        }
    }

    summary.uploaded.sort();
    summary
}

async fn fetch_and_store<S: BlobStore>(
    fetcher: &NycTaxiFetcher,
    store: &S,
    year: i32,
    month: u32,
    name: &str,
    schema: &[SchemaField],
) -> Result<(), DataError> {
    let mut df = fetcher.fetch(year, month).await?;
    if !schema.is_empty() {
        validate_schema(&df, schema)?;
    }
    store.upload(&mut df, name)
}
