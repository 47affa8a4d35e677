//! Monthly trip files from the NYC TLC public bucket.

use crate::error::{DataError, Result};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use polars::prelude::*;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

/// Public TLC trip-data endpoint.
pub const DEFAULT_BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data/";

/// Monthly files run to tens of megabytes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const USER_AGENT: &str = concat!("fare-pipeline/", env!("CARGO_PKG_VERSION"));

/// Downloads `{taxi_type}_tripdata_{year}-{month}.parquet` files.
#[derive(Debug, Clone)]
pub struct NycTaxiFetcher {
    client: reqwest::Client,
    taxi_type: String,
    base_url: String,
}

impl NycTaxiFetcher {
    /// Create a fetcher for a taxi type ("green", "yellow", ...).
    pub fn new(taxi_type: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            taxi_type: taxi_type.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the fetcher at a different host, e.g. a mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Taxi type this fetcher downloads.
    pub fn taxi_type(&self) -> &str {
        &self.taxi_type
    }

    /// File name for a month, e.g. `green_tripdata_2024-02.parquet`.
    pub fn file_name(&self, year: i32, month: u32) -> String {
        format!("{}_tripdata_{year}-{month:02}.parquet", self.taxi_type)
    }

    /// Full download URL for a month.
    pub fn url(&self, year: i32, month: u32) -> String {
        format!("{}{}", self.base_url, self.file_name(year, month))
    }

    /// Download and decode one month of trips.
    ///
    /// # Errors
    /// Returns `DataError::InvalidMonth` for a month outside 1..=12,
    /// `DataError::Http` for a non-success status (files for recent months
    /// are published with a delay, so 403/404 is common), and
    /// `DataError::Polars` if the body is not valid parquet.
    pub async fn fetch(&self, year: i32, month: u32) -> Result<DataFrame> {
        if !(1..=12).contains(&month) {
            return Err(DataError::InvalidMonth(month));
        }

        let url = self.url(year, month);
        debug!(%url, "requesting trip file");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let df = ParquetReader::new(Cursor::new(body.to_vec())).finish()?;

        info!(
            %url,
            rows = df.height(),
            columns = df.width(),
            "fetched trip file"
        );
        Ok(df)
    }
}

/// Year and month of the date `days` days before `today`.
///
/// The monthly load uses 90 days: TLC publishes each month with roughly a
/// two-month lag.
pub fn months_ago(today: NaiveDate, days: i64) -> (i32, u32) {
    let then = today - ChronoDuration::days(days);
    (then.year(), then.month())
}
