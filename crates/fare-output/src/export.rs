//! Export of data summary reports to files.

use crate::report::DataSummaryReport;
use crate::summary::{ColumnStats, DatasetSummary};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One CSV row per dataset and column.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,

    /// Markdown tables.
    Markdown,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
            Self::Markdown => "md",
        }
    }

    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            Some("md") => Ok(Self::Markdown),
            other => Err(ExportError::InvalidFormat(format!(
                "unsupported extension {other:?} for {}",
                path.display()
            ))),
        }
    }
}

/// Trait for exporting data to various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Flat CSV row of a column summary.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    dataset: &'a str,
    column: &'a str,
    kind: &'a str,
    count: usize,
    nulls: usize,
    mean: Option<f64>,
    std: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    unique: Option<usize>,
    most_common: Option<&'a str>,
}

fn rows<'a>(dataset: &'a str, summary: &'a DatasetSummary) -> impl Iterator<Item = SummaryRow<'a>> {
    summary.columns.iter().map(move |c| match &c.stats {
        ColumnStats::Numerical(s) => SummaryRow {
            dataset,
            column: &c.name,
            kind: "numerical",
            count: s.count,
            nulls: s.nulls,
            mean: s.mean,
            std: s.std,
            min: s.min,
            max: s.max,
            unique: None,
            most_common: None,
        },
        ColumnStats::Categorical(s) => SummaryRow {
            dataset,
            column: &c.name,
            kind: "categorical",
            count: s.count,
            nulls: s.nulls,
            mean: None,
            std: None,
            min: None,
            max: None,
            unique: Some(s.unique),
            most_common: s.most_common.as_deref(),
        },
    })
}

impl Exporter for DataSummaryReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for row in rows("reference", &self.reference).chain(rows("current", &self.current))
                {
                    wtr.serialize(row)?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Markdown => Ok(self.to_markdown()),
        }
    }
}
