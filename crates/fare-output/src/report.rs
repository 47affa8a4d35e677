//! Reference-versus-current data summary report.

use crate::summary::{DataDefinition, DatasetSummary, summarize};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Column named in the data definition is absent.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Change of a numerical column's mean between reference and current data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanShift {
    /// Column name
    pub column: String,
    /// Mean in the reference table
    pub reference_mean: f64,
    /// Mean in the current table
    pub current_mean: f64,
    /// `current_mean - reference_mean`
    pub shift: f64,
    /// Shift in units of the reference standard deviation, when defined
    pub shift_in_std: Option<f64>,
}

/// Summary of a reference and a current table with per-column mean shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummaryReport {
    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Columns covered by the report.
    pub definition: DataDefinition,

    /// Summary of the reference table.
    pub reference: DatasetSummary,

    /// Summary of the current table.
    pub current: DatasetSummary,

    /// Mean shift of every numerical column with data on both sides.
    pub mean_shifts: Vec<MeanShift>,
}

impl DataSummaryReport {
    /// Summarise both tables and compare their numerical means.
    pub fn build(
        reference: &DataFrame,
        current: &DataFrame,
        definition: &DataDefinition,
    ) -> Result<Self, ReportError> {
        let reference = summarize(reference, definition)?;
        let current = summarize(current, definition)?;

        let mean_shifts = definition
            .numerical_columns
            .iter()
            .filter_map(|name| {
                let r = reference.column(name)?.numerical()?;
                let c = current.column(name)?.numerical()?;
                let (reference_mean, current_mean) = (r.mean?, c.mean?);
                let shift = current_mean - reference_mean;
                let shift_in_std = r.std.filter(|s| *s > 0.0).map(|s| shift / s);
                Some(MeanShift {
                    column: name.clone(),
                    reference_mean,
                    current_mean,
                    shift,
                    shift_in_std,
                })
            })
            .collect();

        Ok(Self {
            generated_at: Utc::now(),
            definition: definition.clone(),
            reference,
            current,
            mean_shifts,
        })
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report as Markdown tables.
    pub fn to_markdown(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DataSummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Data summary\n")?;
        writeln!(f, "Generated {}\n", self.generated_at.to_rfc3339())?;
        writeln!(
            f,
            "| | reference | current |\n|---|---|---|\n| rows | {} | {} |\n",
            self.reference.rows, self.current.rows
        )?;

        writeln!(f, "## Numerical columns\n")?;
        writeln!(
            f,
            "| column | dataset | count | nulls | mean | std | min | max |\n\
             |---|---|---|---|---|---|---|---|"
        )?;
        for name in &self.definition.numerical_columns {
            for (label, summary) in [("reference", &self.reference), ("current", &self.current)] {
                if let Some(s) = summary.column(name).and_then(|c| c.numerical()) {
                    writeln!(
                        f,
                        "| {name} | {label} | {} | {} | {} | {} | {} | {} |",
                        s.count,
                        s.nulls,
                        fmt_opt(s.mean),
                        fmt_opt(s.std),
                        fmt_opt(s.min),
                        fmt_opt(s.max)
                    )?;
                }
            }
        }

        if !self.definition.categorical_columns.is_empty() {
            writeln!(f, "\n## Categorical columns\n")?;
            writeln!(
                f,
                "| column | dataset | count | nulls | unique | most common |\n\
                 |---|---|---|---|---|---|"
            )?;
            for name in &self.definition.categorical_columns {
                for (label, summary) in [("reference", &self.reference), ("current", &self.current)]
                {
                    if let Some(s) = summary.column(name).and_then(|c| c.categorical()) {
                        writeln!(
                            f,
                            "| {name} | {label} | {} | {} | {} | {} |",
                            s.count,
                            s.nulls,
                            s.unique,
                            s.most_common.as_deref().unwrap_or("-")
                        )?;
                    }
                }
            }
        }

        writeln!(f, "\n## Mean shift\n")?;
        writeln!(
            f,
            "| column | reference | current | shift | shift / std |\n|---|---|---|---|---|"
        )?;
        for m in &self.mean_shifts {
            writeln!(
                f,
                "| {} | {:.4} | {:.4} | {:+.4} | {} |",
                m.column,
                m.reference_mean,
                m.current_mean,
                m.shift,
                fmt_opt(m.shift_in_std)
            )?;
        }

        Ok(())
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}
