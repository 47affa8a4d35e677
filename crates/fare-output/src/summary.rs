//! Per-column dataset summaries.

use crate::report::ReportError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which columns to summarise and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDefinition {
    /// Columns summarised with moments and range
    pub numerical_columns: Vec<String>,
    /// Columns summarised with cardinality
    pub categorical_columns: Vec<String>,
}

impl DataDefinition {
    /// Create a data definition.
    pub const fn new(numerical_columns: Vec<String>, categorical_columns: Vec<String>) -> Self {
        Self {
            numerical_columns,
            categorical_columns,
        }
    }
}

/// Moments and range of a numerical column.
///
/// Statistics are `None` when the column has no non-null values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalSummary {
    /// Non-null values
    pub count: usize,
    /// Null values
    pub nulls: usize,
    /// Mean
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    /// Minimum
    pub min: Option<f64>,
    /// Maximum
    pub max: Option<f64>,
}

/// Cardinality of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    /// Non-null values
    pub count: usize,
    /// Null values
    pub nulls: usize,
    /// Distinct non-null values
    pub unique: usize,
    /// Most frequent value, ties broken by smallest value
    pub most_common: Option<String>,
}

/// Statistics of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    /// Numerical column
    Numerical(NumericalSummary),
    /// Categorical column
    Categorical(CategoricalSummary),
}

/// Summary of a named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Column name
    pub name: String,
    /// Column statistics
    pub stats: ColumnStats,
}

impl ColumnSummary {
    /// Numerical statistics, if the column is numerical.
    pub const fn numerical(&self) -> Option<&NumericalSummary> {
        match &self.stats {
            ColumnStats::Numerical(s) => Some(s),
            ColumnStats::Categorical(_) => None,
        }
    }

    /// Categorical statistics, if the column is categorical.
    pub const fn categorical(&self) -> Option<&CategoricalSummary> {
        match &self.stats {
            ColumnStats::Categorical(s) => Some(s),
            ColumnStats::Numerical(_) => None,
        }
    }
}

/// Summary of a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Row count
    pub rows: usize,
    /// Column summaries, numerical first, in definition order
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    /// Look up a column summary by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows, {} columns", self.rows, self.columns.len())
    }
}

/// Summarise the columns of `df` named in `definition`.
pub fn summarize(df: &DataFrame, definition: &DataDefinition) -> Result<DatasetSummary, ReportError> {
    let mut columns = Vec::new();

    for name in &definition.numerical_columns {
        columns.push(ColumnSummary {
            name: name.clone(),
            stats: ColumnStats::Numerical(numerical(df, name)?),
        });
    }
    for name in &definition.categorical_columns {
        columns.push(ColumnSummary {
            name: name.clone(),
            stats: ColumnStats::Categorical(categorical(df, name)?),
        });
    }

    Ok(DatasetSummary {
        rows: df.height(),
        columns,
    })
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, ReportError> {
    df.column(name)
        .map(Column::as_materialized_series)
        .map_err(|_| ReportError::MissingColumn(name.to_string()))
}

fn numerical(df: &DataFrame, name: &str) -> Result<NumericalSummary, ReportError> {
    let values = series(df, name)?.cast(&DataType::Float64)?;
    let values = values.f64()?;
    let nulls = values.null_count();

    Ok(NumericalSummary {
        count: values.len() - nulls,
        nulls,
        mean: values.mean(),
        std: values.std(1),
        min: values.min(),
        max: values.max(),
    })
}

fn categorical(df: &DataFrame, name: &str) -> Result<CategoricalSummary, ReportError> {
    let values = series(df, name)?.cast(&DataType::String)?;
    let values = values.str()?;
    let nulls = values.null_count();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values.into_iter().flatten() {
        *counts.entry(v).or_default() += 1;
    }
    let most_common = counts
        .iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
        .map(|(v, _)| (*v).to_string());

    Ok(CategoricalSummary {
        count: values.len() - nulls,
        nulls,
        unique: counts.len(),
        most_common,
    })
}
