//! Column preprocessing: standard scaling and one-hot encoding.

use crate::error::{ModelError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Scale below which a column counts as constant.
const CONSTANT_SCALE: f64 = 10.0 * f64::EPSILON;

/// Centres numeric columns and scales them to unit population variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Scaled columns, in output order
    pub columns: Vec<String>,
    /// Per-column mean
    pub means: Vec<f64>,
    /// Per-column population standard deviation, 1.0 for constant columns
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn means and scales of `columns`.
    pub fn fit(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());

        for name in columns {
            let values = numeric_column(df, name)?;
            let n = values.len() as f64;
            let mean = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / n
            };
            let var = if values.is_empty() {
                0.0
            } else {
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
            };
            let std = var.sqrt();

            means.push(mean);
            scales.push(if std < CONSTANT_SCALE { 1.0 } else { std });
        }

        Ok(Self {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }

    /// Number of output columns.
    pub fn n_outputs(&self) -> usize {
        self.columns.len()
    }

    /// Scale the fitted columns of `df` into a `rows x columns` matrix.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((df.height(), self.n_outputs()));
        for (j, name) in self.columns.iter().enumerate() {
            let values = numeric_column(df, name)?;
            for (i, v) in values.into_iter().enumerate() {
                out[[i, j]] = (v - self.means[j]) / self.scales[j];
            }
        }
        Ok(out)
    }

    /// Scale one row given in column order.
    pub fn transform_row(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.n_outputs() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_outputs(),
                actual: values.len(),
            });
        }
        Ok(values
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect())
    }
}

/// One indicator column per category seen at fit time.
///
/// Categories are compared as strings. A value not seen during fitting, or a
/// null, encodes as all zeros for that column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Encoded columns, in output order
    pub columns: Vec<String>,
    /// Sorted categories of each column
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Learn the categories of `columns`.
    pub fn fit(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let mut categories = Vec::with_capacity(columns.len());
        for name in columns {
            let seen: BTreeSet<String> = string_column(df, name)?.into_iter().flatten().collect();
            categories.push(seen.into_iter().collect());
        }

        Ok(Self {
            columns: columns.to_vec(),
            categories,
        })
    }

    /// Number of output columns.
    pub fn n_outputs(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Output column names, `{column}_{category}`.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{name}_{c}")))
            .collect()
    }

    /// Encode the fitted columns of `df`.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((df.height(), self.n_outputs()));
        let mut offset = 0;
        for (name, cats) in self.columns.iter().zip(&self.categories) {
            for (i, value) in string_column(df, name)?.into_iter().enumerate() {
                if let Some(k) = value.and_then(|v| cats.binary_search(&v).ok()) {
                    out[[i, offset + k]] = 1.0;
                }
            }
            offset += cats.len();
        }
        Ok(out)
    }

    /// Encode one row given in column order.
    pub fn transform_row(&self, values: &[Option<String>]) -> Result<Vec<f64>> {
        if values.len() != self.columns.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        let mut out = vec![0.0; self.n_outputs()];
        let mut offset = 0;
        for (value, cats) in values.iter().zip(&self.categories) {
            if let Some(k) = value.as_ref().and_then(|v| cats.binary_search(v).ok()) {
                out[offset + k] = 1.0;
            }
            offset += cats.len();
        }
        Ok(out)
    }
}

/// Read a numeric column as `f64`, rejecting nulls and non-numeric dtypes.
pub(crate) fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| ModelError::MissingColumn(name.to_string()))?;

    let dtype = column.dtype();
    if !(dtype.is_integer() || dtype.is_float() || matches!(dtype, DataType::Boolean)) {
        return Err(ModelError::NonNumeric {
            column: name.to_string(),
            reason: format!("dtype {dtype}"),
        });
    }

    let values = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = values.f64()?;
    if values.null_count() > 0 {
        return Err(ModelError::NonNumeric {
            column: name.to_string(),
            reason: format!("{} null values", values.null_count()),
        });
    }
    Ok(values.into_no_null_iter().collect())
}

/// Read any column as optional strings.
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| ModelError::MissingColumn(name.to_string()))?;

    let values = column.as_materialized_series().cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
