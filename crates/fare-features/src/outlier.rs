//! IQR-based upper-tail clipping.
//!
//! Negative values are floored at zero, then anything above
//! `Q3 + k * (Q3 - Q1)` is replaced by that threshold. Quartiles use linear
//! interpolation.
//!
//! Only the first column of the list is clipped. Callers that need several
//! columns clipped invoke the imputer once per column, which is what the
//! transformer does for `fare_amount` and `duration`.

use crate::error::{FeatureError, Result};
use crate::step::FeatureStep;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the outlier imputer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierImputerConfig {
    /// Candidate columns; only the first one is clipped
    pub columns: Vec<String>,
    /// IQR multiplier `k` (default: 6)
    pub iqr_factor: f64,
}

impl Default for OutlierImputerConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            iqr_factor: 6.0,
        }
    }
}

/// Clips the upper tail of a numeric column
#[derive(Debug, Clone)]
pub struct OutlierImputer {
    config: OutlierImputerConfig,
}

impl OutlierImputer {
    /// Create an imputer from its configuration.
    pub const fn with_config(config: OutlierImputerConfig) -> Self {
        Self { config }
    }

    /// Imputer for a single column.
    pub fn for_column(column: &str, iqr_factor: f64) -> Self {
        Self::with_config(OutlierImputerConfig {
            columns: vec![column.to_string()],
            iqr_factor,
        })
    }

    /// Get the configuration.
    pub const fn config(&self) -> &OutlierImputerConfig {
        &self.config
    }
}

impl FeatureStep for OutlierImputer {
    fn name(&self) -> &str {
        "outlier_imputer"
    }

    fn required_columns(&self) -> Vec<&str> {
        self.config.columns.first().map(String::as_str).into_iter().collect()
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        let columns: Vec<&str> = self.config.columns.iter().map(String::as_str).collect();
        outlier_imputer(data, &columns, self.config.iqr_factor)
    }
}

/// Clip negatives to zero and the upper tail to `Q3 + iqr_factor * IQR`.
///
/// Only `columns[0]` is touched; an empty list returns `data` unchanged.
/// The clipped column becomes `Float64` whenever the threshold is applied.
pub fn outlier_imputer(data: LazyFrame, columns: &[&str], iqr_factor: f64) -> Result<LazyFrame> {
    if !(iqr_factor >= 0.0 && iqr_factor.is_finite()) {
        return Err(FeatureError::InvalidParameter(format!(
            "IQR factor must be a finite non-negative number, got {iqr_factor}"
        )));
    }

    let Some(&column) = columns.first() else {
        return Ok(data);
    };

    let q1 = col(column).quantile(lit(0.25), QuantileMethod::Linear);
    let q3 = col(column).quantile(lit(0.75), QuantileMethod::Linear);
    let upper = q3.clone() + lit(iqr_factor) * (q3 - q1);

    let clipped = data
        .with_column(
            when(col(column).lt(lit(0)))
                .then(lit(0))
                .otherwise(col(column))
                .alias(column),
        )
        // Quartiles are taken after the zero floor
        .with_column(
            when(col(column).gt(upper.clone()))
                .then(upper)
                .otherwise(col(column))
                .cast(DataType::Float64)
                .alias(column),
        );

    Ok(clipped)
}
