//! Common interface of the transformation steps.

use crate::error::{FeatureError, Result};
use polars::prelude::*;

/// A single stage of the raw-to-feature transformation.
///
/// Steps take and return a [`LazyFrame`] so the transformer can chain them
/// into one query plan.
pub trait FeatureStep {
    /// Step name used in logs.
    fn name(&self) -> &str;

    /// Columns the step reads.
    fn required_columns(&self) -> Vec<&str>;

    /// Apply the step.
    fn apply(&self, data: LazyFrame) -> Result<LazyFrame>;
}

/// Fail with [`FeatureError::MissingColumn`] for the first required column
/// absent from `schema`.
pub fn ensure_columns<'a>(
    schema: &Schema,
    required: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for column in required {
        if schema.get(column).is_none() {
            return Err(FeatureError::missing_column(column));
        }
    }
    Ok(())
}
