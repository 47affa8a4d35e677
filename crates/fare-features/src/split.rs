//! Seeded random train/test split.
//!
//! Rows are shuffled with a seeded RNG; the first `ceil(test_size * n)`
//! shuffled rows form the test partition and the rest the training
//! partition. There is no stratification and no time ordering, so pickups
//! from the same period can land on both sides.

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Split parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows assigned to the test partition (default: 0.2)
    pub test_size: f64,
    /// RNG seed (default: 42)
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Disjoint train and test partitions of one feature table
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Training rows
    pub train: DataFrame,
    /// Held-out rows
    pub test: DataFrame,
}

impl TrainTestSplit {
    /// Total number of rows across both partitions.
    pub fn total_rows(&self) -> usize {
        self.train.height() + self.test.height()
    }
}

/// Split `df` into train/test partitions.
///
/// An empty table yields two empty partitions with the input schema.
pub fn train_test_split(df: &DataFrame, config: SplitConfig) -> Result<TrainTestSplit> {
    let SplitConfig { test_size, seed } = config;
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(FeatureError::InvalidSplit(test_size));
    }

    let n_rows = df.height();
    let n_test = (test_size * n_rows as f64).ceil() as usize;

    let mut indices: Vec<IdxSize> = (0..n_rows as IdxSize).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test.min(n_rows));
    let test = df.take(&IdxCa::from_vec("idx".into(), test_idx.to_vec()))?;
    let train = df.take(&IdxCa::from_vec("idx".into(), train_idx.to_vec()))?;

    Ok(TrainTestSplit { train, test })
}
