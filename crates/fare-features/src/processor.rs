//! Transformation plus train/test split.

use crate::config::FeatureConfig;
use crate::error::Result;
use crate::split::{SplitConfig, TrainTestSplit, train_test_split};
use crate::transformer::FeatureTransformer;
use polars::prelude::*;
use tracing::info;

/// Turns a raw trip table into train/test feature partitions
#[derive(Debug, Clone)]
pub struct DataProcessor {
    transformer: FeatureTransformer,
}

impl DataProcessor {
    /// Create a processor for the given feature selection.
    pub const fn new(config: FeatureConfig) -> Self {
        Self {
            transformer: FeatureTransformer::new(config),
        }
    }

    /// Create a processor around a preconfigured transformer.
    pub const fn with_transformer(transformer: FeatureTransformer) -> Self {
        Self { transformer }
    }

    /// Get the underlying transformer.
    pub const fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    /// Run the feature transformation.
    pub fn process_data(&self, raw: DataFrame) -> Result<DataFrame> {
        self.transformer.transform(raw)
    }

    /// Split a processed feature table.
    pub fn split_data(&self, features: &DataFrame, config: SplitConfig) -> Result<TrainTestSplit> {
        let split = train_test_split(features, config)?;
        info!(
            train_rows = split.train.height(),
            test_rows = split.test.height(),
            test_size = config.test_size,
            seed = config.seed,
            "split feature table"
        );
        Ok(split)
    }

    /// Transform then split.
    pub fn run(&self, raw: DataFrame, config: SplitConfig) -> Result<TrainTestSplit> {
        let features = self.process_data(raw)?;
        self.split_data(&features, config)
    }
}
