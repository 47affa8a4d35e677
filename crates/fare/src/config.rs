//! Project configuration loaded from YAML.

use crate::error::{ConfigError, Result};
use fare_data::SchemaField;
use fare_features::FeatureConfig;
use fare_model::TrainerConfig;
use fare_output::DataDefinition;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Buckets, source months, schema and feature lists for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Bucket holding the raw monthly files
    #[serde(alias = "gcs_raw_data_bucket_name")]
    pub raw_data_bucket: String,
    /// Bucket holding the train and test sets
    #[serde(alias = "gcs_processed_taxi_data_bucket_name")]
    pub processed_data_bucket: String,
    /// Years to load
    pub taxi_data_years: Vec<i32>,
    /// Months to load, 1 to 12
    pub taxi_data_months: Vec<u32>,
    /// `green`, `yellow`, ...
    pub taxi_type: String,
    /// Expected columns of a raw monthly file
    #[serde(alias = "green_taxi_raw_schema")]
    pub raw_schema: Vec<SchemaField>,
    /// Numeric model inputs
    pub num_features: Vec<String>,
    /// Categorical model inputs
    #[serde(default)]
    pub cat_features: Vec<String>,
    /// Target columns
    pub target: Vec<String>,
    /// Train set blob name
    pub train_file_name: String,
    /// Test set blob name
    pub test_file_name: String,
    /// Tracking experiment
    pub experiment_name: String,
}

impl ProjectConfig {
    /// Load and validate a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialise back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if let Some(month) = self.taxi_data_months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ConfigError::Invalid(format!(
                "taxi_data_months contains {month}, expected 1 to 12"
            )));
        }
        if self.target.is_empty() {
            return Err(ConfigError::Invalid("target is empty".into()));
        }
        if self.taxi_type.is_empty() {
            return Err(ConfigError::Invalid("taxi_type is empty".into()));
        }
        Ok(())
    }

    /// Column names injected into the feature transformer.
    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig::new(
            self.num_features.clone(),
            self.cat_features.clone(),
            self.target.clone(),
        )
    }

    /// What the trainer needs.
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            features: self.feature_config(),
            experiment_name: self.experiment_name.clone(),
            train_file_name: self.train_file_name.clone(),
        }
    }

    /// Numeric features plus target as numerical, categorical features as
    /// categorical.
    pub fn data_definition(&self) -> DataDefinition {
        let numerical = self
            .num_features
            .iter()
            .chain(&self.target)
            .cloned()
            .collect();
        DataDefinition::new(numerical, self.cat_features.clone())
    }

    /// Registered model name.
    pub fn model_name(&self) -> String {
        self.trainer_config().model_name()
    }

    /// Every (year, month) pair to load, years outermost.
    pub fn months(&self) -> Vec<(i32, u32)> {
        self.taxi_data_years
            .iter()
            .flat_map(|&year| self.taxi_data_months.iter().map(move |&month| (year, month)))
            .collect()
    }
}
