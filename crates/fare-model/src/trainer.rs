//! Fit, score, log and register a fare model.

use crate::error::{ModelError, Result};
use crate::metrics::RegressionMetrics;
use crate::pipeline::FarePipeline;
use crate::preprocessing::numeric_column;
use crate::registry::{ModelVersion, RunInput, RunStatus, TrackingStore};
use fare_features::FeatureConfig;
use fare_features::columns::VENDOR_ID;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Artifact path of the serialised pipeline within a run.
pub const ARTIFACT_PATH: &str = "linear-reg-pipe";

/// Alias moved to every newly registered version.
pub const LATEST_ALIAS: &str = "latest-model";

const MODEL_TYPE: &str = "Linear Regression with preprocessing";

/// Source-control metadata attached to runs and model versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    /// Commit the model was trained from
    pub git_sha: String,
    /// Branch the model was trained from
    pub branch: String,
}

impl Tags {
    /// Create tags.
    pub fn new(git_sha: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            git_sha: git_sha.into(),
            branch: branch.into(),
        }
    }

    /// Tags as a key/value map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("git_sha".to_string(), self.git_sha.clone()),
            ("branch".to_string(), self.branch.clone()),
        ])
    }
}

/// What the trainer needs from the project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Input and target columns
    pub features: FeatureConfig,
    /// Experiment runs are recorded under
    pub experiment_name: String,
    /// Name of the training blob, logged as the run input
    pub train_file_name: String,
}

impl TrainerConfig {
    /// Registered model name, `{experiment}.taxi_fare_model`.
    pub fn model_name(&self) -> String {
        format!("{}.taxi_fare_model", self.experiment_name)
    }
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    /// Tracking run id
    pub run_id: String,
    /// Test-set scores
    pub metrics: RegressionMetrics,
}

#[derive(Debug)]
struct Prepared {
    x_train: DataFrame,
    y_train: Vec<f64>,
    x_test: DataFrame,
    y_test: Vec<f64>,
}

/// Trains a [`FarePipeline`] on a train/test split and records the run.
#[derive(Debug)]
pub struct ModelTrainer {
    train_set: DataFrame,
    test_set: DataFrame,
    config: TrainerConfig,
    tags: Tags,
    prepared: Option<Prepared>,
    pipeline: Option<FarePipeline>,
    run_id: Option<String>,
}

impl ModelTrainer {
    /// Create a trainer over processed train and test partitions.
    pub const fn new(
        train_set: DataFrame,
        test_set: DataFrame,
        config: TrainerConfig,
        tags: Tags,
    ) -> Self {
        Self {
            train_set,
            test_set,
            config,
            tags,
            prepared: None,
            pipeline: None,
            run_id: None,
        }
    }

    /// Run id of the last training run.
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Pipeline fitted by the last training run.
    pub const fn pipeline(&self) -> Option<&FarePipeline> {
        self.pipeline.as_ref()
    }

    /// Shapes `(rows, columns)` of X_train and X_test once prepared.
    pub fn prepared_shapes(&self) -> Option<((usize, usize), (usize, usize))> {
        self.prepared
            .as_ref()
            .map(|p| (p.x_train.shape(), p.x_test.shape()))
    }

    /// Cast `vendor_id` to string and split both partitions into inputs and
    /// target.
    pub fn prepare(&mut self) -> Result<()> {
        let target = self.target_column()?.to_string();
        let inputs: Vec<&str> = self.config.features.input_columns();

        let (x_train, y_train) = split_xy(&self.train_set, &inputs, &target)?;
        let (x_test, y_test) = split_xy(&self.test_set, &inputs, &target)?;

        info!(
            x_train = ?x_train.shape(),
            y_train = y_train.len(),
            x_test = ?x_test.shape(),
            y_test = y_test.len(),
            "prepared training data"
        );

        self.prepared = Some(Prepared {
            x_train,
            y_train,
            x_test,
            y_test,
        });
        Ok(())
    }

    fn target_column(&self) -> Result<&str> {
        match self.config.features.target.as_slice() {
            [target] => Ok(target.as_str()),
            other => Err(ModelError::InvalidState(format!(
                "expected exactly one target column, got {}",
                other.len()
            ))),
        }
    }

    /// Fit on the train partition, score on the test partition and record a
    /// run with params, metrics, the training input and the model artifact.
    ///
    /// Prepares the data first if [`ModelTrainer::prepare`] has not run. A
    /// failure after the run is created marks it `Failed`.
    pub fn train(&mut self, store: &TrackingStore) -> Result<TrainOutcome> {
        if self.prepared.is_none() {
            self.prepare()?;
        }

        let run_id = store.create_run(&self.config.experiment_name, &self.tags.to_map())?;
        match self.fit_and_log(store, &run_id) {
            Ok((pipeline, metrics)) => {
                store.end_run(&run_id, RunStatus::Finished)?;
                info!(
                    run_id = %run_id,
                    rmse = metrics.rmse,
                    mae = metrics.mae,
                    r2_score = metrics.r2_score,
                    "training run finished"
                );
                self.pipeline = Some(pipeline);
                self.run_id = Some(run_id.clone());
                Ok(TrainOutcome { run_id, metrics })
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "training run failed");
                store.end_run(&run_id, RunStatus::Failed)?;
                Err(err)
            }
        }
    }

    fn fit_and_log(
        &self,
        store: &TrackingStore,
        run_id: &str,
    ) -> Result<(FarePipeline, RegressionMetrics)> {
        let data = self
            .prepared
            .as_ref()
            .ok_or_else(|| ModelError::InvalidState("training data not prepared".into()))?;

        let mut pipeline = FarePipeline::from_feature_config(&self.config.features);
        pipeline.fit(&data.x_train, &data.y_train)?;
        let y_pred = pipeline.predict(&data.x_test)?;
        let metrics = RegressionMetrics::evaluate(&data.y_test, &y_pred)?;

        store.log_param(run_id, "model_type", MODEL_TYPE)?;
        store.log_param(
            run_id,
            "num_features",
            &self.config.features.num_features.join(","),
        )?;
        store.log_param(
            run_id,
            "cat_features",
            &self.config.features.cat_features.join(","),
        )?;
        for (name, value) in metrics.as_pairs() {
            store.log_metric(run_id, name, value)?;
        }
        store.log_input(
            run_id,
            &RunInput {
                name: self.config.train_file_name.clone(),
                context: "training".to_string(),
                rows: self.train_set.height() as u64,
            },
        )?;
        store.log_artifact(run_id, ARTIFACT_PATH, pipeline.to_json()?.as_bytes())?;

        Ok((pipeline, metrics))
    }

    /// Register the last run's pipeline as a new version of
    /// `{experiment}.taxi_fare_model` and point `latest-model` at it.
    pub fn register_model(&self, store: &TrackingStore) -> Result<ModelVersion> {
        let run_id = self
            .run_id
            .as_deref()
            .ok_or_else(|| ModelError::InvalidState("no training run to register".into()))?;

        let version = store.register_model(
            &self.config.model_name(),
            run_id,
            ARTIFACT_PATH,
            &self.tags.to_map(),
        )?;
        store.set_alias(&version.name, LATEST_ALIAS, version.version)?;
        Ok(version)
    }
}

fn split_xy(df: &DataFrame, inputs: &[&str], target: &str) -> Result<(DataFrame, Vec<f64>)> {
    for name in inputs.iter().copied().chain([target]) {
        if df.column(name).is_err() {
            return Err(ModelError::MissingColumn(name.to_string()));
        }
    }

    let mut x = df.select(inputs.iter().copied())?;
    if x.column(VENDOR_ID).is_ok() {
        let vendor = x
            .column(VENDOR_ID)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        x.with_column(vendor)?;
    }

    Ok((x, numeric_column(df, target)?))
}
