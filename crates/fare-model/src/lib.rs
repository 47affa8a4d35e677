#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/farepipe/fare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod linalg;
pub mod metrics;
pub mod pipeline;
pub mod preprocessing;
pub mod registry;
pub mod regression;
pub mod trainer;

pub use error::{ModelError, Result};
pub use metrics::{RegressionMetrics, mean_absolute_error, r2_score, root_mean_squared_error};
pub use pipeline::{FarePipeline, FeatureValue, Record};
pub use preprocessing::{OneHotEncoder, StandardScaler};
pub use registry::{ModelVersion, RunInfo, RunInput, RunStatus, TrackingStore};
pub use regression::LinearRegression;
pub use trainer::{
    ARTIFACT_PATH, LATEST_ALIAS, ModelTrainer, Tags, TrainOutcome, TrainerConfig,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
