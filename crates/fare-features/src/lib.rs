#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/farepipe/fare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod columns;
pub mod config;
pub mod error;
pub mod outlier;
pub mod processor;
pub mod rush_hour;
pub mod split;
pub mod step;
pub mod transformer;

pub use config::FeatureConfig;
pub use error::{FeatureError, Result};
pub use outlier::{OutlierImputer, OutlierImputerConfig, outlier_imputer};
pub use processor::DataProcessor;
pub use rush_hour::{RushHourFlag, is_rush_hour, rush_hourizer};
pub use split::{SplitConfig, TrainTestSplit, train_test_split};
pub use step::FeatureStep;
pub use transformer::FeatureTransformer;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
