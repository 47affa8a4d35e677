//! Integration tests for training, registration and model loading

use approx::assert_abs_diff_eq;
use fare_features::FeatureConfig;
use fare_model::{
    ARTIFACT_PATH, FeatureValue, LATEST_ALIAS, ModelTrainer, Record, RunStatus, Tags,
    TrackingStore, TrainerConfig,
};
use polars::prelude::*;
use rstest::{fixture, rstest};

#[fixture]
fn config() -> TrainerConfig {
    TrainerConfig {
        features: FeatureConfig::new(
            vec!["mean_distance".into(), "rush_hour".into()],
            vec!["vendor_id".into()],
            vec!["fare_amount".into()],
        ),
        experiment_name: "green-taxi".into(),
        train_file_name: "green_taxi_train_set.parquet".into(),
    }
}

/// fare = 2.5 * distance + 1.5 * rush_hour + 4, plus 0.5 for vendor 2
fn fares(distance: &[f64], rush: &[i64], vendor: &[i64]) -> DataFrame {
    let fare: Vec<f64> = distance
        .iter()
        .zip(rush)
        .zip(vendor)
        .map(|((d, r), v)| 2.5 * d + 1.5 * *r as f64 + 4.0 + if *v == 2 { 0.5 } else { 0.0 })
        .collect();
    df!(
        "mean_distance" => distance,
        "rush_hour" => rush,
        "vendor_id" => vendor,
        "fare_amount" => fare,
    )
    .unwrap()
}

#[fixture]
fn train_set() -> DataFrame {
    fares(
        &[1.0, 2.0, 3.5, 0.8, 5.0, 2.2, 7.1, 3.3],
        &[0, 1, 0, 1, 0, 0, 1, 1],
        &[1, 2, 2, 1, 1, 2, 1, 2],
    )
}

#[fixture]
fn test_set() -> DataFrame {
    fares(&[1.5, 4.0, 6.0], &[1, 0, 1], &[2, 1, 1])
}

#[rstest]
fn test_train_logs_run(config: TrainerConfig, train_set: DataFrame, test_set: DataFrame) {
    let store = TrackingStore::in_memory().unwrap();
    let mut trainer = ModelTrainer::new(train_set, test_set, config, Tags::new("abc123", "main"));

    trainer.prepare().unwrap();
    let outcome = trainer.train(&store).unwrap();

    assert_abs_diff_eq!(outcome.metrics.rmse, 0.0, epsilon = 1e-8);
    assert_abs_diff_eq!(outcome.metrics.r2_score, 1.0, epsilon = 1e-8);

    let run = store.get_run(&outcome.run_id).unwrap();
    assert_eq!(run.experiment, "green-taxi");
    assert_eq!(run.status, RunStatus::Finished);
    assert_eq!(run.tags["git_sha"], "abc123");
    assert_eq!(run.tags["branch"], "main");
    assert_eq!(run.params["model_type"], "Linear Regression with preprocessing");
    for metric in ["rmse", "mae", "r2_score"] {
        assert!(run.metrics.contains_key(metric));
    }
    assert_eq!(run.inputs[0].name, "green_taxi_train_set.parquet");
    assert_eq!(run.inputs[0].context, "training");
    assert_eq!(run.inputs[0].rows, 8);
    assert!(store.read_artifact(&outcome.run_id, ARTIFACT_PATH).is_ok());
}

#[rstest]
fn test_register_and_load_latest(config: TrainerConfig, train_set: DataFrame, test_set: DataFrame) {
    let store = TrackingStore::in_memory().unwrap();
    let tags = Tags::new("abc123", "main");

    let mut first = ModelTrainer::new(
        train_set.clone(),
        test_set.clone(),
        config.clone(),
        tags.clone(),
    );
    first.train(&store).unwrap();
    let v1 = first.register_model(&store).unwrap();

    let mut second = ModelTrainer::new(train_set, test_set, config, tags);
    let outcome = second.train(&store).unwrap();
    let v2 = second.register_model(&store).unwrap();

    assert_eq!(v1.name, "green-taxi.taxi_fare_model");
    assert_eq!((v1.version, v2.version), (1, 2));

    let current = store
        .get_version_by_alias("green-taxi.taxi_fare_model", LATEST_ALIAS)
        .unwrap();
    assert_eq!(current.version, 2);
    assert_eq!(current.run_id, outcome.run_id);

    let model = store
        .load_model("green-taxi.taxi_fare_model", LATEST_ALIAS)
        .unwrap();
    let record = Record::from([
        ("mean_distance".to_string(), FeatureValue::from(4.0)),
        ("rush_hour".to_string(), FeatureValue::from(1i64)),
        ("vendor_id".to_string(), FeatureValue::from(2i64)),
    ]);
    assert_abs_diff_eq!(model.predict_one(&record).unwrap(), 16.0, epsilon = 1e-8);
}

#[rstest]
fn test_failed_fit_marks_run_failed(config: TrainerConfig, test_set: DataFrame) {
    let store = TrackingStore::in_memory().unwrap();
    let empty = test_set.head(Some(0));
    let mut trainer = ModelTrainer::new(empty, test_set, config, Tags::new("abc", "dev"));

    assert!(trainer.train(&store).is_err());
    assert!(trainer.run_id().is_none());
}
