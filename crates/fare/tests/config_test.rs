//! Loading project configuration from disk

use fare::{ConfigError, ProjectConfig};
use rstest::{fixture, rstest};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[fixture]
fn valid_yaml() -> &'static str {
    r#"
raw_data_bucket: "my-bucket"
processed_data_bucket: "processed-bucket"
taxi_data_years: [2021, 2022]
taxi_data_months: [1, 2, 3]
taxi_type: "yellow"
raw_schema:
  - name: "VendorId"
    type: "int"
num_features:
  - col1
  - col2
cat_features: [vendor_id]
target:
  - fare_amount
train_file_name_destination: "train/"
train_file_name: "train.parquet"
test_file_name: "test.parquet"
experiment_name: "my-experiment"
"#
}

#[rstest]
fn test_from_valid_yaml(valid_yaml: &str) {
    let file = write_config(valid_yaml);
    let config = ProjectConfig::from_yaml(file.path()).unwrap();

    assert_eq!(config.raw_data_bucket, "my-bucket");
    assert_eq!(config.processed_data_bucket, "processed-bucket");
    assert_eq!(config.taxi_data_years, vec![2021, 2022]);
    assert_eq!(config.taxi_data_months, vec![1, 2, 3]);
    assert_eq!(config.taxi_type, "yellow");
    assert_eq!(config.raw_schema.len(), 1);
    assert_eq!(config.raw_schema[0].name, "VendorId");
    assert_eq!(config.raw_schema[0].field_type, "int");
    assert_eq!(config.num_features, vec!["col1", "col2"]);
    assert_eq!(config.cat_features, vec!["vendor_id"]);
    assert_eq!(config.target, vec!["fare_amount"]);
    assert_eq!(config.train_file_name, "train.parquet");
    assert_eq!(config.test_file_name, "test.parquet");
    assert_eq!(config.experiment_name, "my-experiment");
    assert_eq!(config.months().len(), 6);
}

#[rstest]
fn test_feature_and_trainer_config(valid_yaml: &str) {
    let config = ProjectConfig::from_yaml_str(valid_yaml).unwrap();

    let features = config.feature_config();
    assert_eq!(
        features.selected_columns(),
        vec!["col1", "col2", "vendor_id", "fare_amount"]
    );

    let trainer = config.trainer_config();
    assert_eq!(trainer.experiment_name, "my-experiment");
    assert_eq!(trainer.train_file_name, "train.parquet");
    assert_eq!(trainer.features, features);
}

#[test]
fn test_legacy_field_names() {
    let config = ProjectConfig::from_yaml_str(
        r#"
gcs_raw_data_bucket_name: raw
gcs_processed_taxi_data_bucket_name: processed
taxi_data_years: [2024]
taxi_data_months: [1]
taxi_type: green
green_taxi_raw_schema: []
num_features: [mean_distance]
target: [fare_amount]
train_file_name: train.parquet
test_file_name: test.parquet
experiment_name: green-taxi
"#,
    )
    .unwrap();
    assert_eq!(config.raw_data_bucket, "raw");
    assert_eq!(config.processed_data_bucket, "processed");
    assert!(config.raw_schema.is_empty());
}

#[rstest]
#[case::missing_field(
    "taxi_data_years: [2021, 2022]\ntaxi_data_months: [1, 2, 3]\ntaxi_type: yellow\n"
)]
#[case::wrong_type(
    "raw_data_bucket: my-bucket\ntaxi_data_years: \"2021, 2022\"\ntaxi_data_months: [1, 2, 3]\ntaxi_type: yellow\n"
)]
fn test_invalid_yaml(#[case] content: &str) {
    let file = write_config(content);
    assert!(matches!(
        ProjectConfig::from_yaml(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        ProjectConfig::from_yaml("/nonexistent/project-config.yaml"),
        Err(ConfigError::Io(_))
    ));
}
