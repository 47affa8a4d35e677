//! Integration tests for raw trip processing

use approx::assert_relative_eq;
use fare_features::columns::*;
use fare_features::{DataProcessor, FeatureConfig, FeatureError, FeatureTransformer, SplitConfig};
use polars::prelude::*;
use rstest::{fixture, rstest};
use std::collections::HashSet;

fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

fn i64_values(df: &DataFrame, name: &str) -> Vec<i64> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

fn str_values(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_no_null_iter()
        .map(str::to_string)
        .collect()
}

#[fixture]
fn serving_config() -> FeatureConfig {
    FeatureConfig::new(
        vec![
            "passenger_count".into(),
            "trip_type".into(),
            "congestion_surcharge".into(),
            MEAN_DISTANCE.into(),
            MEAN_DURATION.into(),
            RUSH_HOUR.into(),
        ],
        vec![VENDOR_ID.into()],
        vec![FARE_AMOUNT.into()],
    )
}

fn inspect_config() -> FeatureConfig {
    FeatureConfig::new(
        vec![
            DURATION.into(),
            TRIP_DISTANCE.into(),
            MEAN_DISTANCE.into(),
            MEAN_DURATION.into(),
            RUSH_HOUR.into(),
        ],
        vec![DAY.into(), MONTH.into(), VENDOR_ID.into()],
        vec![FARE_AMOUNT.into()],
    )
}

/// Green taxi trips from February 2024.
#[fixture]
fn raw_trips() -> DataFrame {
    df!(
        PICKUP_DATETIME => [
            "2024-02-08 10:00:00", // Thursday
            "2024-02-10 08:00:00", // Saturday
            "2024-02-13 08:00:00", // Tuesday
            "2024-02-13 17:30:00",
            "2024-02-14 22:05:00",
            "2024-02-15 12:00:00",
        ],
        DROPOFF_DATETIME => [
            "2024-02-08 10:15:00",
            "2024-02-10 08:20:30",
            "2024-02-13 08:09:59",
            "2024-02-13 17:10:00",
            "2024-02-14 22:35:00",
            "2024-02-15 12:12:00",
        ],
        FARE_AMOUNT => [12.5, 18.0, 9.0, -5.0, 30.0, 11.0],
        PICKUP_LOCATION => [74i64, 74, 41, 41, 74, 166],
        DROPOFF_LOCATION => [75i64, 75, 42, 42, 75, 41],
        TRIP_DISTANCE => [1.0, 2.0, 0.8, 1.2, 3.0, 1.5],
        RAW_VENDOR_ID => [2i64, 2, 1, 2, 1, 2],
        "passenger_count" => [1.0, 2.0, 1.0, 1.0, 3.0, 1.0],
        "trip_type" => [1.0, 1.0, 1.0, 2.0, 1.0, 1.0],
        "congestion_surcharge" => [0.0, 2.75, 0.0, 0.0, 2.75, 0.0],
    )
    .unwrap()
}

#[rstest]
fn test_duration_in_whole_minutes(raw_trips: DataFrame) {
    let features = FeatureTransformer::new(inspect_config())
        .transform(raw_trips)
        .unwrap();

    // 15:00, 20:30 -> 20, 9:59 -> 9, negative -> 0, 30:00, 12:00
    assert_eq!(
        f64_values(&features, DURATION),
        vec![15.0, 20.0, 9.0, 0.0, 30.0, 12.0]
    );
}

#[rstest]
fn test_negative_values_floored(raw_trips: DataFrame) {
    let features = FeatureTransformer::new(inspect_config())
        .transform(raw_trips)
        .unwrap();

    let fares = f64_values(&features, FARE_AMOUNT);
    assert_relative_eq!(fares[3], 0.0);
    assert!(fares.iter().all(|&f| f >= 0.0));
    assert!(f64_values(&features, DURATION).iter().all(|&d| d >= 0.0));
}

#[rstest]
fn test_rush_hour_skips_weekends(raw_trips: DataFrame) {
    let features = FeatureTransformer::new(inspect_config())
        .transform(raw_trips)
        .unwrap();

    let days = str_values(&features, DAY);
    let rush = i64_values(&features, RUSH_HOUR);

    assert_eq!(days[1], "saturday");
    assert_eq!(rush[1], 0);
    assert_eq!(days[2], "tuesday");
    assert_eq!(rush[2], 1);
    assert_eq!(rush, vec![0, 0, 1, 1, 0, 0]);
}

#[rstest]
fn test_day_and_month_names(raw_trips: DataFrame) {
    let features = FeatureTransformer::new(inspect_config())
        .transform(raw_trips)
        .unwrap();

    assert_eq!(str_values(&features, DAY)[0], "thursday");
    assert!(str_values(&features, MONTH).iter().all(|m| m == "feb"));
}

#[rstest]
fn test_route_means_shared_within_route(raw_trips: DataFrame) {
    let features = FeatureTransformer::new(inspect_config())
        .transform(raw_trips)
        .unwrap();

    let distance = f64_values(&features, MEAN_DISTANCE);
    let duration = f64_values(&features, MEAN_DURATION);

    // route "74 75" covers rows 0, 1 and 4
    assert_relative_eq!(distance[0], 2.0);
    assert_relative_eq!(distance[1], 2.0);
    assert_relative_eq!(distance[4], 2.0);
    assert_relative_eq!(duration[0], (15.0 + 20.0 + 30.0) / 3.0);

    // route "41 42" covers rows 2 and 3
    assert_relative_eq!(distance[2], 1.0);
    assert_relative_eq!(distance[3], 1.0);

    // single-trip route
    assert_relative_eq!(distance[5], 1.5);
    assert_relative_eq!(duration[5], 12.0);
}

#[rstest]
fn test_projection_to_configured_columns(serving_config: FeatureConfig, raw_trips: DataFrame) {
    let features = FeatureTransformer::new(serving_config.clone())
        .transform(raw_trips)
        .unwrap();

    let names: Vec<String> = features
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, serving_config.selected_columns());
    assert_eq!(i64_values(&features, VENDOR_ID), vec![2, 2, 1, 2, 1, 2]);
}

#[rstest]
fn test_exact_duplicates_removed(raw_trips: DataFrame) {
    let doubled = raw_trips.vstack(&raw_trips.head(Some(2))).unwrap();
    assert_eq!(doubled.height(), 8);

    let features = FeatureTransformer::new(inspect_config())
        .transform(doubled)
        .unwrap();
    assert_eq!(features.height(), 6);
}

#[rstest]
fn test_rows_with_nulls_dropped(serving_config: FeatureConfig, mut raw_trips: DataFrame) {
    raw_trips
        .with_column(Column::new(
            "passenger_count".into(),
            [Some(1.0), None, Some(1.0), Some(1.0), Some(3.0), Some(1.0)],
        ))
        .unwrap();

    let features = FeatureTransformer::new(serving_config)
        .transform(raw_trips)
        .unwrap();
    assert_eq!(features.height(), 5);
    let nulls: usize = features
        .get_columns()
        .iter()
        .map(|c| c.null_count())
        .sum();
    assert_eq!(nulls, 0);
}

#[rstest]
fn test_datetime_columns_accepted(raw_trips: DataFrame) {
    let parsed = raw_trips
        .lazy()
        .with_columns([
            col(PICKUP_DATETIME).str().to_datetime(
                Some(TimeUnit::Milliseconds),
                None,
                StrptimeOptions::default(),
                lit("raise"),
            ),
            col(DROPOFF_DATETIME).str().to_datetime(
                Some(TimeUnit::Milliseconds),
                None,
                StrptimeOptions::default(),
                lit("raise"),
            ),
        ])
        .collect()
        .unwrap();

    let features = FeatureTransformer::new(inspect_config())
        .transform(parsed)
        .unwrap();
    assert_eq!(f64_values(&features, DURATION)[0], 15.0);
}

#[rstest]
fn test_processor_split_partitions(serving_config: FeatureConfig, raw_trips: DataFrame) {
    let processor = DataProcessor::new(serving_config);
    let features = processor.process_data(raw_trips.clone()).unwrap();
    let split = processor.run(raw_trips, SplitConfig::default()).unwrap();

    // ceil(0.2 * 6) = 2
    assert_eq!(split.test.height(), 2);
    assert_eq!(split.train.height(), 4);
    assert_eq!(split.total_rows(), features.height());

    // fares are unique in the fixture, so they identify rows
    let train: HashSet<u64> = f64_values(&split.train, FARE_AMOUNT)
        .into_iter()
        .map(f64::to_bits)
        .collect();
    let test: HashSet<u64> = f64_values(&split.test, FARE_AMOUNT)
        .into_iter()
        .map(f64::to_bits)
        .collect();
    assert!(train.is_disjoint(&test));
}

#[rstest]
fn test_processor_split_reproducible(serving_config: FeatureConfig, raw_trips: DataFrame) {
    let processor = DataProcessor::new(serving_config);
    let config = SplitConfig {
        test_size: 0.5,
        seed: 7,
    };

    let a = processor.run(raw_trips.clone(), config).unwrap();
    let b = processor.run(raw_trips, config).unwrap();
    assert!(a.train.equals(&b.train));
    assert!(a.test.equals(&b.test));
}

#[rstest]
fn test_two_rows_both_partitions_non_empty(serving_config: FeatureConfig, raw_trips: DataFrame) {
    let split = DataProcessor::new(serving_config)
        .run(raw_trips.head(Some(2)), SplitConfig::default())
        .unwrap();

    assert_eq!(split.train.height(), 1);
    assert_eq!(split.test.height(), 1);
}

#[rstest]
fn test_empty_input_yields_empty_partitions(serving_config: FeatureConfig, raw_trips: DataFrame) {
    let split = DataProcessor::new(serving_config)
        .run(raw_trips.head(Some(0)), SplitConfig::default())
        .unwrap();

    assert_eq!(split.train.height(), 0);
    assert_eq!(split.test.height(), 0);
}

#[rstest]
fn test_missing_column_propagates(serving_config: FeatureConfig, raw_trips: DataFrame) {
    let raw = raw_trips.drop(DROPOFF_DATETIME).unwrap();
    let err = DataProcessor::new(serving_config)
        .run(raw, SplitConfig::default())
        .unwrap_err();

    assert!(matches!(err, FeatureError::MissingColumn { column } if column == DROPOFF_DATETIME));
}
