//! Raw trip table to modeling feature table.
//!
//! The transformation runs as a single lazy query:
//!
//! 1. drop exact duplicate rows (first occurrence kept)
//! 2. parse pickup/dropoff timestamps
//! 3. `duration` = floor(seconds / 60)
//! 4. floor `fare_amount` and `duration` at zero
//! 5. IQR-clip `fare_amount`, then `duration` (k = 6)
//! 6. route key `"{PULocationID} {DOLocationID}"`
//! 7. route mean of `trip_distance` joined back as `mean_distance`
//! 8. route mean of `duration` joined back as `mean_duration`
//! 9. `day` and `month` names
//! 10. `rush_hour`
//! 11. `VendorID` renamed to `vendor_id`
//! 12. projection to the configured columns, rows with nulls dropped
//!
//! Route means are computed over the batch being transformed, so they move
//! when the batch composition changes.

use crate::columns::*;
use crate::config::FeatureConfig;
use crate::error::{FeatureError, Result};
use crate::outlier::OutlierImputer;
use crate::rush_hour::RushHourFlag;
use crate::step::{FeatureStep, ensure_columns};
use polars::prelude::*;
use tracing::debug;

/// Default IQR multiplier for fare and duration clipping.
pub const DEFAULT_IQR_FACTOR: f64 = 6.0;

const ROW_ORDER: &str = "__row_order";

/// Converts raw trip records into the feature table.
///
/// Holds only the injected [`FeatureConfig`]; every call works on its own
/// copy of the input.
#[derive(Debug, Clone)]
pub struct FeatureTransformer {
    config: FeatureConfig,
    iqr_factor: f64,
}

impl FeatureTransformer {
    /// Create a transformer with the default IQR multiplier.
    pub const fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            iqr_factor: DEFAULT_IQR_FACTOR,
        }
    }

    /// Override the IQR multiplier used for fare and duration clipping.
    pub const fn with_iqr_factor(mut self, iqr_factor: f64) -> Self {
        self.iqr_factor = iqr_factor;
        self
    }

    /// Get the feature configuration.
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Check that `schema` carries every raw column the transformation reads,
    /// including configured pass-through columns.
    pub fn validate_input(&self, schema: &Schema) -> Result<()> {
        ensure_columns(schema, REQUIRED_RAW_COLUMNS.iter().copied())?;
        ensure_columns(
            schema,
            self.config
                .selected_columns()
                .into_iter()
                .filter(|name| !is_derived(name)),
        )
    }

    /// Transform a raw trip table into the feature table.
    pub fn transform(&self, raw: DataFrame) -> Result<DataFrame> {
        let schema = raw.schema().clone();
        self.validate_input(&schema)?;
        let rows_in = raw.height();

        let mut lf = raw
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .with_row_index(ROW_ORDER, None);

        lf = lf.with_columns([
            parse_timestamp(PICKUP_DATETIME, schema.get(PICKUP_DATETIME))?,
            parse_timestamp(DROPOFF_DATETIME, schema.get(DROPOFF_DATETIME))?,
        ]);

        lf = lf.with_column(duration_minutes().alias(DURATION));
        lf = lf.with_columns([floor_at_zero(FARE_AMOUNT), floor_at_zero(DURATION)]);

        lf = OutlierImputer::for_column(FARE_AMOUNT, self.iqr_factor).apply(lf)?;
        lf = OutlierImputer::for_column(DURATION, self.iqr_factor).apply(lf)?;

        lf = lf.with_column(
            concat_str(
                [
                    col(PICKUP_LOCATION).cast(DataType::String),
                    col(DROPOFF_LOCATION).cast(DataType::String),
                ],
                " ",
                false,
            )
            .alias(ROUTE_KEY),
        );
        lf = join_route_mean(lf, TRIP_DISTANCE, MEAN_DISTANCE);
        lf = join_route_mean(lf, DURATION, MEAN_DURATION);

        lf = lf.with_columns([
            col(PICKUP_DATETIME)
                .dt()
                .strftime("%A")
                .str()
                .to_lowercase()
                .alias(DAY),
            col(PICKUP_DATETIME)
                .dt()
                .strftime("%b")
                .str()
                .to_lowercase()
                .alias(MONTH),
        ]);
        lf = RushHourFlag.apply(lf)?;

        lf = lf.with_column(col(RAW_VENDOR_ID).alias(VENDOR_ID));

        let selected: Vec<Expr> = self
            .config
            .selected_columns()
            .into_iter()
            .map(col)
            .collect();
        let mut projected = lf
            .sort([ROW_ORDER], SortMultipleOptions::default())
            .select(selected)
            .drop_nulls(None);

        // NaN counts as missing in float columns
        let schema = projected.collect_schema()?;
        let not_nan = schema
            .iter()
            .filter(|(_, dtype)| dtype.is_float())
            .map(|(name, _)| col(name.as_str()).is_not_nan())
            .reduce(|a, b| a.and(b));
        if let Some(predicate) = not_nan {
            projected = projected.filter(predicate);
        }
        let features = projected.collect()?;

        debug!(
            rows_in,
            rows_out = features.height(),
            columns = features.width(),
            "transformed raw trips into features"
        );

        Ok(features)
    }
}

/// Cast a timestamp column to `Datetime`, parsing strings when needed.
fn parse_timestamp(name: &str, dtype: Option<&DataType>) -> Result<Expr> {
    let expr = match dtype {
        Some(DataType::String) => col(name).str().to_datetime(
            Some(TimeUnit::Microseconds),
            None,
            StrptimeOptions::default(),
            lit("raise"),
        ),
        Some(DataType::Datetime(_, _)) => col(name),
        Some(DataType::Date) => col(name).cast(DataType::Datetime(TimeUnit::Microseconds, None)),
        Some(other) => {
            return Err(FeatureError::InvalidParameter(format!(
                "column {name} has type {other}, expected a timestamp or string"
            )));
        }
        None => return Err(FeatureError::missing_column(name)),
    };
    Ok(expr.alias(name))
}

/// Whole minutes between pickup and dropoff, floored.
///
/// The difference is taken at full timestamp precision before any unit
/// conversion.
fn duration_minutes() -> Expr {
    let micros = (col(DROPOFF_DATETIME) - col(PICKUP_DATETIME))
        .dt()
        .total_microseconds();
    (micros.cast(DataType::Float64) / lit(60_000_000.0)).floor()
}

fn floor_at_zero(name: &str) -> Expr {
    when(col(name).lt(lit(0)))
        .then(lit(0))
        .otherwise(col(name))
        .alias(name)
}

/// Group by route, average `source`, and left-join the means back as `target`.
///
/// NaN values are left out of the mean.
fn join_route_mean(lf: LazyFrame, source: &str, target: &str) -> LazyFrame {
    let values = col(source).cast(DataType::Float64);
    let means = lf
        .clone()
        .group_by([col(ROUTE_KEY)])
        .agg([values.clone().filter(values.is_not_nan()).mean().alias(target)]);

    lf.join(
        means,
        [col(ROUTE_KEY)],
        [col(ROUTE_KEY)],
        JoinArgs::new(JoinType::Left),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_config() -> FeatureConfig {
        FeatureConfig::new(
            vec!["fare_amount".into(), "trip_distance".into()],
            vec!["vendor_id".into()],
            vec!["duration".into()],
        )
    }

    fn sample() -> DataFrame {
        df!(
            PICKUP_DATETIME => ["2024-02-08 10:00:00", "2024-02-08 15:00:00"],
            DROPOFF_DATETIME => ["2024-02-08 10:15:00", "2024-02-08 15:30:00"],
            FARE_AMOUNT => [10.0, -5.0],
            PICKUP_LOCATION => [1i64, 2],
            DROPOFF_LOCATION => [3i64, 4],
            TRIP_DISTANCE => [2.5, 3.5],
            RAW_VENDOR_ID => [1i64, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_output_columns_follow_config() {
        let out = FeatureTransformer::new(feature_config())
            .transform(sample())
            .unwrap();

        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["fare_amount", "trip_distance", "vendor_id", "duration"]);
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_missing_raw_column() {
        let raw = sample().drop(TRIP_DISTANCE).unwrap();
        let err = FeatureTransformer::new(feature_config())
            .transform(raw)
            .unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { column } if column == TRIP_DISTANCE));
    }

    #[test]
    fn test_missing_pass_through_column() {
        let config = FeatureConfig::new(
            vec!["passenger_count".into()],
            vec![],
            vec!["fare_amount".into()],
        );
        let err = FeatureTransformer::new(config)
            .transform(sample())
            .unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { column } if column == "passenger_count"));
    }

    fn micros_datetime(name: &str, values: &[i64]) -> Column {
        Column::new(name.into(), values)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
            .unwrap()
    }

    #[test]
    fn test_duration_floors_exact_difference() {
        // 2024-02-08T10:00:00 in microseconds
        let base = 1_707_386_400_000_000i64;
        let mut raw = sample();
        raw.with_column(micros_datetime(PICKUP_DATETIME, &[base + 900, base]))
            .unwrap();
        raw.with_column(micros_datetime(
            DROPOFF_DATETIME,
            &[base + 60_000_000, base + 15 * 60_000_000],
        ))
        .unwrap();

        let out = FeatureTransformer::new(feature_config())
            .transform(raw)
            .unwrap();
        let duration: Vec<Option<f64>> = out
            .column(DURATION)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        // 59.9991 seconds is not a whole minute
        assert_eq!(duration, vec![Some(0.0), Some(15.0)]);
    }

    #[test]
    fn test_nan_distance_excluded_from_route_mean() {
        let raw = df!(
            PICKUP_DATETIME => ["2024-02-08 10:00:00", "2024-02-08 11:00:00", "2024-02-08 12:00:00"],
            DROPOFF_DATETIME => ["2024-02-08 10:15:00", "2024-02-08 11:15:00", "2024-02-08 12:15:00"],
            FARE_AMOUNT => [10.0, 11.0, 12.0],
            PICKUP_LOCATION => [1i64, 1, 3],
            DROPOFF_LOCATION => [2i64, 2, 4],
            TRIP_DISTANCE => [1.0, f64::NAN, 2.0],
            RAW_VENDOR_ID => [1i64, 2, 1],
        )
        .unwrap();
        let config = FeatureConfig::new(
            vec![TRIP_DISTANCE.into(), MEAN_DISTANCE.into()],
            vec![],
            vec![FARE_AMOUNT.into()],
        );

        let out = FeatureTransformer::new(config).transform(raw).unwrap();
        let mean_distance: Vec<Option<f64>> = out
            .column(MEAN_DISTANCE)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();

        assert_eq!(out.height(), 2);
        assert_eq!(mean_distance, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_unparseable_timestamp_propagates() {
        let mut raw = sample();
        raw.with_column(Column::new(
            PICKUP_DATETIME.into(),
            ["not a time", "2024-02-08 15:00:00"],
        ))
        .unwrap();

        let result = FeatureTransformer::new(feature_config()).transform(raw);
        assert!(matches!(result, Err(FeatureError::Polars(_))));
    }
}
