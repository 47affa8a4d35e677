//! Rush-hour indicator.
//!
//! Weekday pickups between 06:00-10:00 and 16:00-20:00 are flagged. Weekend
//! pickups are never rush hour, whatever the time of day.

use crate::columns::{DAY, PICKUP_DATETIME, RUSH_HOUR};
use crate::error::Result;
use crate::step::FeatureStep;
use polars::prelude::*;
use std::ops::Range;

/// Half-open hour windows counted as rush hour.
pub const RUSH_HOUR_WINDOWS: [Range<u32>; 2] = [6..10, 16..20];

/// Lowercase day names that short-circuit the flag to 0.
pub const WEEKEND_DAYS: [&str; 2] = ["saturday", "sunday"];

/// Whether an hour of day (0-23) falls inside a rush-hour window.
pub fn is_rush_hour(hour: u32) -> bool {
    RUSH_HOUR_WINDOWS.iter().any(|window| window.contains(&hour))
}

/// Rush-hour flag for an hour of day: 1 inside a window, 0 otherwise.
pub fn rush_hourizer(hour: u32) -> i64 {
    i64::from(is_rush_hour(hour))
}

/// Map an integer hour expression through [`rush_hourizer`].
pub fn rush_hour_expr(hour: Expr) -> Expr {
    hour.cast(DataType::Int64).map(
        |c: Column| {
            let s = c.as_materialized_series();
            let flags = s
                .i64()?
                .apply_values(|h| u32::try_from(h).map_or(0, rush_hourizer));
            Ok(Some(flags.into_series().into()))
        },
        GetOutput::from_type(DataType::Int64),
    )
}

/// Derives `rush_hour` from the pickup timestamp and the `day` column.
///
/// The column starts as the pickup hour, weekend rows are zeroed and the
/// remaining rows go through [`rush_hourizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RushHourFlag;

impl FeatureStep for RushHourFlag {
    fn name(&self) -> &str {
        "rush_hour"
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![PICKUP_DATETIME, DAY]
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        let weekend = col(DAY)
            .eq(lit(WEEKEND_DAYS[0]))
            .or(col(DAY).eq(lit(WEEKEND_DAYS[1])));

        let result = data
            .with_column(
                col(PICKUP_DATETIME)
                    .dt()
                    .hour()
                    .cast(DataType::Int64)
                    .alias(RUSH_HOUR),
            )
            .with_column(
                when(weekend)
                    .then(lit(0))
                    .otherwise(rush_hour_expr(col(RUSH_HOUR)))
                    .cast(DataType::Int64)
                    .alias(RUSH_HOUR),
            );

        Ok(result)
    }
}
