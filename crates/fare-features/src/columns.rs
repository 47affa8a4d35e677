//! Column names of raw trip records and derived features.

/// Pickup timestamp of a green taxi trip.
pub const PICKUP_DATETIME: &str = "lpep_pickup_datetime";
/// Dropoff timestamp of a green taxi trip.
pub const DROPOFF_DATETIME: &str = "lpep_dropoff_datetime";
/// Metered fare.
pub const FARE_AMOUNT: &str = "fare_amount";
/// Pickup taxi zone.
pub const PICKUP_LOCATION: &str = "PULocationID";
/// Dropoff taxi zone.
pub const DROPOFF_LOCATION: &str = "DOLocationID";
/// Trip distance in miles.
pub const TRIP_DISTANCE: &str = "trip_distance";
/// Vendor identifier as published in the raw data.
pub const RAW_VENDOR_ID: &str = "VendorID";

/// Trip duration in whole minutes.
pub const DURATION: &str = "duration";
/// Route key, `"{pickup} {dropoff}"`.
pub const ROUTE_KEY: &str = "pickup_dropoff";
/// Mean trip distance of the route within the batch.
pub const MEAN_DISTANCE: &str = "mean_distance";
/// Mean trip duration of the route within the batch.
pub const MEAN_DURATION: &str = "mean_duration";
/// Lowercase weekday name of the pickup.
pub const DAY: &str = "day";
/// Lowercase three-letter month of the pickup.
pub const MONTH: &str = "month";
/// Rush-hour indicator (0/1).
pub const RUSH_HOUR: &str = "rush_hour";
/// Vendor identifier after renaming.
pub const VENDOR_ID: &str = "vendor_id";

/// Raw columns the transformer reads.
pub const REQUIRED_RAW_COLUMNS: &[&str] = &[
    PICKUP_DATETIME,
    DROPOFF_DATETIME,
    FARE_AMOUNT,
    PICKUP_LOCATION,
    DROPOFF_LOCATION,
    TRIP_DISTANCE,
    RAW_VENDOR_ID,
];

/// Columns produced by the transformer.
pub const DERIVED_COLUMNS: &[&str] = &[
    DURATION,
    ROUTE_KEY,
    MEAN_DISTANCE,
    MEAN_DURATION,
    DAY,
    MONTH,
    RUSH_HOUR,
    VENDOR_ID,
];

/// Whether `name` is produced by the transformer rather than read from raw input.
pub fn is_derived(name: &str) -> bool {
    DERIVED_COLUMNS.contains(&name)
}
