//! Column names and the fixed output schema for trip records.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::sync::Arc;

pub const VENDOR_ID: &str = "vendor_id";
pub const PICKUP_DATETIME: &str = "pickup_datetime";
pub const DROPOFF_DATETIME: &str = "dropoff_datetime";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const TRIP_DISTANCE: &str = "trip_distance";
pub const RATE_CODE_ID: &str = "rate_code_id";
pub const STORE_AND_FWD_FLAG: &str = "store_and_fwd_flag";
pub const PU_LOCATION_ID: &str = "pu_location_id";
pub const DO_LOCATION_ID: &str = "do_location_id";
pub const PAYMENT_TYPE: &str = "payment_type";
pub const FARE_AMOUNT: &str = "fare_amount";
pub const EXTRA: &str = "extra";
pub const MTA_TAX: &str = "mta_tax";
pub const TIP_AMOUNT: &str = "tip_amount";
pub const TOLLS_AMOUNT: &str = "tolls_amount";
pub const TOTAL_AMOUNT: &str = "total_amount";
pub const EXTRACTED_AT: &str = "extracted_at";

/// Output columns in load order.
pub const TRIP_COLUMNS: [&str; 17] = [
    VENDOR_ID,
    PICKUP_DATETIME,
    DROPOFF_DATETIME,
    PASSENGER_COUNT,
    TRIP_DISTANCE,
    RATE_CODE_ID,
    STORE_AND_FWD_FLAG,
    PU_LOCATION_ID,
    DO_LOCATION_ID,
    PAYMENT_TYPE,
    FARE_AMOUNT,
    EXTRA,
    MTA_TAX,
    TIP_AMOUNT,
    TOLLS_AMOUNT,
    TOTAL_AMOUNT,
    EXTRACTED_AT,
];

/// Source column names used by the TLC files, mapped to output names.
///
/// Yellow files prefix timestamps with `tpep_`, green files with `lpep_`, and
/// for-hire files use their own casing.
pub const SOURCE_ALIASES: &[(&str, &str)] = &[
    ("VendorID", VENDOR_ID),
    ("tpep_pickup_datetime", PICKUP_DATETIME),
    ("lpep_pickup_datetime", PICKUP_DATETIME),
    ("tpep_dropoff_datetime", DROPOFF_DATETIME),
    ("lpep_dropoff_datetime", DROPOFF_DATETIME),
    ("dropOff_datetime", DROPOFF_DATETIME),
    ("RatecodeID", RATE_CODE_ID),
    ("PULocationID", PU_LOCATION_ID),
    ("PUlocationID", PU_LOCATION_ID),
    ("DOLocationID", DO_LOCATION_ID),
    ("DOlocationID", DO_LOCATION_ID),
];

/// Looks up the output name for a source column, if it has one.
pub fn canonical_name(source: &str) -> Option<&'static str> {
    SOURCE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == source)
        .map(|(_, canonical)| *canonical)
}

/// Data type of the `extracted_at` column.
pub fn extracted_at_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

/// The schema handed back when a run produced no rows.
pub fn trip_schema() -> SchemaRef {
    let ts = DataType::Timestamp(TimeUnit::Microsecond, None);

    Arc::new(Schema::new(vec![
        Field::new(VENDOR_ID, DataType::Int64, true),
        Field::new(PICKUP_DATETIME, ts.clone(), true),
        Field::new(DROPOFF_DATETIME, ts, true),
        Field::new(PASSENGER_COUNT, DataType::Int64, true),
        Field::new(TRIP_DISTANCE, DataType::Float64, true),
        Field::new(RATE_CODE_ID, DataType::Int64, true),
        Field::new(STORE_AND_FWD_FLAG, DataType::Utf8, true),
        Field::new(PU_LOCATION_ID, DataType::Int64, true),
        Field::new(DO_LOCATION_ID, DataType::Int64, true),
        Field::new(PAYMENT_TYPE, DataType::Int64, true),
        Field::new(FARE_AMOUNT, DataType::Float64, true),
        Field::new(EXTRA, DataType::Float64, true),
        Field::new(MTA_TAX, DataType::Float64, true),
        Field::new(TIP_AMOUNT, DataType::Float64, true),
        Field::new(TOLLS_AMOUNT, DataType::Float64, true),
        Field::new(TOTAL_AMOUNT, DataType::Float64, true),
        Field::new(EXTRACTED_AT, extracted_at_type(), true),
    ]))
}
