//! Restricting a decoded month to the requested dates.

use anyhow::{Context, Result};
use arrow::array::{Array, BooleanArray, TimestampMicrosecondArray};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{NaiveDate, NaiveTime};

use crate::months::DateRange;
use crate::schema::PICKUP_DATETIME;
use crate::table::RowTable;

/// Keeps rows whose pickup time lies in `[start 00:00, end + 1 day 00:00)`.
///
/// Pickup values are compared as UTC wall-clock microseconds. Columns of any
/// timestamp unit, with or without a timezone, and string columns are
/// accepted; null or unparseable values are dropped. A table without a
/// `pickup_datetime` column is returned unchanged.
pub fn filter_to_range(table: RowTable, start: NaiveDate, end: NaiveDate) -> Result<RowTable> {
    let Ok(index) = table.schema().index_of(PICKUP_DATETIME) else {
        return Ok(table);
    };

    let lower = midnight_micros(start);
    let upper = end.succ_opt().map(midnight_micros).unwrap_or(i64::MAX);
    let target = DataType::Timestamp(TimeUnit::Microsecond, None);

    let schema = table.schema().clone();
    let batches = table
        .into_batches()
        .into_iter()
        .map(|batch| {
            let pickup = cast(batch.column(index), &target)
                .with_context(|| format!("casting {PICKUP_DATETIME} to a timestamp"))?;
            let pickup = pickup
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .context("pickup column did not cast to microsecond timestamps")?;

            let mask: BooleanArray = pickup
                .iter()
                .map(|v| v.map(|t| t >= lower && t < upper))
                .collect();

            filter_record_batch(&batch, &mask).context("filtering rows by pickup time")
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RowTable::new(schema, batches))
}

/// [`filter_to_range`] over a [`DateRange`].
pub fn filter_to_date_range(table: RowTable, range: &DateRange) -> Result<RowTable> {
    filter_to_range(table, range.start, range.end)
}

fn midnight_micros(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_micros()
}
