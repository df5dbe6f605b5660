//! Parquet decoding for downloaded trip files.

use anyhow::{Context, Result};
use arrow::datatypes::{FieldRef, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::sync::Arc;
use tracing::debug;

use crate::schema::canonical_name;
use crate::table::RowTable;

/// Turns a downloaded payload into a [`RowTable`].
pub trait Decoder {
    fn decode(&self, bytes: Bytes) -> Result<RowTable>;
}

/// Decodes parquet payloads and renames known TLC source columns to their
/// output names.
#[derive(Debug, Clone)]
pub struct ParquetDecoder {
    batch_size: usize,
}

impl ParquetDecoder {
    pub fn new() -> Self {
        Self { batch_size: 8192 }
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self { batch_size }
    }
}

impl Default for ParquetDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ParquetDecoder {
    fn decode(&self, bytes: Bytes) -> Result<RowTable> {
        let table = parse_parquet(bytes, self.batch_size)?;
        normalize_columns(table)
    }
}

/// Reads every record batch out of an in-memory parquet file.
///
/// # Errors
///
/// Returns an error if the bytes are not a readable parquet file.
pub fn parse_parquet(bytes: Bytes, batch_size: usize) -> Result<RowTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(batch_size)
        .build()
        .context("building parquet record batch reader")?;

    let batches = reader
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()
        .context("decoding parquet record batch")?;

    debug!(
        columns = schema.fields().len(),
        batches = batches.len(),
        "Parquet payload decoded"
    );
    Ok(RowTable::new(schema, batches))
}

/// Renames source aliases (`tpep_pickup_datetime`, `VendorID`, ...) to output
/// names. A rename is skipped if the target name is already taken.
pub fn normalize_columns(table: RowTable) -> Result<RowTable> {
    let schema = table.schema().clone();
    let mut renamed = false;

    let fields: Vec<FieldRef> = schema
        .fields()
        .iter()
        .map(|field| match canonical_name(field.name()) {
            Some(target) if schema.index_of(target).is_err() => {
                renamed = true;
                Arc::new(field.as_ref().clone().with_name(target))
            }
            _ => field.clone(),
        })
        .collect();

    if !renamed {
        return Ok(table);
    }

    let schema: SchemaRef = Arc::new(Schema::new_with_metadata(
        fields,
        schema.metadata().clone(),
    ));
    let batches = table
        .into_batches()
        .into_iter()
        .map(|batch| {
            RecordBatch::try_new(schema.clone(), batch.columns().to_vec())
                .context("renaming source columns")
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RowTable::new(schema, batches))
}
