//! In-memory tabular unit passed between the fetch, filter and combine steps.

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, TimestampMicrosecondArray, new_null_array};
use arrow::compute::{can_cast_types, cast, concat_batches};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::schema::{EXTRACTED_AT, extracted_at_type};

/// An Arrow schema plus the ordered record batches that share it.
#[derive(Debug, Clone)]
pub struct RowTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl RowTable {
    /// Builds a table from batches that all carry `schema`.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// A zero-row table with the given columns.
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.index_of(name).is_ok()
    }

    /// Collapses all batches into one.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        concat_batches(&self.schema, &self.batches).context("concatenating record batches")
    }

    /// Concatenates tables in order into one, discarding drift details.
    /// See [`RowTable::merge`].
    pub fn concat(tables: Vec<RowTable>) -> Result<Option<RowTable>> {
        Ok(Self::merge(tables)?.map(|merged| merged.table))
    }

    /// Concatenates tables in order into one.
    ///
    /// Column sets are unioned: the result keeps every column in first-seen
    /// order with its first non-`Null` type. Later tables are cast to that
    /// type and columns a table lacks are filled with nulls. A column that
    /// cannot be cast is filled with nulls too and listed in
    /// [`Merged::drift`]. Returns `None` when `tables` is empty.
    pub fn merge(tables: Vec<RowTable>) -> Result<Option<Merged>> {
        if tables.is_empty() {
            return Ok(None);
        }

        let mut fields: Vec<Field> = Vec::new();
        for table in &tables {
            for field in table.schema.fields() {
                match fields.iter_mut().find(|f| f.name() == field.name()) {
                    Some(seen) if seen.data_type() == &DataType::Null => {
                        seen.set_data_type(field.data_type().clone());
                    }
                    Some(_) => {}
                    None => fields.push(field.as_ref().clone().with_nullable(true)),
                }
            }
        }
        let schema = Arc::new(Schema::new(fields));

        let mut batches = Vec::new();
        let mut drift = Vec::new();
        for table in tables {
            for batch in table.batches {
                batches.push(align_batch(&batch, &schema, &mut drift)?);
            }
        }

        Ok(Some(Merged {
            table: RowTable { schema, batches },
            drift,
        }))
    }

    /// Appends an `extracted_at` column holding `extracted_at` on every row,
    /// replacing any existing column of that name.
    pub fn with_extraction_timestamp(self, extracted_at: DateTime<Utc>) -> Result<RowTable> {
        let micros = extracted_at.timestamp_micros();
        let existing = self.schema.index_of(EXTRACTED_AT).ok();

        let mut fields: Vec<FieldRef> = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != existing)
            .map(|(_, f)| f.clone())
            .collect();
        fields.push(Arc::new(Field::new(EXTRACTED_AT, extracted_at_type(), true)));
        let schema = Arc::new(Schema::new(fields));

        let batches = self
            .batches
            .into_iter()
            .map(|batch| {
                let mut columns: Vec<ArrayRef> = batch
                    .columns()
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != existing)
                    .map(|(_, c)| c.clone())
                    .collect();
                let stamp = TimestampMicrosecondArray::from_value(micros, batch.num_rows())
                    .with_timezone("UTC");
                columns.push(Arc::new(stamp));
                RecordBatch::try_new(schema.clone(), columns)
                    .context("stamping extraction timestamp")
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RowTable { schema, batches })
    }
}

/// Result of [`RowTable::merge`].
#[derive(Debug)]
pub struct Merged {
    pub table: RowTable,
    /// Columns whose values were replaced with nulls, one entry per distinct
    /// type conversion.
    pub drift: Vec<ColumnDrift>,
}

/// A column that could not be converted to the merged type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDrift {
    pub column: String,
    pub from: DataType,
    pub to: DataType,
}

/// Rebuilds `batch` against `schema`, casting or null-filling columns.
fn align_batch(
    batch: &RecordBatch,
    schema: &SchemaRef,
    drift: &mut Vec<ColumnDrift>,
) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| {
            let to = field.data_type();
            let Some(column) = batch.column_by_name(field.name()) else {
                return new_null_array(to, batch.num_rows());
            };
            if column.data_type() == to {
                return column.clone();
            }

            let converted = can_cast_types(column.data_type(), to)
                .then(|| cast(column, to).ok())
                .flatten();
            converted.unwrap_or_else(|| {
                let entry = ColumnDrift {
                    column: field.name().clone(),
                    from: column.data_type().clone(),
                    to: to.clone(),
                };
                if !drift.contains(&entry) {
                    drift.push(entry);
                }
                new_null_array(to, batch.num_rows())
            })
        })
        .collect();

    RecordBatch::try_new(schema.clone(), columns).context("aligning record batch to merged schema")
}
