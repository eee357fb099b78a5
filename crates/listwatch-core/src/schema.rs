//! Arrow schemas and batch builders for the two output tables.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Array, StringArray, StringBuilder,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field as ArrowField, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};

use crate::field::{Field, FieldKind, FieldValue};
use crate::record::{ChangeEvent, PropertyState};

pub const PROPERTIES_TABLE: &str = "properties";
pub const CHANGES_TABLE: &str = "changes";

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

fn arrow_type(kind: FieldKind) -> DataType {
    match kind {
        FieldKind::Number => DataType::Float64,
        FieldKind::Bool => DataType::Boolean,
        FieldKind::Text | FieldKind::NameList => DataType::Utf8,
    }
}

/// Current-state table: id, every catalogue field, then lifecycle columns.
pub fn properties_schema() -> Schema {
    let mut fields = Vec::with_capacity(Field::COUNT + 5);
    fields.push(ArrowField::new("id", DataType::Int64, false));
    for field in Field::ALL {
        fields.push(ArrowField::new(field.name(), arrow_type(field.kind()), true));
    }
    fields.push(ArrowField::new("updated_at", timestamp_type(), true));
    fields.push(ArrowField::new("first_seen_at", timestamp_type(), false));
    fields.push(ArrowField::new("last_seen_at", timestamp_type(), false));
    fields.push(ArrowField::new("active", DataType::Boolean, false));
    Schema::new(fields)
}

/// Change-event table.
pub fn changes_schema() -> Schema {
    Schema::new(vec![
        ArrowField::new("id", DataType::Int64, false),
        ArrowField::new("field", DataType::Utf8, false),
        ArrowField::new("old_value", DataType::Utf8, false),
        ArrowField::new("new_value", DataType::Utf8, false),
        ArrowField::new("changed_at", timestamp_type(), false),
    ])
}

fn micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn timestamps<I>(values: I) -> ArrayRef
where
    I: IntoIterator<Item = Option<i64>>,
{
    Arc::new(TimestampMicrosecondArray::from_iter(values).with_timezone("UTC"))
}

/// One column of catalogue values. A value of the wrong kind is written as null.
fn field_column(field: Field, states: &[PropertyState]) -> ArrayRef {
    match field.kind() {
        FieldKind::Number => {
            let mut b = Float64Builder::with_capacity(states.len());
            for s in states {
                b.append_option(s.get(field).as_number());
            }
            Arc::new(b.finish())
        }
        FieldKind::Bool => {
            let mut b = BooleanBuilder::with_capacity(states.len());
            for s in states {
                b.append_option(s.get(field).as_bool());
            }
            Arc::new(b.finish())
        }
        FieldKind::Text | FieldKind::NameList => {
            let mut b = StringBuilder::new();
            for s in states {
                match s.get(field) {
                    FieldValue::Text(t) => b.append_value(t),
                    _ => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
    }
}

/// Build the current-state batch. Row order follows `states`.
pub fn properties_batch(states: &[PropertyState]) -> Result<RecordBatch, ArrowError> {
    let schema: SchemaRef = Arc::new(properties_schema());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    columns.push(Arc::new(Int64Array::from_iter_values(states.iter().map(|s| s.id().0))));
    for field in Field::ALL {
        columns.push(field_column(field, states));
    }
    columns.push(timestamps(states.iter().map(|s| s.latest.updated_at.map(micros))));
    columns.push(timestamps(states.iter().map(|s| Some(micros(s.first_seen_at)))));
    columns.push(timestamps(states.iter().map(|s| Some(micros(s.last_seen_at())))));
    let mut active = BooleanBuilder::with_capacity(states.len());
    for s in states {
        active.append_value(s.active);
    }
    columns.push(Arc::new(active.finish()));

    RecordBatch::try_new(schema, columns)
}

/// Build the change-event batch. Row order follows `changes`.
pub fn changes_batch(changes: &[ChangeEvent]) -> Result<RecordBatch, ArrowError> {
    let schema: SchemaRef = Arc::new(changes_schema());
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(changes.iter().map(|c| c.id.0))),
        Arc::new(StringArray::from_iter_values(changes.iter().map(|c| c.field.name()))),
        Arc::new(StringArray::from_iter_values(changes.iter().map(|c| c.old_value.as_str()))),
        Arc::new(StringArray::from_iter_values(changes.iter().map(|c| c.new_value.as_str()))),
        timestamps(changes.iter().map(|c| Some(micros(c.changed_at)))),
    ];
    RecordBatch::try_new(schema, columns)
}
