//! Snapshot and record types shared by every pipeline stage.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SnapshotError;
use crate::field::{Field, FieldValue};

/// Listing identifier as issued by the source feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub i64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One batch of raw listings as written by the ingestion side.
///
/// `captured_at` is kept as text; it is only parsed when the snapshot enters a
/// run, so that a bad timestamp drops one snapshot instead of the whole load.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    /// Where the batch came from (usually a file path). Used in logs only.
    pub source: String,
    pub captured_at: String,
    pub records: Vec<Value>,
}

impl RawSnapshot {
    pub fn new(
        source: impl Into<String>,
        captured_at: impl Into<String>,
        records: Vec<Value>,
    ) -> Self {
        Self {
            source: source.into(),
            captured_at: captured_at.into(),
            records,
        }
    }

    pub fn observed_at(&self) -> Result<DateTime<Utc>, SnapshotError> {
        parse_timestamp(&self.captured_at).ok_or_else(|| SnapshotError::InvalidTimestamp {
            source_label: self.source.clone(),
            value: self.captured_at.clone(),
        })
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a capture or update timestamp.
///
/// Accepts RFC 3339 and the naive `YYYY-MM-DD HH:MM:SS` form the crawler writes.
/// Naive values are taken as UTC. A bare date parses as midnight.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A flat, typed view of one listing as seen in one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub observed_at: DateTime<Utc>,
    /// Source-reported modification time. Carried, never diffed.
    pub updated_at: Option<DateTime<Utc>>,
    values: Vec<FieldValue>,
}

impl PropertyRecord {
    /// A record with every field unknown.
    pub fn empty(id: PropertyId, observed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            observed_at,
            updated_at: None,
            values: vec![FieldValue::Null; Field::COUNT],
        }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: FieldValue) {
        self.values[field.index()] = value;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: Field, value: FieldValue) -> Self {
        self.set(field, value);
        self
    }

    /// Values in catalogue order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }
}

/// A discrete change of one monitored field between two adjacent observations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: PropertyId,
    pub field: Field,
    pub old_value: String,
    pub new_value: String,
    pub changed_at: DateTime<Utc>,
}

/// One row of the current-state table.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyState {
    /// Latest observed record. Its `observed_at` is the last time the listing was seen.
    pub latest: PropertyRecord,
    pub first_seen_at: DateTime<Utc>,
    pub active: bool,
}

impl PropertyState {
    pub fn id(&self) -> PropertyId {
        self.latest.id
    }

    pub fn last_seen_at(&self) -> DateTime<Utc> {
        self.latest.observed_at
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        self.latest.get(field)
    }
}
