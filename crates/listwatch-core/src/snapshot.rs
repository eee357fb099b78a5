//! Raw snapshots → canonical, deduplicated, chronologically ordered snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::canonical::canonicalize;
use crate::dedup::dedup_last;
use crate::record::{PropertyId, PropertyRecord, RawSnapshot};

/// A canonical snapshot: at most one record per id.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Position of the raw snapshot in ingestion order. Equal timestamps keep
    /// this order because the sort in [`prepare`] is stable.
    pub seq: usize,
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub records: BTreeMap<PropertyId, PropertyRecord>,
}

impl Snapshot {
    /// Calendar day of the capture, in UTC.
    pub fn day(&self) -> NaiveDate {
        self.observed_at.date_naive()
    }
}

/// Result of preparing a set of raw snapshots for a run.
#[derive(Debug, Default)]
pub struct Prepared {
    /// Usable snapshots sorted by `observed_at`, ties kept in ingestion order.
    pub snapshots: Vec<Snapshot>,
    pub skipped_snapshots: usize,
    pub skipped_records: usize,
    pub duplicate_records: usize,
}

/// Canonicalize and deduplicate one raw snapshot.
///
/// Returns the snapshot and the number of raw records that were rejected.
pub fn canonicalize_snapshot(
    seq: usize,
    raw: &RawSnapshot,
    observed_at: DateTime<Utc>,
) -> (Snapshot, usize) {
    let mut skipped = 0;
    let mut records = Vec::with_capacity(raw.records.len());
    for (position, item) in raw.records.iter().enumerate() {
        match canonicalize(item, observed_at) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(
                    source = %raw.source,
                    observed_at = %observed_at,
                    position,
                    error = %e,
                    "skipping raw listing"
                );
            }
        }
    }
    let snapshot = Snapshot {
        seq,
        source: raw.source.clone(),
        observed_at,
        records: dedup_last(records),
    };
    (snapshot, skipped)
}

/// Prepare every raw snapshot, dropping the ones whose capture time is unusable.
///
/// Input order is treated as ingestion order only; the output is explicitly
/// re-sorted by capture time.
pub fn prepare(raw: &[RawSnapshot]) -> Prepared {
    let mut prepared = Prepared::default();
    for (seq, snap) in raw.iter().enumerate() {
        let observed_at = match snap.observed_at() {
            Ok(ts) => ts,
            Err(e) => {
                warn!(error = %e, "skipping snapshot");
                prepared.skipped_snapshots += 1;
                continue;
            }
        };
        let (snapshot, skipped) = canonicalize_snapshot(seq, snap, observed_at);
        let kept = snapshot.records.len();
        let duplicates = snap.records.len() - skipped - kept;
        if duplicates > 0 {
            debug!(source = %snap.source, duplicates, "collapsed duplicate listings");
        }
        prepared.skipped_records += skipped;
        prepared.duplicate_records += duplicates;
        prepared.snapshots.push(snapshot);
    }
    // Stable: equal timestamps keep ingestion order.
    prepared.snapshots.sort_by_key(|s| s.observed_at);
    prepared
}
