//! End-to-end batch run: raw snapshots → change events + current state.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::info;

use crate::changes::detect_changes;
use crate::field::Field;
use crate::history::group_by_id;
use crate::lifecycle::{LifecycleIndex, resolve};
use crate::record::{ChangeEvent, PropertyState, RawSnapshot};
use crate::snapshot::prepare;
use crate::state::materialize;

/// How many per-field counts [`RunSummary::log`] prints.
const TOP_FIELDS: usize = 5;

/// The two durable outputs of a run plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct Output {
    pub states: Vec<PropertyState>,
    pub changes: Vec<ChangeEvent>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub snapshots_used: usize,
    pub snapshots_skipped: usize,
    pub records_skipped: usize,
    pub duplicate_records: usize,
    pub days: usize,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub properties: usize,
    pub active: usize,
    pub inactive: usize,
    pub latest_day_count: Option<usize>,
    pub previous_day_count: Option<usize>,
    pub changes: usize,
    pub changed_properties: usize,
    /// Change count per field, most frequent first, ties in catalogue order.
    pub changes_by_field: Vec<(Field, usize)>,
}

impl RunSummary {
    /// Percentage change in listings seen on the latest day vs. the day before.
    pub fn day_over_day_pct(&self) -> Option<f64> {
        match (self.latest_day_count, self.previous_day_count) {
            (Some(latest), Some(prev)) if prev > 0 => {
                Some((latest as f64 - prev as f64) / prev as f64 * 100.0)
            }
            _ => None,
        }
    }

    pub fn log(&self) {
        info!(
            used = self.snapshots_used,
            skipped = self.snapshots_skipped,
            records_skipped = self.records_skipped,
            duplicates = self.duplicate_records,
            "snapshots processed"
        );
        info!(
            days = self.days,
            first = ?self.first_day,
            last = ?self.last_day,
            "observation window"
        );
        info!(
            total = self.properties,
            active = self.active,
            inactive = self.inactive,
            "properties"
        );
        if let (Some(latest), Some(previous)) = (self.latest_day_count, self.previous_day_count) {
            match self.day_over_day_pct() {
                Some(pct) => {
                    let variation = format!("{pct:+.1}%");
                    info!(latest, previous, %variation, "listings per day");
                }
                None => info!(latest, previous, "listings per day"),
            }
        }
        info!(
            changes = self.changes,
            properties = self.changed_properties,
            "changes detected"
        );
        for (field, count) in self.changes_by_field.iter().take(TOP_FIELDS) {
            info!(%field, count, "top changed field");
        }
    }
}

/// Run every stage over a closed set of raw snapshots.
///
/// Pure apart from logging: the same input always yields the same output.
pub fn run(raw: &[RawSnapshot]) -> Output {
    let prepared = prepare(raw);
    let histories = group_by_id(&prepared.snapshots);
    let changes = detect_changes(&histories);
    let lifecycle = resolve(&prepared.snapshots);
    let states = materialize(&histories, &lifecycle);

    let mut summary = summarize(&states, &changes, &lifecycle);
    summary.snapshots_used = prepared.snapshots.len();
    summary.snapshots_skipped = prepared.skipped_snapshots;
    summary.records_skipped = prepared.skipped_records;
    summary.duplicate_records = prepared.duplicate_records;

    Output {
        states,
        changes,
        summary,
    }
}

fn summarize(
    states: &[PropertyState],
    changes: &[ChangeEvent],
    lifecycle: &LifecycleIndex,
) -> RunSummary {
    let active = states.iter().filter(|s| s.active).count();
    let (latest_day_count, previous_day_count) = lifecycle.presence.last_two_counts();

    let mut per_field: BTreeMap<Field, usize> = BTreeMap::new();
    for change in changes {
        *per_field.entry(change.field).or_default() += 1;
    }
    let mut changes_by_field: Vec<(Field, usize)> = per_field.into_iter().collect();
    changes_by_field.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let changed_properties = changes.iter().map(|c| c.id).collect::<BTreeSet<_>>().len();

    RunSummary {
        days: lifecycle.presence.len(),
        first_day: lifecycle.presence.days().next(),
        last_day: lifecycle.presence.latest_day(),
        properties: states.len(),
        active,
        inactive: states.len() - active,
        latest_day_count,
        previous_day_count,
        changes: changes.len(),
        changed_properties,
        changes_by_field,
        ..RunSummary::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_counts() {
        let raw = vec![
            RawSnapshot::new(
                "d1",
                "2025-08-01 09:00:00",
                vec![
                    json!({ "id": 1, "prices": { "rawPrice": 10 }, "title": "a" }),
                    json!({ "id": 2, "prices": { "rawPrice": 20 } }),
                    json!({ "no": "id" }),
                ],
            ),
            RawSnapshot::new("broken", "???", vec![]),
            RawSnapshot::new(
                "d2",
                "2025-08-02 09:00:00",
                vec![
                    json!({ "id": 1, "prices": { "rawPrice": 11 }, "title": "b" }),
                    json!({ "id": 3 }),
                    json!({ "id": 3 }),
                ],
            ),
        ];
        let out = run(&raw);
        let s = &out.summary;
        assert_eq!(s.snapshots_used, 2);
        assert_eq!(s.snapshots_skipped, 1);
        assert_eq!(s.records_skipped, 1);
        assert_eq!(s.duplicate_records, 1);
        assert_eq!(s.days, 2);
        assert_eq!(s.properties, 3);
        // id 2 seen only once → still active.
        assert_eq!((s.active, s.inactive), (3, 0));
        assert_eq!((s.latest_day_count, s.previous_day_count), (Some(2), Some(2)));
        assert_eq!(s.day_over_day_pct(), Some(0.0));
        assert_eq!(s.changes, 2);
        assert_eq!(s.changed_properties, 1);
        assert_eq!(s.changes_by_field, vec![(Field::Title, 1), (Field::Price, 1)]);
    }

    #[test]
    fn empty_run() {
        let out = run(&[]);
        assert!(out.states.is_empty());
        assert!(out.changes.is_empty());
        assert_eq!(out.summary.days, 0);
        assert_eq!(out.summary.day_over_day_pct(), None);
    }
}
