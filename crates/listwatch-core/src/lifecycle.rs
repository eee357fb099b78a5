//! Discovery time and liveness of each listing.
//!
//! Liveness looks only at the most recent calendar day with any snapshot. A
//! listing seen on a single day is kept active: one day of history is not
//! enough to declare it gone.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::record::PropertyId;
use crate::snapshot::Snapshot;

/// Lifecycle facts for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub first_seen_at: DateTime<Utc>,
    /// Number of distinct calendar days the listing was observed on.
    pub days_present: usize,
    pub active: bool,
}

/// Ids observed on each calendar day.
#[derive(Debug, Clone, Default)]
pub struct DayPresence {
    days: BTreeMap<NaiveDate, BTreeSet<PropertyId>>,
}

impl DayPresence {
    pub fn from_snapshots(snapshots: &[Snapshot]) -> Self {
        let mut days: BTreeMap<NaiveDate, BTreeSet<PropertyId>> = BTreeMap::new();
        for snapshot in snapshots {
            days.entry(snapshot.day())
                .or_default()
                .extend(snapshot.records.keys().copied());
        }
        Self { days }
    }

    /// Days in chronological order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn latest_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// Ids present on the latest day and on the day before it (when any).
    pub fn last_two_counts(&self) -> (Option<usize>, Option<usize>) {
        let mut rev = self.days.values().rev();
        let latest = rev.next().map(BTreeSet::len);
        let previous = rev.next().map(BTreeSet::len);
        (latest, previous)
    }

    fn days_containing(&self, id: PropertyId) -> usize {
        self.days.values().filter(|ids| ids.contains(&id)).count()
    }

    fn on_latest_day(&self, id: PropertyId) -> bool {
        self.days
            .values()
            .next_back()
            .is_some_and(|ids| ids.contains(&id))
    }
}

/// Lifecycle facts for every listing in the snapshot set.
#[derive(Debug, Clone, Default)]
pub struct LifecycleIndex {
    pub presence: DayPresence,
    by_id: BTreeMap<PropertyId, Lifecycle>,
}

impl LifecycleIndex {
    pub fn get(&self, id: PropertyId) -> Option<&Lifecycle> {
        self.by_id.get(&id)
    }
}

/// Resolve first-seen time and liveness for every id across `snapshots`.
///
/// Snapshot order does not matter here; `first_seen_at` is a true minimum.
pub fn resolve(snapshots: &[Snapshot]) -> LifecycleIndex {
    let presence = DayPresence::from_snapshots(snapshots);

    let mut first_seen: BTreeMap<PropertyId, DateTime<Utc>> = BTreeMap::new();
    for snapshot in snapshots {
        for id in snapshot.records.keys() {
            first_seen
                .entry(*id)
                .and_modify(|ts| *ts = (*ts).min(snapshot.observed_at))
                .or_insert(snapshot.observed_at);
        }
    }

    let by_id = first_seen
        .into_iter()
        .map(|(id, first_seen_at)| {
            let days_present = presence.days_containing(id);
            let active = days_present < 2 || presence.on_latest_day(id);
            (
                id,
                Lifecycle {
                    first_seen_at,
                    days_present,
                    active,
                },
            )
        })
        .collect();

    LifecycleIndex { presence, by_id }
}
