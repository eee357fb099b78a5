//! Per-listing observation histories across snapshots.

use std::collections::BTreeMap;

use crate::record::{PropertyId, PropertyRecord};
use crate::snapshot::Snapshot;

/// Every observation of one listing, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    pub id: PropertyId,
    pub observations: Vec<PropertyRecord>,
}

impl History {
    /// Most recent observation. Ties on `observed_at` go to the later snapshot.
    pub fn latest(&self) -> Option<&PropertyRecord> {
        self.observations.last()
    }
}

/// Group all records by id, each group ordered by observation time.
///
/// Snapshots are walked in the given order and each group is then stably
/// sorted, so equal timestamps keep snapshot order. Groups come out in id order.
pub fn group_by_id(snapshots: &[Snapshot]) -> Vec<History> {
    let mut groups: BTreeMap<PropertyId, Vec<PropertyRecord>> = BTreeMap::new();
    for snapshot in snapshots {
        for (id, record) in &snapshot.records {
            groups.entry(*id).or_default().push(record.clone());
        }
    }
    groups
        .into_iter()
        .map(|(id, mut observations)| {
            observations.sort_by_key(|r| r.observed_at);
            History { id, observations }
        })
        .collect()
}
