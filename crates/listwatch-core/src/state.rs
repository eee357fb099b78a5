//! Current-state materialization: one row per listing.

use tracing::warn;

use crate::history::History;
use crate::lifecycle::LifecycleIndex;
use crate::record::PropertyState;

/// Combine each listing's latest observation with its lifecycle facts.
///
/// Rows come out in id order. A history with no lifecycle entry cannot occur
/// when both are built from the same snapshots; such a row is dropped.
pub fn materialize(histories: &[History], lifecycle: &LifecycleIndex) -> Vec<PropertyState> {
    histories
        .iter()
        .filter_map(|history| {
            let latest = history.latest()?;
            let Some(facts) = lifecycle.get(history.id) else {
                warn!(id = %history.id, "listing missing from lifecycle index");
                return None;
            };
            Some(PropertyState {
                latest: latest.clone(),
                first_seen_at: facts.first_seen_at,
                active: facts.active,
            })
        })
        .collect()
}
