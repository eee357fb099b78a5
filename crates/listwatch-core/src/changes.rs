//! Field-level change detection between adjacent observations.
//!
//! A change is only reported when both sides carry a value: a field going from
//! unknown to known (or back) reflects data availability, not a real update.

use crate::field::Field;
use crate::history::History;
use crate::record::{ChangeEvent, PropertyRecord};

/// Diff two adjacent observations of the same listing over the monitored fields.
pub fn diff_pair(prev: &PropertyRecord, curr: &PropertyRecord) -> Vec<ChangeEvent> {
    Field::monitored()
        .iter()
        .filter_map(|&field| {
            let old_value = prev.get(field).to_comparable();
            let new_value = curr.get(field).to_comparable();
            if old_value.is_empty() || new_value.is_empty() || old_value == new_value {
                return None;
            }
            Some(ChangeEvent {
                id: curr.id,
                field,
                old_value,
                new_value,
                changed_at: curr.observed_at,
            })
        })
        .collect()
}

/// Changes within one history. Observations are paired by position, so an
/// absence between two snapshots simply makes the next sighting adjacent.
pub fn history_changes(history: &History) -> Vec<ChangeEvent> {
    history
        .observations
        .windows(2)
        .flat_map(|pair| diff_pair(&pair[0], &pair[1]))
        .collect()
}

/// Every change across all histories, exact duplicates removed.
///
/// Ordered by id, then `changed_at`, then catalogue field order.
pub fn detect_changes(histories: &[History]) -> Vec<ChangeEvent> {
    let mut events: Vec<ChangeEvent> = histories.iter().flat_map(history_changes).collect();
    events.sort_by(|a, b| {
        (a.id, a.changed_at, a.field, &a.old_value, &a.new_value)
            .cmp(&(b.id, b.changed_at, b.field, &b.old_value, &b.new_value))
    });
    events.dedup();
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::record::PropertyId;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, d, 12, 0, 0).unwrap()
    }

    fn obs(id: i64, d: u32) -> PropertyRecord {
        PropertyRecord::empty(PropertyId(id), day(d))
    }

    fn history(id: i64, observations: Vec<PropertyRecord>) -> History {
        History { id: PropertyId(id), observations }
    }

    #[test]
    fn reports_changed_monitored_field() {
        let prev = obs(42, 1).with(Field::Price, FieldValue::Number(100000.0));
        let curr = obs(42, 3).with(Field::Price, FieldValue::Number(120000.0));
        let events = diff_pair(&prev, &curr);
        assert_eq!(
            events,
            vec![ChangeEvent {
                id: PropertyId(42),
                field: Field::Price,
                old_value: "100000".into(),
                new_value: "120000".into(),
                changed_at: day(3),
            }]
        );
    }

    #[test]
    fn ignores_availability_transitions() {
        let prev = obs(1, 1).with(Field::Title, FieldValue::Text("Casa".into()));
        let curr = obs(1, 2).with(Field::Price, FieldValue::Number(10.0));
        assert!(diff_pair(&prev, &curr).is_empty());
        assert!(diff_pair(&curr, &prev).is_empty());
    }

    #[test]
    fn ignores_unmonitored_fields() {
        let prev = obs(1, 1).with(Field::City, FieldValue::Text("Curitiba".into()));
        let curr = obs(1, 2).with(Field::City, FieldValue::Text("São José dos Pinhais".into()));
        assert!(diff_pair(&prev, &curr).is_empty());
    }

    #[test]
    fn compares_only_adjacent_observations() {
        let h = history(
            5,
            vec![
                obs(5, 1).with(Field::Price, FieldValue::Number(1.0)),
                obs(5, 2).with(Field::Price, FieldValue::Number(2.0)),
                obs(5, 3).with(Field::Price, FieldValue::Number(1.0)),
            ],
        );
        let events = history_changes(&h);
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].old_value.as_str(), events[0].new_value.as_str()), ("1", "2"));
        assert_eq!((events[1].old_value.as_str(), events[1].new_value.as_str()), ("2", "1"));
    }

    #[test]
    fn null_gap_pairs_with_neighbour_not_earlier_value() {
        let h = history(
            5,
            vec![
                obs(5, 1).with(Field::Price, FieldValue::Number(1.0)),
                obs(5, 2),
                obs(5, 3).with(Field::Price, FieldValue::Number(3.0)),
            ],
        );
        assert!(history_changes(&h).is_empty());
    }

    #[test]
    fn exact_duplicates_are_removed() {
        let a = obs(9, 1).with(Field::Garages, FieldValue::Number(1.0));
        let b = obs(9, 2).with(Field::Garages, FieldValue::Number(2.0));
        let histories = vec![history(9, vec![a.clone(), b.clone()]), history(9, vec![a, b])];
        assert_eq!(detect_changes(&histories).len(), 1);
    }

    #[test]
    fn output_is_ordered_by_id_then_time() {
        let histories = vec![
            history(
                2,
                vec![
                    obs(2, 1).with(Field::Price, FieldValue::Number(1.0)),
                    obs(2, 2).with(Field::Price, FieldValue::Number(2.0)),
                ],
            ),
            history(
                1,
                vec![
                    obs(1, 1).with(Field::Title, FieldValue::Text("a".into())),
                    obs(1, 2).with(Field::Title, FieldValue::Text("b".into())),
                    obs(1, 3).with(Field::Title, FieldValue::Text("c".into())),
                ],
            ),
        ];
        let events = detect_changes(&histories);
        let keys: Vec<_> = events.iter().map(|e| (e.id.0, e.changed_at)).collect();
        assert_eq!(keys, [(1, day(2)), (1, day(3)), (2, day(2))]);
    }

    #[test]
    fn single_observation_yields_nothing() {
        let h = history(1, vec![obs(1, 1).with(Field::Price, FieldValue::Number(1.0))]);
        assert!(detect_changes(&[h]).is_empty());
        assert!(detect_changes(&[]).is_empty());
    }
}
