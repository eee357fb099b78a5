//! Per-snapshot deduplication.

use std::collections::BTreeMap;

use crate::record::{PropertyId, PropertyRecord};

/// Collapse records sharing an id to the last occurrence in input order.
///
/// Later entries in a feed are corrections of earlier ones, so the last one
/// wins as a whole record. The map iterates in id order.
pub fn dedup_last<I>(records: I) -> BTreeMap<PropertyId, PropertyRecord>
where
    I: IntoIterator<Item = PropertyRecord>,
{
    let mut by_id = BTreeMap::new();
    for record in records {
        by_id.insert(record.id, record);
    }
    by_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, FieldValue};
    use chrono::{TimeZone, Utc};

    fn priced(id: i64, price: f64) -> PropertyRecord {
        let at = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        PropertyRecord::empty(PropertyId(id), at).with(Field::Price, FieldValue::Number(price))
    }

    #[test]
    fn last_occurrence_wins() {
        let deduped = dedup_last(vec![priced(7, 500.0), priced(8, 10.0), priced(7, 550.0)]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[&PropertyId(7)].get(Field::Price), &FieldValue::Number(550.0));
        assert_eq!(deduped[&PropertyId(8)].get(Field::Price), &FieldValue::Number(10.0));
    }

    #[test]
    fn later_record_replaces_whole_earlier_record() {
        let first = priced(7, 500.0).with(Field::Title, FieldValue::Text("old".into()));
        let deduped = dedup_last(vec![first, priced(7, 550.0)]);
        assert!(deduped[&PropertyId(7)].get(Field::Title).is_null());
    }

    #[test]
    fn empty_input() {
        assert!(dedup_last(Vec::new()).is_empty());
    }
}
