//! End-to-end behaviour of a run over several snapshots.

use chrono::{TimeZone, Utc};
use listwatch_core::schema::{changes_batch, properties_batch};
use listwatch_core::{ChangeEvent, Field, FieldValue, PropertyId, RawSnapshot, run};
use serde_json::{Value, json};

fn listing(id: i64, price: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Apartamento {id}"),
        "prices": { "rawPrice": price },
        "location": { "neighborhood": { "name": "Centro" } }
    })
}

fn three_day_scenario() -> Vec<RawSnapshot> {
    vec![
        RawSnapshot::new(
            "day3.json",
            "2025-08-03 08:00:00",
            vec![listing(42, 120000), listing(7, 900)],
        ),
        RawSnapshot::new(
            "day1.json",
            "2025-08-01 08:00:00",
            vec![listing(42, 100000), listing(7, 900)],
        ),
        RawSnapshot::new("day2.json", "2025-08-02 08:00:00", vec![listing(7, 900)]),
    ]
}

#[test]
fn price_change_across_an_absent_day() {
    let out = run(&three_day_scenario());

    assert_eq!(
        out.changes,
        vec![ChangeEvent {
            id: PropertyId(42),
            field: Field::Price,
            old_value: "100000".into(),
            new_value: "120000".into(),
            changed_at: Utc.with_ymd_and_hms(2025, 8, 3, 8, 0, 0).unwrap(),
        }]
    );

    let state = out.states.iter().find(|s| s.id() == PropertyId(42)).unwrap();
    assert_eq!(state.get(Field::Price), &FieldValue::Number(120000.0));
    assert_eq!(state.first_seen_at, Utc.with_ymd_and_hms(2025, 8, 1, 8, 0, 0).unwrap());
    assert!(state.active);
}

#[test]
fn latest_day_absence_marks_inactive() {
    let raw = vec![
        RawSnapshot::new("d1", "2025-08-01 08:00:00", vec![listing(42, 1), listing(7, 1)]),
        RawSnapshot::new("d3", "2025-08-03 08:00:00", vec![listing(42, 1), listing(7, 1)]),
        RawSnapshot::new("d2", "2025-08-02 08:00:00", vec![listing(7, 1)]),
    ];
    // Latest day is 3 and 42 is present there.
    let out = run(&raw);
    assert!(out.states.iter().find(|s| s.id() == PropertyId(42)).unwrap().active);

    // Drop day 3: now day 2 is latest and 42 is missing from it.
    let out = run(&[raw[0].clone(), raw[2].clone()]);
    let s42 = out.states.iter().find(|s| s.id() == PropertyId(42)).unwrap();
    assert!(s42.active, "one day of history is not enough to retire a listing");

    let raw = vec![
        raw[0].clone(),
        raw[2].clone(),
        RawSnapshot::new("d1b", "2025-07-31 08:00:00", vec![listing(42, 1)]),
    ];
    let out = run(&raw);
    let s42 = out.states.iter().find(|s| s.id() == PropertyId(42)).unwrap();
    assert!(!s42.active);
}

#[test]
fn duplicate_ids_in_one_snapshot_keep_last() {
    let raw = vec![RawSnapshot::new(
        "dup.json",
        "2025-08-01 08:00:00",
        vec![listing(7, 500), listing(7, 550)],
    )];
    let out = run(&raw);
    assert_eq!(out.states.len(), 1);
    assert_eq!(out.states[0].get(Field::Price), &FieldValue::Number(550.0));
    assert!(out.changes.is_empty());
}

#[test]
fn no_event_is_empty_or_unchanged() {
    let raw = vec![
        RawSnapshot::new(
            "a",
            "2025-08-01",
            vec![json!({ "id": 1, "title": "x", "prices": { "rawPrice": 5 } })],
        ),
        RawSnapshot::new(
            "b",
            "2025-08-02",
            vec![json!({ "id": 1, "title": "", "prices": { "rawPrice": 5 } })],
        ),
        RawSnapshot::new("c", "2025-08-03", vec![json!({ "id": 1, "title": "y" })]),
        RawSnapshot::new(
            "d",
            "2025-08-04",
            vec![json!({ "id": 1, "title": "z", "prices": { "rawPrice": 6 } })],
        ),
    ];
    let out = run(&raw);
    assert!(!out.changes.is_empty());
    for event in &out.changes {
        assert!(!event.old_value.is_empty());
        assert!(!event.new_value.is_empty());
        assert_ne!(event.old_value, event.new_value);
    }
    let titles: Vec<_> = out
        .changes
        .iter()
        .filter(|e| e.field == Field::Title)
        .map(|e| (e.old_value.as_str(), e.new_value.as_str()))
        .collect();
    assert_eq!(titles, [("y", "z")]);
}

#[test]
fn rerun_is_identical() {
    let raw = three_day_scenario();
    let a = run(&raw);
    let b = run(&raw);
    assert_eq!(a.changes, b.changes);
    assert_eq!(a.states, b.states);
    assert_eq!(properties_batch(&a.states).unwrap(), properties_batch(&b.states).unwrap());
    assert_eq!(changes_batch(&a.changes).unwrap(), changes_batch(&b.changes).unwrap());
}

#[test]
fn input_order_does_not_matter() {
    let mut raw = three_day_scenario();
    let forward = run(&raw);
    raw.reverse();
    let reversed = run(&raw);
    assert_eq!(forward.changes, reversed.changes);
    assert_eq!(forward.states, reversed.states);
}

#[test]
fn single_snapshot_is_all_active_and_changeless() {
    let raw = vec![RawSnapshot::new("only", "2025-08-01", vec![listing(1, 1), listing(2, 2)])];
    let out = run(&raw);
    assert!(out.changes.is_empty());
    assert_eq!(out.states.len(), 2);
    assert!(out.states.iter().all(|s| s.active));
}
