//! Integration tests for recurring occurrence generation.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use dayplan_core::{
    ClockTime, FailureKind, MemoryStore, Priority, RecurrenceEngine, RecurrenceRule, RecurringDefinition,
    ScheduleDb, ScheduleStore,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn definitions(owner: &str) -> Vec<RecurringDefinition> {
    vec![
        RecurringDefinition::new(owner, "Morning pages", RecurrenceRule::Daily)
            .with_time(ClockTime::from_hm(7, 0).unwrap()),
        // Monday, Wednesday, Friday
        RecurringDefinition::new(owner, "Gym", RecurrenceRule::weekly([1, 3, 5]))
            .with_category("health")
            .with_time(ClockTime::from_hm(18, 0).unwrap()),
        RecurringDefinition::new(owner, "Pay rent", RecurrenceRule::monthly(31)).with_priority(Priority::High),
        RecurringDefinition::new(owner, "Anniversary", RecurrenceRule::Yearly)
            .with_created_at(Utc.with_ymd_and_hms(2020, 6, 3, 10, 0, 0).unwrap()),
    ]
}

#[test]
fn week_of_generation_against_sqlite() {
    let mut db = ScheduleDb::open_memory().unwrap();
    for def in definitions("alice") {
        db.insert_definition(&def).unwrap();
    }
    let engine = RecurrenceEngine::new();

    // 2024-06-01 (Saturday) .. 2024-06-07 (Friday)
    let mut total = 0;
    for offset in 0..7 {
        let date = d(2024, 6, 1) + Duration::days(offset);
        let report = engine.generate_for_owner(&mut db, "alice", date).unwrap();
        assert!(report.failures.is_empty());
        total += report.count();
    }

    // 7 daily + Mon/Wed/Fri gym + the anniversary on June 3rd; June has no 31st.
    assert_eq!(total, 7 + 3 + 1);

    let monday = db.occurrences_on("alice", d(2024, 6, 3)).unwrap();
    let titles: Vec<_> = monday.iter().map(|o| o.title.as_str()).collect();
    assert_eq!(titles, ["Anniversary", "Morning pages", "Gym"]);
    assert!(monday.iter().all(|o| o.definition_id.is_some()));
}

#[test]
fn rerunning_a_day_is_a_no_op() {
    let mut db = ScheduleDb::open_memory().unwrap();
    for def in definitions("alice") {
        db.insert_definition(&def).unwrap();
    }
    let engine = RecurrenceEngine::new();
    let date = d(2024, 5, 31);

    let first = engine.generate_for_owner(&mut db, "alice", date).unwrap();
    // Daily, Friday gym, rent on the 31st.
    assert_eq!(first.count(), 3);

    let second = engine.generate_for_owner(&mut db, "alice", date).unwrap();
    assert_eq!(second.count(), 0);
    assert_eq!(second.already_generated, 3);
    assert_eq!(db.occurrences_on("alice", date).unwrap().len(), 3);
}

#[test]
fn owners_are_isolated() {
    let mut store = MemoryStore::new();
    for def in definitions("alice").into_iter().chain(definitions("bob")) {
        store.add_definition(def);
    }
    let engine = RecurrenceEngine::new();
    let date = d(2024, 6, 4);

    assert_eq!(engine.generate_for_owner(&mut store, "alice", date).unwrap().count(), 1);
    assert_eq!(engine.generate_for_owner(&mut store, "bob", date).unwrap().count(), 1);
    assert_eq!(store.occurrences_on("alice", date).unwrap().len(), 1);
}

#[test]
fn deactivated_and_expired_definitions_stop_generating() {
    let mut db = ScheduleDb::open_memory().unwrap();
    let expired = RecurringDefinition::new("alice", "Course", RecurrenceRule::Daily).with_end_date(d(2024, 6, 1));
    let stopped = RecurringDefinition::new("alice", "Old habit", RecurrenceRule::Daily);
    db.insert_definition(&expired).unwrap();
    db.insert_definition(&stopped).unwrap();
    db.deactivate_definition(&stopped.id).unwrap();

    let engine = RecurrenceEngine::new();
    assert_eq!(engine.generate_for_owner(&mut db, "alice", d(2024, 6, 1)).unwrap().count(), 1);
    assert_eq!(engine.generate_for_owner(&mut db, "alice", d(2024, 6, 2)).unwrap().count(), 0);
}

#[test]
fn corrupt_stored_rule_does_not_abort_batch() {
    let mut db = ScheduleDb::open_memory().unwrap();
    let good = RecurringDefinition::new("alice", "Good", RecurrenceRule::Daily);
    let bad = RecurringDefinition::new("alice", "Bad", RecurrenceRule::Daily);
    db.insert_definition(&good).unwrap();
    db.insert_definition(&bad).unwrap();
    db.conn()
        .execute(
            "UPDATE recurring_definitions SET rule = '{\"type\":\"hourly\"}' WHERE id = ?1",
            [&bad.id],
        )
        .unwrap();

    let report = RecurrenceEngine::new()
        .generate_for_owner(&mut db, "alice", d(2024, 6, 1))
        .unwrap();
    assert_eq!(report.count(), 1);
    assert_eq!(report.created[0].title, "Good");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].definition_id, bad.id);
    assert_eq!(report.failures[0].kind, FailureKind::MalformedRule);
}

#[test]
fn evaluation_order_does_not_affect_idempotency() {
    let defs = definitions("alice");
    let mut reversed = defs.clone();
    reversed.reverse();
    let engine = RecurrenceEngine::new();
    let date = d(2024, 6, 3);

    let mut store = MemoryStore::new();
    let forward = engine.generate_batch(&mut store, &defs, date);
    let backward = engine.generate_batch(&mut store, &reversed, date);
    assert_eq!(forward.count(), 3);
    assert_eq!(backward.count(), 0);
    assert_eq!(backward.already_generated, 3);
}
