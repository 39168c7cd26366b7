//! End-to-end planning: existing occurrences, candidate lines, persisted result.

use chrono::NaiveDate;
use dayplan_core::{
    ClockTime, IntervalScheduler, MemoryStore, NewOccurrence, Priority, RecurrenceEngine, RecurrenceRule,
    RecurringDefinition, ScheduleDb, ScheduleStore, SchedulerConfig, ValidationError,
};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 7).unwrap()
}

fn at(h: u32, m: u32) -> ClockTime {
    ClockTime::from_hm(h, m).unwrap()
}

fn starts(result: &dayplan_core::ScheduleResult) -> Vec<(String, String, String)> {
    result
        .scheduled
        .iter()
        .map(|s| (s.title.clone(), s.start.to_string(), s.end.clone()))
        .collect()
}

#[test]
fn plans_around_lunch_and_persists_the_preview() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.insert_occurrence(
        NewOccurrence::one_off("alice", "Lunch", day())
            .with_time(at(12, 0))
            .with_duration(60),
    )
    .unwrap();

    let scheduler = IntervalScheduler::new();
    let existing = db.occurrences_on("alice", day()).unwrap();
    let result = scheduler
        .plan_day(day(), &existing, &["Report writing - 60m", "Review PRs (30 min)"])
        .unwrap();

    assert_eq!(
        starts(&result),
        vec![
            ("Report writing".to_string(), "09:00".to_string(), "10:00".to_string()),
            ("Review PRs".to_string(), "10:10".to_string(), "10:40".to_string()),
        ]
    );

    // Nothing is stored until the caller applies the preview.
    assert_eq!(db.occurrences_on("alice", day()).unwrap().len(), 1);
    for request in result.to_new_occurrences("alice", "planned", Priority::Medium) {
        db.insert_occurrence(request).unwrap();
    }
    let stored = db.occurrences_on("alice", day()).unwrap();
    let titles: Vec<_> = stored.iter().map(|o| o.title.as_str()).collect();
    assert_eq!(titles, ["Report writing", "Review PRs", "Lunch"]);
    assert!(stored.iter().all(|o| o.definition_id.is_none()));
}

#[test]
fn generated_occurrences_block_the_planner() {
    let mut store = MemoryStore::new();
    store.add_definition(
        RecurringDefinition::new("alice", "Standup", RecurrenceRule::Daily).with_time(at(9, 0)),
    );
    RecurrenceEngine::new()
        .generate_for_owner(&mut store, "alice", day())
        .unwrap();

    let existing = store.occurrences_on("alice", day()).unwrap();
    let result = IntervalScheduler::new()
        .plan_day(day(), &existing, &["Deep work 2h"])
        .unwrap();

    // Standup has no duration and takes the default 30 minutes.
    assert_eq!(result.scheduled[0].start.to_string(), "09:30");
    assert_eq!(result.scheduled[0].end, "11:30");
}

#[test]
fn untimed_occurrences_do_not_block() {
    let mut store = MemoryStore::new();
    store
        .insert_occurrence(NewOccurrence::one_off("alice", "Someday", day()).with_duration(600))
        .unwrap();

    let existing = store.occurrences_on("alice", day()).unwrap();
    let result = IntervalScheduler::new().plan_day(day(), &existing, &["Task"]).unwrap();
    assert_eq!(result.scheduled[0].start.to_string(), "09:00");
}

#[test]
fn overflow_is_reported_not_raised() {
    let config = SchedulerConfig::default()
        .with_window(at(9, 0).minutes(), at(10, 0).minutes())
        .with_break(0);
    let result = IntervalScheduler::with_config(config)
        .plan_day(day(), &[], &["A 45m", "B 30m", "C 15m"])
        .unwrap();

    let placed: Vec<_> = result.scheduled.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(placed, ["A", "C"]);
    assert_eq!(result.unscheduled.len(), 1);
    assert_eq!(result.unscheduled[0].title, "B");
    assert_eq!(result.summary(), "2 of 3 candidates scheduled");
}

#[test]
fn window_may_run_to_midnight() {
    let config = SchedulerConfig::default().with_window(at(23, 0).minutes(), 1440);
    let result = IntervalScheduler::with_config(config)
        .plan_day(day(), &[], &["Late shift 1h"])
        .unwrap();
    assert_eq!(result.scheduled[0].start.to_string(), "23:00");
    assert_eq!(result.scheduled[0].end, "24:00");
}

#[test]
fn invalid_requests_are_rejected() {
    let scheduler = IntervalScheduler::new();
    let none: [&str; 0] = [];
    assert!(matches!(
        scheduler.plan_day(day(), &[], &none),
        Err(ValidationError::EmptyCollection(_))
    ));
    assert!(matches!(
        scheduler.plan_day(day(), &[], &["Fine 10m", "Broken 0m"]),
        Err(ValidationError::NonPositiveDuration { .. })
    ));

    let inverted = SchedulerConfig::default().with_window(at(18, 0).minutes(), at(9, 0).minutes());
    assert!(matches!(
        IntervalScheduler::with_config(inverted).plan_day(day(), &[], &["Task"]),
        Err(ValidationError::InvalidWindow { .. })
    ));
}
