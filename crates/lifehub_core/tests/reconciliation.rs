use chrono::NaiveDate;
use lifehub_core::{
    EntryDetails, Frequency, Habit, Quality, ReconciliationOrchestrator, ValidationError,
};
use proptest::prelude::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn fresh_habit() -> Habit {
    Habit::new("Meditate", Frequency::Daily).unwrap()
}

fn complete(reconciler: &mut ReconciliationOrchestrator, habit: &Habit, date: &str) -> Habit {
    reconciler
        .record_completion(habit, date, EntryDetails::default())
        .unwrap()
}

#[test]
fn backfill_scenario_merges_runs_and_uses_new_streak_for_experience() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let habit = fresh_habit();

    let habit = complete(&mut reconciler, &habit, "2024-01-01");
    assert_eq!((habit.streak(), habit.experience()), (1, 12));

    let habit = complete(&mut reconciler, &habit, "2024-01-02");
    assert_eq!((habit.streak(), habit.experience()), (2, 26));

    let habit = complete(&mut reconciler, &habit, "2024-01-04");
    assert_eq!((habit.streak(), habit.experience()), (1, 38));
    assert_eq!(habit.last_completed_date(), Some(day(4)));

    let habit = complete(&mut reconciler, &habit, "2024-01-03");
    assert_eq!(habit.streak(), 4);
    assert_eq!(habit.last_completed_date(), Some(day(4)));
    assert_eq!(habit.experience(), 56);
    assert_eq!(habit.level(), 1);

    let habit = reconciler.record_uncompletion(&habit, "2024-01-04").unwrap();
    assert_eq!(habit.streak(), 3);
    assert_eq!(habit.last_completed_date(), Some(day(3)));
    assert_eq!(habit.experience(), 46);
    assert_eq!(habit.log().len(), 4);
    assert!(!habit.log().get(day(4)).unwrap().completed);
}

#[test]
fn recording_same_completion_twice_is_idempotent() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let details = EntryDetails {
        quality: Some(Quality::Excellent),
        duration_minutes: Some(15),
        ..EntryDetails::default()
    };

    let once = reconciler
        .record_completion(&fresh_habit(), "2024-01-01", details.clone())
        .unwrap();
    let twice = reconciler
        .record_completion(&once, "2024-01-01", details)
        .unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.streak(), 1);
    assert_eq!(twice.experience(), 17);
}

#[test]
fn changing_details_of_completed_day_updates_entry_without_experience() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let habit = complete(&mut reconciler, &fresh_habit(), "2024-01-01");

    let details = EntryDetails {
        quality: Some(Quality::Excellent),
        notes: Some("felt great".to_string()),
        ..EntryDetails::default()
    };
    let updated = reconciler
        .record_completion(&habit, "2024-01-01", details)
        .unwrap();

    assert_eq!(updated.experience(), habit.experience());
    assert_eq!(
        updated.log().get(day(1)).unwrap().details.quality,
        Some(Quality::Excellent)
    );
}

#[test]
fn uncompleting_last_day_rescans_to_zero_when_nothing_remains() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let habit = complete(&mut reconciler, &fresh_habit(), "2024-01-01");

    let habit = reconciler.record_uncompletion(&habit, "2024-01-01").unwrap();
    assert_eq!(habit.streak(), 0);
    assert_eq!(habit.last_completed_date(), None);
    assert_eq!(habit.experience(), 2);
}

#[test]
fn uncompletion_keeps_details_and_floors_experience() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let details = EntryDetails {
        duration_minutes: Some(30),
        ..EntryDetails::default()
    };
    let habit = reconciler
        .record_completion(&fresh_habit(), "2024-01-01", details)
        .unwrap();

    let once = reconciler.record_uncompletion(&habit, "2024-01-01").unwrap();
    let twice = reconciler.record_uncompletion(&once, "2024-01-01").unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.experience(), 2);
    let entry = twice.log().get(day(1)).unwrap();
    assert!(!entry.completed);
    assert_eq!(entry.details.duration_minutes, Some(30));
}

#[test]
fn uncompleting_unknown_day_records_a_miss_without_penalty() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let habit = complete(&mut reconciler, &fresh_habit(), "2024-01-02");

    let updated = reconciler.record_uncompletion(&habit, "2024-01-01").unwrap();
    assert_eq!(updated.experience(), habit.experience());
    assert_eq!(updated.streak(), 1);
    assert_eq!(updated.log().len(), 2);
}

#[test]
fn level_is_not_lowered_by_uncompletion() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let mut habit = fresh_habit();
    for d in 1..=7 {
        habit = complete(&mut reconciler, &habit, &format!("2024-01-{d:02}"));
    }
    // Gains 12+14+16+18+20+22+24 = 126 -> level 2 with 26 left over.
    assert_eq!((habit.level(), habit.experience()), (2, 26));

    for d in 5..=7 {
        habit = reconciler
            .record_uncompletion(&habit, &format!("2024-01-{d:02}"))
            .unwrap();
    }
    assert_eq!(habit.level(), 2);
    assert_eq!(habit.experience(), 0);
    assert_eq!(habit.streak(), 4);
}

#[test]
fn removing_a_completed_entry_rescans_and_deducts() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let mut habit = fresh_habit();
    for date in ["2024-01-01", "2024-01-02", "2024-01-03"] {
        habit = complete(&mut reconciler, &habit, date);
    }

    let habit = reconciler.remove_entry(&habit, "2024-01-02").unwrap();
    assert_eq!(habit.log().len(), 2);
    assert_eq!(habit.streak(), 1);
    assert_eq!(habit.last_completed_date(), Some(day(3)));
    assert_eq!(habit.experience(), 12 + 14 + 16 - 10);
}

#[test]
fn removing_absent_entry_is_noop() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let habit = complete(&mut reconciler, &fresh_habit(), "2024-01-01");

    let updated = reconciler.remove_entry(&habit, "2024-01-09").unwrap();
    assert_eq!(updated, habit);
}

#[test]
fn malformed_date_is_rejected_and_habit_left_unchanged() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let habit = complete(&mut reconciler, &fresh_habit(), "2024-01-01");
    let before = habit.clone();

    let err = reconciler
        .record_completion(&habit, "2024-13-01", EntryDetails::default())
        .unwrap_err();
    assert_eq!(err, ValidationError::MalformedDate("2024-13-01".to_string()));
    assert!(reconciler.record_uncompletion(&habit, "soon").is_err());
    assert!(reconciler.remove_entry(&habit, "").is_err());
    assert_eq!(habit, before);
}

#[test]
fn far_future_dates_are_accepted() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let habit = complete(&mut reconciler, &fresh_habit(), "2024-01-01");

    let habit = complete(&mut reconciler, &habit, "2999-12-31");
    assert_eq!(habit.streak(), 1);
    assert_eq!(
        habit.last_completed_date(),
        Some(NaiveDate::from_ymd_opt(2999, 12, 31).unwrap())
    );
}

#[test]
fn reconciliation_uses_the_callers_snapshot() {
    let mut reconciler = ReconciliationOrchestrator::new();
    let base = fresh_habit();
    let with_first = complete(&mut reconciler, &base, "2024-01-01");
    let _with_second = complete(&mut reconciler, &with_first, "2024-01-02");

    // Branching again from `with_first` must not see 01-02.
    let branched = complete(&mut reconciler, &with_first, "2024-01-05");
    assert_eq!(branched.log().len(), 2);
    assert!(branched.log().get(day(2)).is_none());
    assert_eq!(reconciler.store().get(base.id).len(), 2);
}

proptest! {
    #[test]
    fn completion_order_does_not_change_final_streak(
        offsets in (1u32..=28).prop_flat_map(|len| Just((0..len).collect::<Vec<u32>>()).prop_shuffle())
    ) {
        let mut reconciler = ReconciliationOrchestrator::new();
        let mut habit = fresh_habit();
        for offset in &offsets {
            habit = reconciler.record_completion_on(&habit, day(offset + 1), EntryDetails::default());
            prop_assert!(habit.validate().is_ok());
        }

        let len = offsets.len() as u32;
        prop_assert_eq!(habit.streak(), len);
        prop_assert_eq!(habit.last_completed_date(), Some(day(len)));
        prop_assert_eq!(habit.log().len(), offsets.len());
    }
}
