//! Property tests for the streak engine.

use chrono::{Duration, NaiveDate};
use focus_core::streak::{
    compute_streak, daily_streak, productivity_streak, ActivityEvent, ActivityKind, Cadence,
};
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn days_ago(n: i64) -> NaiveDate {
    today() - Duration::days(n)
}

/// Offsets in days before today; 0 is today.
fn arb_offsets() -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(0i64..60, 0..40)
}

proptest! {
    #[test]
    fn activity_today_gives_at_least_one(offsets in arb_offsets()) {
        let mut dates: Vec<NaiveDate> = offsets.iter().map(|o| days_ago(*o)).collect();
        dates.push(today());
        prop_assert!(daily_streak(dates, today()) >= 1);
    }

    #[test]
    fn stale_activity_gives_zero(offsets in proptest::collection::vec(2i64..60, 0..40)) {
        let dates: Vec<NaiveDate> = offsets.iter().map(|o| days_ago(*o)).collect();
        prop_assert_eq!(daily_streak(dates, today()), 0);
    }

    #[test]
    fn order_and_duplicates_do_not_matter(offsets in arb_offsets()) {
        let dates: Vec<NaiveDate> = offsets.iter().map(|o| days_ago(*o)).collect();
        let mut shuffled = dates.clone();
        shuffled.reverse();
        shuffled.extend(dates.iter().copied());
        prop_assert_eq!(daily_streak(dates, today()), daily_streak(shuffled, today()));
    }

    #[test]
    fn unbroken_run_counts_its_length(len in 1i64..40, start in 0i64..2) {
        let dates: Vec<NaiveDate> = (start..start + len).map(days_ago).collect();
        prop_assert_eq!(daily_streak(dates, today()), len as u32);
    }

    #[test]
    fn streak_never_exceeds_distinct_days(offsets in arb_offsets()) {
        let dates: Vec<NaiveDate> = offsets.iter().map(|o| days_ago(*o)).collect();
        let mut distinct = dates.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert!(daily_streak(dates, today()) as usize <= distinct.len());
    }

    #[test]
    fn period_count_bounded_by_daily_count(offsets in arb_offsets()) {
        let dates: Vec<NaiveDate> = offsets.iter().map(|o| days_ago(*o)).collect();
        let mut distinct = dates.clone();
        distinct.sort();
        distinct.dedup();
        let weekly = compute_streak(dates.clone(), Cadence::Weekly, today());
        let monthly = compute_streak(dates, Cadence::Monthly, today());
        prop_assert!(weekly as usize <= distinct.len());
        prop_assert!(monthly <= 3);
    }
}

#[test]
fn three_consecutive_days_ending_today() {
    let dates = vec![days_ago(0), days_ago(1), days_ago(2)];
    assert_eq!(compute_streak(dates, Cadence::Daily, today()), 3);
}

#[test]
fn gap_breaks_the_chain() {
    let dates = vec![days_ago(0), days_ago(2), days_ago(3)];
    assert_eq!(compute_streak(dates, Cadence::Daily, today()), 1);
}

#[test]
fn yesterday_keeps_streak_alive() {
    let dates = vec![days_ago(1), days_ago(2)];
    assert_eq!(compute_streak(dates, Cadence::Daily, today()), 2);
}

#[test]
fn future_dates_are_ignored() {
    let dates = vec![today() + Duration::days(1), days_ago(0)];
    assert_eq!(compute_streak(dates, Cadence::Daily, today()), 1);
}

#[test]
fn productivity_streak_merges_sources() {
    let event = |n: i64, kind| ActivityEvent {
        owner_id: "local".into(),
        occurred_on: days_ago(n),
        kind,
    };
    let events = vec![
        event(0, ActivityKind::JournalEntry),
        event(1, ActivityKind::FocusSession),
        event(1, ActivityKind::HabitLog),
        event(2, ActivityKind::HabitLog),
        event(4, ActivityKind::JournalEntry),
    ];
    assert_eq!(productivity_streak(&events, today()), 3);
}
