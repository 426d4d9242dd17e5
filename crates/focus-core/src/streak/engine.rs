//! Streak computation over calendar dates.
//!
//! ## Daily cadence
//!
//! ```text
//! dates (deduped, <= today, newest first)
//!   anchor = newest; dead unless anchor is today or yesterday
//!   walk back while each date is exactly one day before the cursor
//! ```
//!
//! Weekly and monthly cadences report the number of distinct periods with at
//! least one event. That is a count, not a consecutive-period streak.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Qualifying period of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    /// Identifier of the period containing `date`.
    ///
    /// Weeks start on Sunday.
    fn period_key(self, date: NaiveDate) -> (i32, u32) {
        match self {
            Cadence::Daily => (date.year(), date.ordinal()),
            Cadence::Weekly => {
                let start = week_start(date);
                (start.year(), start.ordinal())
            }
            Cadence::Monthly => (date.year(), date.month()),
        }
    }

    /// Whether `date` falls in the same period as `today`.
    pub fn period_contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        self.period_key(date) == self.period_key(today)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Daily => "Daily",
            Cadence::Weekly => "Weekly",
            Cadence::Monthly => "Monthly",
        }
    }
}

impl std::str::FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(format!("unknown cadence '{other}' (daily, weekly, monthly)")),
        }
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Source of an activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    HabitLog,
    FocusSession,
    JournalEntry,
}

/// "Something happened on this date" for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub owner_id: String,
    pub occurred_on: NaiveDate,
    pub kind: ActivityKind,
}

/// Compute the streak for `dates` under `cadence`, anchored at `today`.
pub fn compute_streak<I>(dates: I, cadence: Cadence, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    match cadence {
        Cadence::Daily => daily_streak(dates, today),
        Cadence::Weekly | Cadence::Monthly => period_count(dates, cadence, today),
    }
}

/// Consecutive days with activity ending today or yesterday.
///
/// Dates after `today` are ignored; they neither anchor nor break a streak.
pub fn daily_streak<I>(dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let unique: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let mut newest_first = unique.into_iter().rev().skip_while(|d| *d > today);

    let Some(anchor) = newest_first.next() else {
        return 0;
    };
    let yesterday = today - Duration::days(1);
    if anchor != today && anchor != yesterday {
        return 0;
    }

    let mut streak = 1;
    let mut cursor = anchor;
    for date in newest_first {
        if date == cursor - Duration::days(1) {
            streak += 1;
            cursor = date;
        } else if date >= cursor {
            // Duplicate or out-of-order date.
            continue;
        } else {
            break;
        }
    }
    streak
}

/// Number of distinct periods (up to and including today's) with activity.
pub fn period_count<I>(dates: I, cadence: Cadence, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates
        .into_iter()
        .filter(|d| *d <= today)
        .map(|d| cadence.period_key(d))
        .collect::<BTreeSet<_>>()
        .len() as u32
}

/// Cross-feature streak: habit check-ins, focus sessions and journal entries
/// all count towards the same daily chain.
pub fn productivity_streak(events: &[ActivityEvent], today: NaiveDate) -> u32 {
    daily_streak(events.iter().map(|e| e.occurred_on), today)
}
