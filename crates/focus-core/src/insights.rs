//! Cross-feature productivity summary.

use chrono::NaiveDate;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::habit::HabitDb;
use crate::journal::JournalDb;
use crate::pomodoro::SessionDb;
use crate::storage::Database;
use crate::streak::{productivity_streak, ActivityEvent, ActivityKind, ReferenceClock};

/// Column title that marks its tasks as done.
pub const DONE_COLUMN_TITLE: &str = "done";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductivityStats {
    pub completed_tasks: u64,
    /// Finalized focus time, rounded to one decimal.
    pub focus_hours: f64,
    pub total_sessions: u64,
    /// Consecutive days with a habit check-in, focus session or journal entry.
    pub streak: u32,
}

/// Hours with one decimal place.
pub fn round_hours(seconds: i64) -> f64 {
    (seconds as f64 / 3600.0 * 10.0).round() / 10.0
}

pub struct InsightsDb<'a> {
    db: &'a Database,
    owner_id: String,
    clock: ReferenceClock,
}

impl<'a> InsightsDb<'a> {
    pub fn new(db: &'a Database, owner_id: impl Into<String>) -> Self {
        Self {
            db,
            owner_id: owner_id.into(),
            clock: ReferenceClock::default(),
        }
    }

    pub fn with_clock(mut self, clock: ReferenceClock) -> Self {
        self.clock = clock;
        self
    }

    /// Tasks with a completion time or sitting in a column titled "Done".
    pub fn completed_task_count(&self) -> Result<u64> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COUNT(*) FROM tasks t
             JOIN columns c ON c.id = t.column_id
             JOIN boards b ON b.id = c.board_id
             WHERE b.owner_id = ?1
               AND (t.completed_at IS NOT NULL OR lower(trim(c.title)) = ?2)",
            params![self.owner_id, DONE_COLUMN_TITLE],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Every dated activity of the owner across habits, sessions and journal.
    pub fn activity(&self) -> Result<Vec<ActivityEvent>> {
        let event = |kind: ActivityKind| {
            let owner_id = self.owner_id.clone();
            move |occurred_on: NaiveDate| ActivityEvent {
                owner_id: owner_id.clone(),
                occurred_on,
                kind,
            }
        };

        let habits = HabitDb::new(self.db, &self.owner_id).log_dates()?;
        let sessions = SessionDb::new(self.db, &self.owner_id)
            .with_clock(self.clock)
            .session_dates()?;
        let journal = JournalDb::new(self.db, &self.owner_id).entry_dates()?;

        let mut events: Vec<ActivityEvent> = habits
            .into_iter()
            .map(event(ActivityKind::HabitLog))
            .collect();
        events.extend(sessions.into_iter().map(event(ActivityKind::FocusSession)));
        events.extend(journal.into_iter().map(event(ActivityKind::JournalEntry)));
        Ok(events)
    }

    pub fn productivity_stats(&self, today: NaiveDate) -> Result<ProductivityStats> {
        let totals = SessionDb::new(self.db, &self.owner_id).totals()?;
        let activity = self.activity()?;
        let stats = ProductivityStats {
            completed_tasks: self.completed_task_count()?,
            focus_hours: round_hours(totals.total_seconds),
            total_sessions: totals.sessions,
            streak: productivity_streak(&activity, today),
        };
        debug!(?stats, %today, "computed productivity stats");
        Ok(stats)
    }
}
