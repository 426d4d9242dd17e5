//! Habit tracking: habits with a cadence and one check-in per day.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{require_text, CoreError, Result};
use crate::storage::database::{date_at, format_date, format_instant, instant_at};
use crate::storage::Database;
use crate::streak::{compute_streak, Cadence, ReferenceClock};

pub const HABIT_TITLE_MAX: usize = 100;

/// Days shown by [`HabitDb::habit_history`] when not specified.
pub const DEFAULT_HISTORY_DAYS: u32 = 90;

/// Longest window [`HabitDb::habit_history`] accepts, about ten years.
pub const MAX_HISTORY_DAYS: u32 = 3660;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub cadence: Cadence,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub cadence: Cadence,
    pub icon: Option<String>,
    pub color: Option<String>,
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
}

impl NewHabit {
    pub fn daily(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            cadence: Cadence::Daily,
            icon: None,
            color: None,
            start_date: None,
        }
    }
}

/// Partial habit update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub cadence: Option<Cadence>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
}

/// Result of a check-in toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogToggle {
    Logged,
    Unlogged,
}

/// A habit with its current-period status, streak and logs (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSummary {
    #[serde(flatten)]
    pub habit: Habit,
    pub completed: bool,
    pub streak: u32,
    pub logs: Vec<NaiveDate>,
}

impl HabitSummary {
    pub fn from_logs(habit: Habit, mut logs: Vec<NaiveDate>, today: NaiveDate) -> Self {
        logs.sort_unstable_by(|a, b| b.cmp(a));
        logs.dedup();
        let completed = logs
            .iter()
            .any(|d| *d <= today && habit.cadence.period_contains(*d, today));
        let streak = compute_streak(logs.iter().copied(), habit.cadence, today);
        Self {
            habit,
            completed,
            streak,
            logs,
        }
    }
}

/// One cell of the history heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDay {
    pub date: NaiveDate,
    pub logged: bool,
}

fn parse_cadence(cadence_str: &str) -> Cadence {
    match cadence_str {
        "WEEKLY" => Cadence::Weekly,
        "MONTHLY" => Cadence::Monthly,
        _ => Cadence::Daily,
    }
}

fn format_cadence(cadence: Cadence) -> &'static str {
    match cadence {
        Cadence::Daily => "DAILY",
        Cadence::Weekly => "WEEKLY",
        Cadence::Monthly => "MONTHLY",
    }
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

const HABIT_FIELDS: &str =
    "id, owner_id, title, description, cadence, icon, color, start_date, created_at, updated_at";

fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
    let cadence: String = row.get(4)?;
    Ok(Habit {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        cadence: parse_cadence(&cadence),
        icon: row.get(5)?,
        color: row.get(6)?,
        start_date: date_at(row, 7)?,
        created_at: instant_at(row, 8)?,
        updated_at: instant_at(row, 9)?,
    })
}

fn find_habit(conn: &Connection, owner_id: &str, habit_id: &str) -> Result<Habit> {
    conn.query_row(
        &format!("SELECT {HABIT_FIELDS} FROM habits WHERE id = ?1 AND owner_id = ?2"),
        params![habit_id, owner_id],
        row_to_habit,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("habit", habit_id))
}

fn logs_of(conn: &Connection, habit_id: &str) -> Result<Vec<NaiveDate>> {
    let mut stmt =
        conn.prepare_cached("SELECT date FROM habit_logs WHERE habit_id = ?1 ORDER BY date DESC")?;
    let dates = stmt
        .query_map(params![habit_id], |row| date_at(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dates)
}

/// Upsert in place; a REPLACE would cascade-delete the habit's logs.
fn save_habit(conn: &Connection, habit: &Habit) -> Result<()> {
    conn.execute(
        "INSERT INTO habits (
            id, owner_id, title, description, cadence, icon, color,
            start_date, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            cadence = excluded.cadence,
            icon = excluded.icon,
            color = excluded.color,
            start_date = excluded.start_date,
            updated_at = excluded.updated_at",
        params![
            habit.id,
            habit.owner_id,
            habit.title,
            habit.description,
            format_cadence(habit.cadence),
            habit.icon,
            habit.color,
            format_date(habit.start_date),
            format_instant(habit.created_at),
            format_instant(habit.updated_at),
        ],
    )?;
    Ok(())
}

/// Habits and check-ins for one owner.
pub struct HabitDb<'a> {
    db: &'a Database,
    owner_id: String,
    clock: ReferenceClock,
}

impl<'a> HabitDb<'a> {
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

    pub fn create_habit(&self, new_habit: NewHabit) -> Result<Habit> {
        let title = require_text("habit title", &new_habit.title, HABIT_TITLE_MAX)?;
        let now = Utc::now();
        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            owner_id: self.owner_id.clone(),
            title,
            description: clean_optional(new_habit.description),
            cadence: new_habit.cadence,
            icon: clean_optional(new_habit.icon),
            color: clean_optional(new_habit.color),
            start_date: new_habit
                .start_date
                .unwrap_or_else(|| self.clock.date_of(now)),
            created_at: now,
            updated_at: now,
        };
        save_habit(self.db.conn(), &habit)?;
        info!(habit_id = %habit.id, cadence = habit.cadence.as_str(), "created habit");
        Ok(habit)
    }

    pub fn get_habit(&self, habit_id: &str) -> Result<Habit> {
        find_habit(self.db.conn(), &self.owner_id, habit_id)
    }

    pub fn update_habit(&self, habit_id: &str, patch: HabitPatch) -> Result<Habit> {
        let conn = self.db.conn();
        let mut habit = find_habit(conn, &self.owner_id, habit_id)?;

        if let Some(title) = patch.title {
            habit.title = require_text("habit title", &title, HABIT_TITLE_MAX)?;
        }
        if let Some(description) = patch.description {
            habit.description = clean_optional(description);
        }
        if let Some(cadence) = patch.cadence {
            habit.cadence = cadence;
        }
        if let Some(icon) = patch.icon {
            habit.icon = clean_optional(icon);
        }
        if let Some(color) = patch.color {
            habit.color = clean_optional(color);
        }
        if let Some(start_date) = patch.start_date {
            habit.start_date = start_date;
        }
        habit.updated_at = Utc::now();

        save_habit(conn, &habit)?;
        info!(habit_id, "updated habit");
        Ok(habit)
    }

    /// Delete a habit and all of its logs.
    pub fn delete_habit(&self, habit_id: &str) -> Result<()> {
        let removed = self.db.conn().execute(
            "DELETE FROM habits WHERE id = ?1 AND owner_id = ?2",
            params![habit_id, self.owner_id],
        )?;
        if removed == 0 {
            return Err(CoreError::not_found("habit", habit_id));
        }
        info!(habit_id, "deleted habit");
        Ok(())
    }

    /// Check in on `date`, or undo the check-in if one exists.
    pub fn toggle_habit_log(&self, habit_id: &str, date: NaiveDate) -> Result<LogToggle> {
        let outcome = self.db.transaction(|conn| {
            find_habit(conn, &self.owner_id, habit_id)?;
            let removed = conn.execute(
                "DELETE FROM habit_logs WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, format_date(date)],
            )?;
            if removed > 0 {
                return Ok(LogToggle::Unlogged);
            }
            conn.execute(
                "INSERT INTO habit_logs (id, habit_id, date) VALUES (?1, ?2, ?3)",
                params![Uuid::new_v4().to_string(), habit_id, format_date(date)],
            )?;
            Ok(LogToggle::Logged)
        })?;
        info!(habit_id, %date, ?outcome, "toggled habit log");
        Ok(outcome)
    }

    /// All habits, newest first, with status computed against `today`.
    pub fn list_habits(&self, today: NaiveDate) -> Result<Vec<HabitSummary>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {HABIT_FIELDS} FROM habits WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let habits = stmt
            .query_map(params![self.owner_id], row_to_habit)?
            .collect::<Result<Vec<_>, _>>()?;

        let summaries = habits
            .into_iter()
            .map(|habit| {
                let logs = logs_of(conn, &habit.id)?;
                Ok(HabitSummary::from_logs(habit, logs, today))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(count = summaries.len(), %today, "listed habits");
        Ok(summaries)
    }

    /// Per-day check-ins for the `days` days ending at `today`, oldest first.
    ///
    /// # Errors
    /// `InvalidInput` if `days` exceeds [`MAX_HISTORY_DAYS`] or the window
    /// runs past the calendar's range.
    pub fn habit_history(
        &self,
        habit_id: &str,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<HabitDay>> {
        if days > MAX_HISTORY_DAYS {
            return Err(CoreError::InvalidInput(format!(
                "history window of {days} days exceeds {MAX_HISTORY_DAYS}"
            )));
        }
        let conn = self.db.conn();
        find_habit(conn, &self.owner_id, habit_id)?;
        let logs = logs_of(conn, habit_id)?;

        (0..i64::from(days))
            .rev()
            .map(|back| {
                let date = today.checked_sub_signed(Duration::days(back)).ok_or_else(|| {
                    CoreError::InvalidInput(format!("{back} days before {today} is out of range"))
                })?;
                Ok(HabitDay {
                    date,
                    logged: logs.contains(&date),
                })
            })
            .collect()
    }

    /// Every check-in date of every habit of the owner.
    pub fn log_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT DISTINCT l.date FROM habit_logs l
             JOIN habits h ON h.id = l.habit_id
             WHERE h.owner_id = ?1 ORDER BY l.date DESC",
        )?;
        let dates = stmt
            .query_map(params![self.owner_id], |row| date_at(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn toggle_logs_then_unlogs() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits.create_habit(NewHabit::daily("Read")).unwrap();
        let today = day(2026, 3, 10);

        assert_eq!(habits.toggle_habit_log(&habit.id, today).unwrap(), LogToggle::Logged);
        assert_eq!(habits.toggle_habit_log(&habit.id, today).unwrap(), LogToggle::Unlogged);
        assert!(habits.log_dates().unwrap().is_empty());
    }

    #[test]
    fn daily_summary_has_streak_and_completion() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits.create_habit(NewHabit::daily("Read")).unwrap();
        let today = day(2026, 3, 10);
        for d in [day(2026, 3, 8), day(2026, 3, 9), today] {
            habits.toggle_habit_log(&habit.id, d).unwrap();
        }

        let summary = &habits.list_habits(today).unwrap()[0];
        assert!(summary.completed);
        assert_eq!(summary.streak, 3);
        assert_eq!(summary.logs, vec![today, day(2026, 3, 9), day(2026, 3, 8)]);

        let tomorrow = day(2026, 3, 11);
        let summary = &habits.list_habits(tomorrow).unwrap()[0];
        assert!(!summary.completed);
        assert_eq!(summary.streak, 3);
    }

    #[test]
    fn weekly_summary_counts_weeks() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits
            .create_habit(NewHabit {
                cadence: Cadence::Weekly,
                ..NewHabit::daily("Long run")
            })
            .unwrap();
        // Sunday-start weeks: 03-01 and 03-08 begin separate weeks.
        for d in [day(2026, 3, 2), day(2026, 3, 3), day(2026, 3, 8)] {
            habits.toggle_habit_log(&habit.id, d).unwrap();
        }
        let summary = &habits.list_habits(day(2026, 3, 10)).unwrap()[0];
        assert!(summary.completed);
        assert_eq!(summary.streak, 2);
    }

    #[test]
    fn history_covers_requested_days() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits.create_habit(NewHabit::daily("Stretch")).unwrap();
        let today = day(2026, 3, 10);
        habits.toggle_habit_log(&habit.id, day(2026, 3, 9)).unwrap();

        let history = habits.habit_history(&habit.id, 7, today).unwrap();
        assert_eq!(history.len(), 7);
        assert_eq!(history[0].date, day(2026, 3, 4));
        assert_eq!(history[6].date, today);
        assert!(history[5].logged);
        assert!(!history[6].logged);
    }

    #[test]
    fn history_rejects_oversized_window() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits.create_habit(NewHabit::daily("Stretch")).unwrap();

        assert!(matches!(
            habits.habit_history(&habit.id, 100_000_000, day(2026, 3, 10)),
            Err(CoreError::InvalidInput(_))
        ));
        let longest = habits
            .habit_history(&habit.id, MAX_HISTORY_DAYS, day(2026, 3, 10))
            .unwrap();
        assert_eq!(longest.len(), MAX_HISTORY_DAYS as usize);

        let near_min = NaiveDate::MIN + Duration::days(10);
        assert!(matches!(
            habits.habit_history(&habit.id, 30, near_min),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn delete_cascades_logs() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits.create_habit(NewHabit::daily("Read")).unwrap();
        habits.toggle_habit_log(&habit.id, day(2026, 3, 10)).unwrap();
        habits.delete_habit(&habit.id).unwrap();

        let logs: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM habit_logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(logs, 0);
        assert!(matches!(
            habits.delete_habit(&habit.id),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn update_changes_fields_and_validates() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits
            .create_habit(NewHabit {
                icon: Some("book".into()),
                start_date: Some(day(2026, 1, 1)),
                ..NewHabit::daily("Read")
            })
            .unwrap();
        assert_eq!(habit.start_date, day(2026, 1, 1));

        let updated = habits
            .update_habit(
                &habit.id,
                HabitPatch {
                    cadence: Some(Cadence::Monthly),
                    icon: Some(None),
                    ..HabitPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.cadence, Cadence::Monthly);
        assert_eq!(updated.icon, None);
        assert_eq!(habits.get_habit(&habit.id).unwrap().cadence, Cadence::Monthly);

        let too_long = HabitPatch {
            title: Some("x".repeat(101)),
            ..HabitPatch::default()
        };
        assert!(habits.update_habit(&habit.id, too_long).is_err());
    }

    #[test]
    fn update_keeps_logs() {
        let db = Database::open_memory().unwrap();
        let habits = HabitDb::new(&db, "local");
        let habit = habits.create_habit(NewHabit::daily("Walk")).unwrap();
        habits.toggle_habit_log(&habit.id, day(2026, 3, 9)).unwrap();

        let rename = HabitPatch {
            title: Some("Long walk".into()),
            ..HabitPatch::default()
        };
        habits.update_habit(&habit.id, rename).unwrap();
        assert_eq!(habits.log_dates().unwrap(), vec![day(2026, 3, 9)]);
    }

    #[test]
    fn other_owner_cannot_log() {
        let db = Database::open_memory().unwrap();
        let habit = HabitDb::new(&db, "alice")
            .create_habit(NewHabit::daily("Read"))
            .unwrap();
        let bob = HabitDb::new(&db, "bob");
        assert!(bob.toggle_habit_log(&habit.id, day(2026, 3, 10)).is_err());
        assert!(bob.list_habits(day(2026, 3, 10)).unwrap().is_empty());
    }
}
