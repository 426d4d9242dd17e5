//! Recorded focus sessions.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::storage::database::{format_instant, instant_at, opt_instant_at};
use crate::storage::Database;
use crate::streak::ReferenceClock;

/// Abandoned sessions shorter than this are discarded.
pub const MIN_KEPT_SECONDS: i64 = 60;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSession {
    pub id: String,
    pub owner_id: String,
    pub task_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
}

impl PomodoroSession {
    pub fn is_finalized(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A finalized session with the title of its task, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSession {
    #[serde(flatten)]
    pub session: PomodoroSession,
    pub task_title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonOutcome {
    /// Long enough to keep; finalized with its partial duration.
    Kept,
    /// Too short; deleted.
    Discarded,
    /// No such session.
    Missing,
}

/// Count and summed duration of finalized sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub sessions: u64,
    pub total_seconds: i64,
}

const SESSION_FIELDS: &str = "s.id, s.owner_id, s.task_id, s.started_at, s.completed_at, s.duration_seconds";

fn row_to_session(row: &rusqlite::Row) -> Result<PomodoroSession, rusqlite::Error> {
    Ok(PomodoroSession {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        task_id: row.get(2)?,
        started_at: instant_at(row, 3)?,
        completed_at: opt_instant_at(row, 4)?,
        duration_seconds: row.get(5)?,
    })
}

fn find_session(
    conn: &Connection,
    owner_id: &str,
    session_id: &str,
) -> Result<Option<PomodoroSession>> {
    Ok(conn
        .query_row(
            &format!("SELECT {SESSION_FIELDS} FROM pomodoro_sessions s WHERE s.id = ?1 AND s.owner_id = ?2"),
            params![session_id, owner_id],
            row_to_session,
        )
        .optional()?)
}

/// Whole seconds between start and `now`, never negative.
fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().max(0)
}

/// Focus sessions for one owner.
pub struct SessionDb<'a> {
    db: &'a Database,
    owner_id: String,
    clock: ReferenceClock,
}

impl<'a> SessionDb<'a> {
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

    /// Open a session with zero duration, optionally linked to a task.
    pub fn start_session(
        &self,
        task_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PomodoroSession> {
        let conn = self.db.conn();
        if let Some(task_id) = task_id {
            let owned: Option<String> = conn
                .query_row(
                    "SELECT t.id FROM tasks t
                     JOIN columns c ON c.id = t.column_id
                     JOIN boards b ON b.id = c.board_id
                     WHERE t.id = ?1 AND b.owner_id = ?2",
                    params![task_id, self.owner_id],
                    |row| row.get(0),
                )
                .optional()?;
            if owned.is_none() {
                return Err(CoreError::not_found("task", task_id));
            }
        }

        let session = PomodoroSession {
            id: Uuid::new_v4().to_string(),
            owner_id: self.owner_id.clone(),
            task_id: task_id.map(str::to_string),
            started_at: now,
            completed_at: None,
            duration_seconds: 0,
        };
        conn.execute(
            "INSERT INTO pomodoro_sessions (id, owner_id, task_id, started_at, completed_at, duration_seconds)
             VALUES (?1, ?2, ?3, ?4, NULL, 0)",
            params![
                session.id,
                session.owner_id,
                session.task_id,
                format_instant(session.started_at),
            ],
        )?;
        info!(session_id = %session.id, task_id = ?session.task_id, "started session");
        Ok(session)
    }

    fn finalize(&self, conn: &Connection, session: &mut PomodoroSession, now: DateTime<Utc>) -> Result<()> {
        session.duration_seconds = elapsed_seconds(session.started_at, now);
        session.completed_at = Some(now);
        conn.execute(
            "UPDATE pomodoro_sessions SET duration_seconds = ?1, completed_at = ?2
             WHERE id = ?3 AND owner_id = ?4",
            params![
                session.duration_seconds,
                format_instant(now),
                session.id,
                self.owner_id,
            ],
        )?;
        Ok(())
    }

    /// Finalize a session with its elapsed duration.
    ///
    /// # Errors
    /// `NotFound` if the session does not exist for this owner.
    pub fn complete_session(&self, session_id: &str, now: DateTime<Utc>) -> Result<PomodoroSession> {
        let conn = self.db.conn();
        let mut session = find_session(conn, &self.owner_id, session_id)?
            .ok_or_else(|| CoreError::not_found("session", session_id))?;
        self.finalize(conn, &mut session, now)?;
        info!(session_id, duration_seconds = session.duration_seconds, "completed session");
        Ok(session)
    }

    /// Stop a session early: keep it if it ran at least a minute, else delete it.
    pub fn abandon_session(&self, session_id: &str, now: DateTime<Utc>) -> Result<AbandonOutcome> {
        let conn = self.db.conn();
        let Some(mut session) = find_session(conn, &self.owner_id, session_id)? else {
            debug!(session_id, "abandon ignored, no such session");
            return Ok(AbandonOutcome::Missing);
        };

        let outcome = if elapsed_seconds(session.started_at, now) >= MIN_KEPT_SECONDS {
            self.finalize(conn, &mut session, now)?;
            AbandonOutcome::Kept
        } else {
            conn.execute(
                "DELETE FROM pomodoro_sessions WHERE id = ?1 AND owner_id = ?2",
                params![session_id, self.owner_id],
            )?;
            AbandonOutcome::Discarded
        };
        info!(session_id, ?outcome, "abandoned session");
        Ok(outcome)
    }

    /// Finalized sessions, newest start first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<RecentSession>> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {SESSION_FIELDS}, t.title
             FROM pomodoro_sessions s
             LEFT JOIN tasks t ON t.id = s.task_id
             WHERE s.owner_id = ?1 AND s.completed_at IS NOT NULL
             ORDER BY s.started_at DESC, s.rowid DESC
             LIMIT ?2"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sessions = stmt
            .query_map(params![self.owner_id, limit], |row| {
                Ok(RecentSession {
                    session: row_to_session(row)?,
                    task_title: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Start dates (reference zone) of finalized sessions.
    pub fn session_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT started_at FROM pomodoro_sessions
             WHERE owner_id = ?1 AND completed_at IS NOT NULL",
        )?;
        let instants = stmt
            .query_map(params![self.owner_id], |row| instant_at(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut dates: Vec<NaiveDate> = instants.into_iter().map(|i| self.clock.date_of(i)).collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    pub fn totals(&self) -> Result<SessionTotals> {
        let (sessions, total_seconds): (i64, i64) = self.db.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_seconds), 0) FROM pomodoro_sessions
             WHERE owner_id = ?1 AND completed_at IS NOT NULL",
            params![self.owner_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(SessionTotals {
            sessions: sessions.max(0) as u64,
            total_seconds,
        })
    }
}
