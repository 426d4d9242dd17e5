//! Calendar events.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{require_text, CoreError, Result, ValidationError};
use crate::storage::database::{format_instant, instant_at};
use crate::storage::Database;

pub const EVENT_TITLE_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
}

/// Partial event update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }
    Ok(())
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

const EVENT_FIELDS: &str =
    "id, owner_id, title, description, location, start_at, end_at, all_day, created_at, updated_at";

fn row_to_event(row: &rusqlite::Row) -> Result<CalendarEvent, rusqlite::Error> {
    Ok(CalendarEvent {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        start: instant_at(row, 5)?,
        end: instant_at(row, 6)?,
        all_day: row.get(7)?,
        created_at: instant_at(row, 8)?,
        updated_at: instant_at(row, 9)?,
    })
}

fn save_event(conn: &Connection, event: &CalendarEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO events (
            id, owner_id, title, description, location, start_at, end_at,
            all_day, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            location = excluded.location,
            start_at = excluded.start_at,
            end_at = excluded.end_at,
            all_day = excluded.all_day,
            updated_at = excluded.updated_at",
        params![
            event.id,
            event.owner_id,
            event.title,
            event.description,
            event.location,
            format_instant(event.start),
            format_instant(event.end),
            event.all_day,
            format_instant(event.created_at),
            format_instant(event.updated_at),
        ],
    )?;
    Ok(())
}

pub struct CalendarDb<'a> {
    db: &'a Database,
    owner_id: String,
}

impl<'a> CalendarDb<'a> {
    pub fn new(db: &'a Database, owner_id: impl Into<String>) -> Self {
        Self {
            db,
            owner_id: owner_id.into(),
        }
    }

    pub fn create_event(&self, new_event: NewEvent) -> Result<CalendarEvent> {
        let title = require_text("event title", &new_event.title, EVENT_TITLE_MAX)?;
        check_range(new_event.start, new_event.end)?;
        let now = Utc::now();
        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            owner_id: self.owner_id.clone(),
            title,
            description: clean_optional(new_event.description),
            location: clean_optional(new_event.location),
            start: new_event.start,
            end: new_event.end,
            all_day: new_event.all_day,
            created_at: now,
            updated_at: now,
        };
        save_event(self.db.conn(), &event)?;
        info!(event_id = %event.id, start = %event.start, "created event");
        Ok(event)
    }

    pub fn get_event(&self, event_id: &str) -> Result<CalendarEvent> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {EVENT_FIELDS} FROM events WHERE id = ?1 AND owner_id = ?2"),
                params![event_id, self.owner_id],
                row_to_event,
            )
            .optional()?
            .ok_or_else(|| CoreError::not_found("event", event_id))
    }

    pub fn update_event(&self, event_id: &str, patch: EventPatch) -> Result<CalendarEvent> {
        let mut event = self.get_event(event_id)?;
        if let Some(title) = patch.title {
            event.title = require_text("event title", &title, EVENT_TITLE_MAX)?;
        }
        if let Some(description) = patch.description {
            event.description = clean_optional(description);
        }
        if let Some(location) = patch.location {
            event.location = clean_optional(location);
        }
        if let Some(start) = patch.start {
            event.start = start;
        }
        if let Some(end) = patch.end {
            event.end = end;
        }
        if let Some(all_day) = patch.all_day {
            event.all_day = all_day;
        }
        check_range(event.start, event.end)?;
        event.updated_at = Utc::now();

        save_event(self.db.conn(), &event)?;
        info!(event_id, "updated event");
        Ok(event)
    }

    pub fn delete_event(&self, event_id: &str) -> Result<()> {
        let removed = self.db.conn().execute(
            "DELETE FROM events WHERE id = ?1 AND owner_id = ?2",
            params![event_id, self.owner_id],
        )?;
        if removed == 0 {
            return Err(CoreError::not_found("event", event_id));
        }
        info!(event_id, "deleted event");
        Ok(())
    }

    /// Events lying entirely inside `[start, end]`, latest start first.
    pub fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        check_range(start, end)?;
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {EVENT_FIELDS} FROM events
             WHERE owner_id = ?1 AND start_at >= ?2 AND end_at <= ?3
             ORDER BY start_at DESC, rowid DESC"
        ))?;
        let events = stmt
            .query_map(
                params![self.owner_id, format_instant(start), format_instant(end)],
                row_to_event,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = events.len(), %start, %end, "queried events");
        Ok(events)
    }
}
