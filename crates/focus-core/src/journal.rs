//! Daily journal: at most one entry per owner and date.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, Result, ValidationError};
use crate::storage::database::{date_at, format_date, format_instant, instant_at};
use crate::storage::Database;

pub const DEFAULT_RECENT_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub owner_id: String,
    pub date: NaiveDate,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ENTRY_FIELDS: &str = "id, owner_id, date, content, created_at, updated_at";

fn row_to_entry(row: &rusqlite::Row) -> Result<JournalEntry, rusqlite::Error> {
    Ok(JournalEntry {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        date: date_at(row, 2)?,
        content: row.get(3)?,
        created_at: instant_at(row, 4)?,
        updated_at: instant_at(row, 5)?,
    })
}

fn find_by_date(conn: &Connection, owner_id: &str, date: NaiveDate) -> Result<Option<JournalEntry>> {
    Ok(conn
        .query_row(
            &format!("SELECT {ENTRY_FIELDS} FROM journal_entries WHERE owner_id = ?1 AND date = ?2"),
            params![owner_id, format_date(date)],
            row_to_entry,
        )
        .optional()?)
}

pub struct JournalDb<'a> {
    db: &'a Database,
    owner_id: String,
}

impl<'a> JournalDb<'a> {
    pub fn new(db: &'a Database, owner_id: impl Into<String>) -> Self {
        Self {
            db,
            owner_id: owner_id.into(),
        }
    }

    /// Write the entry for `date`, replacing the content of an existing one.
    /// The entry keeps its date and creation time on update.
    pub fn upsert_entry(&self, date: NaiveDate, content: &str) -> Result<JournalEntry> {
        if content.trim().is_empty() {
            return Err(ValidationError::Empty { field: "content" }.into());
        }
        let content = content.trim_end().to_string();
        let now = Utc::now();

        let entry = self.db.transaction(|conn| match find_by_date(conn, &self.owner_id, date)? {
            Some(mut entry) => {
                entry.content = content;
                entry.updated_at = now;
                conn.execute(
                    "UPDATE journal_entries SET content = ?1, updated_at = ?2 WHERE id = ?3",
                    params![entry.content, format_instant(now), entry.id],
                )?;
                Ok(entry)
            }
            None => {
                let entry = JournalEntry {
                    id: Uuid::new_v4().to_string(),
                    owner_id: self.owner_id.clone(),
                    date,
                    content,
                    created_at: now,
                    updated_at: now,
                };
                conn.execute(
                    "INSERT INTO journal_entries (id, owner_id, date, content, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        entry.id,
                        entry.owner_id,
                        format_date(entry.date),
                        entry.content,
                        format_instant(now),
                        format_instant(now),
                    ],
                )?;
                Ok(entry)
            }
        })?;
        info!(entry_id = %entry.id, %date, "saved journal entry");
        Ok(entry)
    }

    pub fn entry_by_date(&self, date: NaiveDate) -> Result<Option<JournalEntry>> {
        find_by_date(self.db.conn(), &self.owner_id, date)
    }

    /// Entries, newest date first.
    pub fn recent_entries(&self, limit: usize) -> Result<Vec<JournalEntry>> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {ENTRY_FIELDS} FROM journal_entries WHERE owner_id = ?1
             ORDER BY date DESC LIMIT ?2"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map(params![self.owner_id, limit], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_entry(&self, entry_id: &str) -> Result<()> {
        let removed = self.db.conn().execute(
            "DELETE FROM journal_entries WHERE id = ?1 AND owner_id = ?2",
            params![entry_id, self.owner_id],
        )?;
        if removed == 0 {
            return Err(CoreError::not_found("journal entry", entry_id));
        }
        info!(entry_id, "deleted journal entry");
        Ok(())
    }

    /// Dates that have an entry, oldest first.
    pub fn entry_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT date FROM journal_entries WHERE owner_id = ?1 ORDER BY date")?;
        let dates = stmt
            .query_map(params![self.owner_id], |row| date_at(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dates)
    }
}
