//! Database schema migrations.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use indoc::indoc;
use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: boards, columns, tasks and the kv store.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS boards (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS columns (
            id          TEXT PRIMARY KEY,
            board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id           TEXT PRIMARY KEY,
            column_id    TEXT NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
            title        TEXT NOT NULL,
            description  TEXT,
            priority     TEXT NOT NULL DEFAULT 'MEDIUM',
            due_date     TEXT,
            tags         TEXT NOT NULL DEFAULT '[]',
            position     INTEGER NOT NULL,
            completed_at TEXT,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_boards_owner ON boards(owner_id);
        CREATE INDEX IF NOT EXISTS idx_columns_board ON columns(board_id, position);
        CREATE INDEX IF NOT EXISTS idx_tasks_column ON tasks(column_id, position);
    "})?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: habits, habit logs and pomodoro sessions.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS habits (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            title       TEXT NOT NULL,
            description TEXT,
            cadence     TEXT NOT NULL DEFAULT 'DAILY',
            icon        TEXT,
            color       TEXT,
            start_date  TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_logs (
            id        TEXT PRIMARY KEY,
            habit_id  TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            date      TEXT NOT NULL,
            UNIQUE (habit_id, date)
        );

        CREATE TABLE IF NOT EXISTS pomodoro_sessions (
            id               TEXT PRIMARY KEY,
            owner_id         TEXT NOT NULL,
            task_id          TEXT REFERENCES tasks(id) ON DELETE SET NULL,
            started_at       TEXT NOT NULL,
            completed_at     TEXT,
            duration_seconds INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_habits_owner ON habits(owner_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_owner_started ON pomodoro_sessions(owner_id, started_at);
    "})?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: journal entries and calendar events.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS journal_entries (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            date        TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            UNIQUE (owner_id, date)
        );

        CREATE TABLE IF NOT EXISTS events (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            title       TEXT NOT NULL,
            description TEXT,
            location    TEXT,
            start_at    TEXT NOT NULL,
            end_at      TEXT NOT NULL,
            all_day     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_owner_start ON events(owner_id, start_at);
    "})?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}
