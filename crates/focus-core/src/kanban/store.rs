//! SQLite-backed kanban storage.
//!
//! Every ordering mutation loads the affected lists, runs the reconciler and
//! writes the resulting [`ListOrder`]s inside a single transaction.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::{
    Board, BoardDetail, Column, ColumnWithTasks, NewTask, Priority, Task, TaskPatch,
    BOARD_NAME_MAX, COLUMN_TITLE_MAX, INITIAL_BOARD_NAME, TASK_TITLE_MAX,
};
use crate::error::{require_text, CoreError, Result};
use crate::ordering::{
    append_new_item, densify, is_dense, move_across_lists, normalize, reorder_within_list,
    BoardLayout, ListOrder, MoveIntent, Ordered,
};
use crate::storage::database::{
    date_at, format_date, format_instant, instant_at, opt_instant_at, write_list_order,
    OrderedTable,
};
use crate::storage::{Database, KanbanConfig};

// === Helper Functions ===

fn parse_priority(priority_str: &str) -> Priority {
    match priority_str {
        "LOW" => Priority::Low,
        "HIGH" => Priority::High,
        _ => Priority::Medium,
    }
}

fn format_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "LOW",
        Priority::Medium => "MEDIUM",
        Priority::High => "HIGH",
    }
}

/// Trim, drop blanks and duplicates, keep first-seen order.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

const BOARD_FIELDS: &str = "id, owner_id, name, created_at, updated_at";

const TASK_FIELDS: &str = "t.id, t.column_id, t.title, t.description, t.priority, t.due_date, \
     t.tags, t.position, t.completed_at, t.created_at, t.updated_at";

fn row_to_board(row: &rusqlite::Row) -> Result<Board, rusqlite::Error> {
    Ok(Board {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        created_at: instant_at(row, 3)?,
        updated_at: instant_at(row, 4)?,
    })
}

fn row_to_column(row: &rusqlite::Row) -> Result<Column, rusqlite::Error> {
    Ok(Column {
        id: row.get(0)?,
        board_id: row.get(1)?,
        title: row.get(2)?,
        order: row.get(3)?,
    })
}

fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let priority: String = row.get(4)?;
    let due_date = match row.get::<_, Option<String>>(5)? {
        Some(_) => Some(date_at(row, 5)?),
        None => None,
    };
    let tags_json: String = row.get(6)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: row.get(0)?,
        column_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority: parse_priority(&priority),
        due_date,
        tags,
        order: row.get(7)?,
        completed_at: opt_instant_at(row, 8)?,
        created_at: instant_at(row, 9)?,
        updated_at: instant_at(row, 10)?,
    })
}

fn find_board(conn: &Connection, owner_id: &str, board_id: &str) -> Result<Board> {
    conn.query_row(
        &format!("SELECT {BOARD_FIELDS} FROM boards WHERE id = ?1 AND owner_id = ?2"),
        params![board_id, owner_id],
        row_to_board,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("board", board_id))
}

fn find_column(conn: &Connection, owner_id: &str, column_id: &str) -> Result<Column> {
    conn.query_row(
        "SELECT c.id, c.board_id, c.title, c.position
         FROM columns c JOIN boards b ON b.id = c.board_id
         WHERE c.id = ?1 AND b.owner_id = ?2",
        params![column_id, owner_id],
        row_to_column,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("column", column_id))
}

fn find_task(conn: &Connection, owner_id: &str, task_id: &str) -> Result<Task> {
    conn.query_row(
        &format!(
            "SELECT {TASK_FIELDS}
             FROM tasks t
             JOIN columns c ON c.id = t.column_id
             JOIN boards b ON b.id = c.board_id
             WHERE t.id = ?1 AND b.owner_id = ?2"
        ),
        params![task_id, owner_id],
        row_to_task,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("task", task_id))
}

/// Columns of a board by stored position; ties keep insertion order.
fn columns_of(conn: &Connection, board_id: &str) -> Result<Vec<Column>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, board_id, title, position FROM columns
         WHERE board_id = ?1 ORDER BY position, rowid",
    )?;
    let columns = stmt
        .query_map(params![board_id], row_to_column)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Tasks of a column by stored position; ties keep insertion order.
fn tasks_of(conn: &Connection, column_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TASK_FIELDS} FROM tasks t
         WHERE t.column_id = ?1 ORDER BY t.position, t.rowid"
    ))?;
    let tasks = stmt
        .query_map(params![column_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

fn insert_column(conn: &Connection, column: &Column) -> Result<()> {
    conn.execute(
        "INSERT INTO columns (id, board_id, title, position) VALUES (?1, ?2, ?3, ?4)",
        params![column.id, column.board_id, column.title, column.order],
    )?;
    Ok(())
}

/// Insert or update in place. A REPLACE would delete the row first and null
/// the task link of its sessions.
fn save_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            id, column_id, title, description, priority, due_date, tags,
            position, completed_at, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(id) DO UPDATE SET
            column_id = excluded.column_id,
            title = excluded.title,
            description = excluded.description,
            priority = excluded.priority,
            due_date = excluded.due_date,
            tags = excluded.tags,
            position = excluded.position,
            completed_at = excluded.completed_at,
            updated_at = excluded.updated_at",
        params![
            task.id,
            task.column_id,
            task.title,
            task.description,
            format_priority(task.priority),
            task.due_date.map(format_date),
            serde_json::to_string(&task.tags)?,
            task.order,
            task.completed_at.map(format_instant),
            format_instant(task.created_at),
            format_instant(task.updated_at),
        ],
    )?;
    Ok(())
}

fn count_boards(conn: &Connection, owner_id: &str) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM boards WHERE owner_id = ?1",
        params![owner_id],
        |row| row.get(0),
    )?)
}

/// Kanban boards, columns and tasks for one owner.
pub struct KanbanDb<'a> {
    db: &'a Database,
    owner_id: String,
    default_columns: Vec<String>,
}

impl<'a> KanbanDb<'a> {
    pub fn new(db: &'a Database, owner_id: impl Into<String>) -> Self {
        Self {
            db,
            owner_id: owner_id.into(),
            default_columns: KanbanConfig::default().default_columns,
        }
    }

    /// Columns created with every new board.
    pub fn with_default_columns(mut self, titles: Vec<String>) -> Self {
        self.default_columns = titles;
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    // === Boards ===

    /// Create a board together with the default columns.
    pub fn create_board(&self, name: &str) -> Result<BoardDetail> {
        let name = require_text("board name", name, BOARD_NAME_MAX)?;
        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4().to_string(),
            owner_id: self.owner_id.clone(),
            name,
            created_at: now,
            updated_at: now,
        };

        self.db.transaction(|conn| {
            conn.execute(
                "INSERT INTO boards (id, owner_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    board.id,
                    board.owner_id,
                    board.name,
                    format_instant(board.created_at),
                    format_instant(board.updated_at),
                ],
            )?;

            let mut columns = Vec::with_capacity(self.default_columns.len());
            for title in &self.default_columns {
                let column = Column {
                    id: Uuid::new_v4().to_string(),
                    board_id: board.id.clone(),
                    title: require_text("column title", title, COLUMN_TITLE_MAX)?,
                    order: 0,
                };
                columns = append_new_item(columns, column);
            }
            for column in &columns {
                insert_column(conn, column)?;
            }
            Ok(())
        })?;

        info!(board_id = %board.id, name = %board.name, "created board");
        self.get_board(&board.id)
    }

    /// Boards of the owner, oldest first.
    pub fn list_boards(&self) -> Result<Vec<Board>> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {BOARD_FIELDS} FROM boards WHERE owner_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let boards = stmt
            .query_map(params![self.owner_id], row_to_board)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(boards)
    }

    pub fn get_board(&self, board_id: &str) -> Result<BoardDetail> {
        let conn = self.db.conn();
        let board = find_board(conn, &self.owner_id, board_id)?;
        let columns = columns_of(conn, board_id)?
            .into_iter()
            .map(|column| {
                let tasks = tasks_of(conn, &column.id)?;
                Ok(ColumnWithTasks { column, tasks })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(board_id, columns = columns.len(), "loaded board");
        Ok(BoardDetail { board, columns })
    }

    pub fn layout(&self, board_id: &str) -> Result<BoardLayout> {
        Ok(self.get_board(board_id)?.layout())
    }

    pub fn rename_board(&self, board_id: &str, name: &str) -> Result<Board> {
        let name = require_text("board name", name, BOARD_NAME_MAX)?;
        let changed = self.db.conn().execute(
            "UPDATE boards SET name = ?1, updated_at = ?2 WHERE id = ?3 AND owner_id = ?4",
            params![name, format_instant(Utc::now()), board_id, self.owner_id],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("board", board_id));
        }
        info!(board_id, name = %name, "renamed board");
        find_board(self.db.conn(), &self.owner_id, board_id)
    }

    /// Delete a board with its columns and tasks.
    ///
    /// # Errors
    /// `Conflict` if it is the owner's only board.
    pub fn delete_board(&self, board_id: &str) -> Result<()> {
        self.db.transaction(|conn| {
            find_board(conn, &self.owner_id, board_id)?;
            if count_boards(conn, &self.owner_id)? <= 1 {
                return Err(CoreError::Conflict(
                    "cannot delete the last remaining board".into(),
                ));
            }
            conn.execute("DELETE FROM boards WHERE id = ?1", params![board_id])?;
            Ok(())
        })?;
        info!(board_id, "deleted board");
        Ok(())
    }

    /// The owner's first board, creating `My Board` if there is none.
    pub fn ensure_initial_board(&self) -> Result<BoardDetail> {
        match self.list_boards()?.into_iter().next() {
            Some(board) => self.get_board(&board.id),
            None => {
                info!(owner_id = %self.owner_id, "no boards yet, creating initial board");
                self.create_board(INITIAL_BOARD_NAME)
            }
        }
    }

    // === Columns ===

    /// Append a column to a board.
    pub fn create_column(&self, board_id: &str, title: &str) -> Result<Column> {
        let title = require_text("column title", title, COLUMN_TITLE_MAX)?;
        let column = self.db.transaction(|conn| {
            find_board(conn, &self.owner_id, board_id)?;
            let column = Column {
                id: Uuid::new_v4().to_string(),
                board_id: board_id.to_string(),
                title,
                order: 0,
            };
            let columns = append_new_item(columns_of(conn, board_id)?, column);
            let column = columns.last().cloned().ok_or_else(|| {
                CoreError::InvalidInput("column list unexpectedly empty".into())
            })?;
            insert_column(conn, &column)?;
            Ok(column)
        })?;
        info!(board_id, column_id = %column.id, order = column.order, "created column");
        Ok(column)
    }

    pub fn rename_column(&self, column_id: &str, title: &str) -> Result<Column> {
        let title = require_text("column title", title, COLUMN_TITLE_MAX)?;
        let conn = self.db.conn();
        let mut column = find_column(conn, &self.owner_id, column_id)?;
        conn.execute(
            "UPDATE columns SET title = ?1 WHERE id = ?2",
            params![title, column_id],
        )?;
        column.title = title;
        info!(column_id, "renamed column");
        Ok(column)
    }

    /// Delete a column with its tasks and close the gap in the board.
    pub fn delete_column(&self, column_id: &str) -> Result<()> {
        let board_id = self.db.transaction(|conn| {
            let column = find_column(conn, &self.owner_id, column_id)?;
            conn.execute("DELETE FROM columns WHERE id = ?1", params![column_id])?;
            let mut remaining = columns_of(conn, &column.board_id)?;
            densify(&mut remaining);
            write_list_order(
                conn,
                OrderedTable::Columns,
                &ListOrder::of(column.board_id.clone(), &remaining),
            )?;
            Ok(column.board_id)
        })?;
        info!(column_id, board_id = %board_id, "deleted column");
        Ok(())
    }

    /// Move the column at `from` to `to` within a board (indices clamp).
    pub fn reorder_columns(&self, board_id: &str, from: usize, to: usize) -> Result<Vec<Column>> {
        let columns = self.db.transaction(|conn| {
            find_board(conn, &self.owner_id, board_id)?;
            let columns = reorder_within_list(columns_of(conn, board_id)?, from, to);
            write_list_order(
                conn,
                OrderedTable::Columns,
                &ListOrder::of(board_id, &columns),
            )?;
            Ok(columns)
        })?;
        info!(board_id, from, to, "reordered columns");
        Ok(columns)
    }

    // === Tasks ===

    /// Append a task to a column.
    pub fn create_task(&self, column_id: &str, new_task: NewTask) -> Result<Task> {
        let title = require_text("task title", &new_task.title, TASK_TITLE_MAX)?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            column_id: column_id.to_string(),
            title,
            description: clean_optional(new_task.description),
            priority: new_task.priority,
            due_date: new_task.due_date,
            tags: clean_tags(new_task.tags),
            order: 0,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let task = self.db.transaction(|conn| {
            find_column(conn, &self.owner_id, column_id)?;
            let tasks = append_new_item(tasks_of(conn, column_id)?, task);
            let task = tasks
                .last()
                .cloned()
                .ok_or_else(|| CoreError::InvalidInput("task list unexpectedly empty".into()))?;
            save_task(conn, &task)?;
            Ok(task)
        })?;
        info!(column_id, task_id = %task.id, order = task.order, "created task");
        Ok(task)
    }

    pub fn get_task(&self, task_id: &str) -> Result<Task> {
        find_task(self.db.conn(), &self.owner_id, task_id)
    }

    pub fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let conn = self.db.conn();
        let mut task = find_task(conn, &self.owner_id, task_id)?;
        if patch.is_empty() {
            return Ok(task);
        }

        if let Some(title) = patch.title {
            task.title = require_text("task title", &title, TASK_TITLE_MAX)?;
        }
        if let Some(description) = patch.description {
            task.description = clean_optional(description);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = patch.tags {
            task.tags = clean_tags(tags);
        }
        task.updated_at = Utc::now();

        save_task(conn, &task)?;
        info!(task_id, "updated task");
        Ok(task)
    }

    /// Mark a task done or not done. Re-completing keeps the first timestamp.
    pub fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<Task> {
        let conn = self.db.conn();
        let mut task = find_task(conn, &self.owner_id, task_id)?;
        let now = Utc::now();
        task.completed_at = if completed {
            task.completed_at.or(Some(now))
        } else {
            None
        };
        task.updated_at = now;
        save_task(conn, &task)?;
        info!(task_id, completed, "set task completion");
        Ok(task)
    }

    /// Delete a task and close the gap in its column.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        self.db.transaction(|conn| {
            let task = find_task(conn, &self.owner_id, task_id)?;
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            let mut remaining = tasks_of(conn, &task.column_id)?;
            densify(&mut remaining);
            write_list_order(
                conn,
                OrderedTable::Tasks,
                &ListOrder::of(task.column_id.clone(), &remaining),
            )
        })?;
        info!(task_id, "deleted task");
        Ok(())
    }

    /// Move a task to `dest_index` of `dest_column_id` (same or other column
    /// of the same board). The index clamps to the destination length.
    pub fn move_task(&self, task_id: &str, dest_column_id: &str, dest_index: usize) -> Result<Task> {
        let task = self.db.transaction(|conn| {
            let task = find_task(conn, &self.owner_id, task_id)?;
            let dest = find_column(conn, &self.owner_id, dest_column_id)?;
            let source = find_column(conn, &self.owner_id, &task.column_id)?;
            if source.board_id != dest.board_id {
                return Err(CoreError::InvalidInput(format!(
                    "column {dest_column_id} belongs to another board"
                )));
            }

            if source.id == dest.id {
                let tasks = tasks_of(conn, &source.id)?;
                let from = tasks
                    .iter()
                    .position(|t| t.id() == task_id)
                    .ok_or_else(|| CoreError::not_found("task", task_id))?;
                let tasks = reorder_within_list(tasks, from, dest_index);
                write_list_order(conn, OrderedTable::Tasks, &ListOrder::of(&source.id, &tasks))?;
            } else {
                let (source_tasks, dest_tasks) = move_across_lists(
                    tasks_of(conn, &source.id)?,
                    tasks_of(conn, &dest.id)?,
                    task_id,
                    &dest.id,
                    dest_index,
                )?;
                write_list_order(
                    conn,
                    OrderedTable::Tasks,
                    &ListOrder::of(&source.id, &source_tasks),
                )?;
                write_list_order(conn, OrderedTable::Tasks, &ListOrder::of(&dest.id, &dest_tasks))?;
            }

            conn.execute(
                "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
                params![format_instant(Utc::now()), task_id],
            )?;
            find_task(conn, &self.owner_id, task_id)
        })?;
        info!(
            task_id,
            column_id = %task.column_id,
            order = task.order,
            "moved task"
        );
        Ok(task)
    }

    /// Persist the outcome of a drag session.
    pub fn apply_move(&self, intent: &MoveIntent) -> Result<()> {
        match intent {
            MoveIntent::Task {
                task_id,
                to_column,
                to_index,
            } => {
                self.move_task(task_id, to_column, *to_index)?;
            }
            MoveIntent::Column {
                column_id,
                to_index,
            } => {
                let column = find_column(self.db.conn(), &self.owner_id, column_id)?;
                let from = columns_of(self.db.conn(), &column.board_id)?
                    .iter()
                    .position(|c| c.id == *column_id)
                    .ok_or_else(|| CoreError::not_found("column", column_id.as_str()))?;
                self.reorder_columns(&column.board_id, from, *to_index)?;
            }
        }
        Ok(())
    }

    /// Re-densify every list of a board. Returns how many lists changed.
    pub fn repair_orders(&self, board_id: &str) -> Result<usize> {
        let repaired = self.db.transaction(|conn| {
            find_board(conn, &self.owner_id, board_id)?;
            let mut repaired = 0;

            let columns = columns_of(conn, board_id)?;
            let columns = if is_dense(&columns) {
                columns
            } else {
                let fixed = normalize(columns);
                write_list_order(conn, OrderedTable::Columns, &ListOrder::of(board_id, &fixed))?;
                repaired += 1;
                fixed
            };

            for column in &columns {
                let tasks = tasks_of(conn, &column.id)?;
                if !is_dense(&tasks) {
                    let fixed = normalize(tasks);
                    write_list_order(conn, OrderedTable::Tasks, &ListOrder::of(&column.id, &fixed))?;
                    repaired += 1;
                }
            }
            Ok(repaired)
        })?;

        if repaired > 0 {
            warn!(board_id, lists = repaired, "repaired non-dense orderings");
        }
        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::{DragItem, DragSession};

    fn titles(detail: &BoardDetail, column: usize) -> Vec<&str> {
        detail.columns[column]
            .tasks
            .iter()
            .map(|t| t.title.as_str())
            .collect()
    }

    fn orders(detail: &BoardDetail, column: usize) -> Vec<i32> {
        detail.columns[column].tasks.iter().map(|t| t.order).collect()
    }

    /// Board with "To Do" holding T1..T3 and "In Progress" holding T4.
    fn seeded(kanban: &KanbanDb) -> BoardDetail {
        let board = kanban.create_board("Work").unwrap();
        let todo = board.columns[0].column.id.clone();
        let doing = board.columns[1].column.id.clone();
        for title in ["T1", "T2", "T3"] {
            kanban.create_task(&todo, NewTask::titled(title)).unwrap();
        }
        kanban.create_task(&doing, NewTask::titled("T4")).unwrap();
        kanban.get_board(&board.board.id).unwrap()
    }

    fn task_id(detail: &BoardDetail, title: &str) -> String {
        detail
            .columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .find(|t| t.title == title)
            .map(|t| t.id.clone())
            .unwrap()
    }

    #[test]
    fn new_board_has_default_columns() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let board = kanban.create_board("  Work  ").unwrap();
        assert_eq!(board.board.name, "Work");
        let columns: Vec<(&str, i32)> = board
            .columns
            .iter()
            .map(|c| (c.column.title.as_str(), c.column.order))
            .collect();
        assert_eq!(
            columns,
            vec![("To Do", 0), ("In Progress", 1), ("Done", 2)]
        );
    }

    #[test]
    fn custom_default_columns() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local")
            .with_default_columns(vec!["Backlog".into(), "Shipped".into()]);
        let board = kanban.create_board("Work").unwrap();
        assert_eq!(board.columns.len(), 2);
        assert_eq!(board.columns[1].column.title, "Shipped");
    }

    #[test]
    fn board_name_is_validated() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        assert!(matches!(
            kanban.create_board("   "),
            Err(CoreError::Validation(_))
        ));
        assert!(kanban.create_board(&"b".repeat(51)).is_err());
        assert!(kanban.list_boards().unwrap().is_empty());
    }

    #[test]
    fn ensure_initial_board_creates_once() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let first = kanban.ensure_initial_board().unwrap();
        assert_eq!(first.board.name, "My Board");
        let again = kanban.ensure_initial_board().unwrap();
        assert_eq!(again.board.id, first.board.id);
        assert_eq!(kanban.list_boards().unwrap().len(), 1);
    }

    #[test]
    fn last_board_cannot_be_deleted() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let only = kanban.create_board("Only").unwrap();
        assert!(matches!(
            kanban.delete_board(&only.board.id),
            Err(CoreError::Conflict(_))
        ));

        let other = seeded(&kanban);
        kanban.delete_board(&other.board.id).unwrap();
        let remaining: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn boards_are_owner_scoped() {
        let db = Database::open_memory().unwrap();
        let alice = KanbanDb::new(&db, "alice");
        let bob = KanbanDb::new(&db, "bob");
        let board = alice.create_board("Private").unwrap();
        assert!(bob.list_boards().unwrap().is_empty());
        assert!(matches!(
            bob.get_board(&board.board.id),
            Err(CoreError::NotFound { entity: "board", .. })
        ));
        assert!(bob
            .create_column(&board.board.id, "Sneaky")
            .is_err());
    }

    #[test]
    fn rename_board_and_column() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let board = kanban.create_board("Work").unwrap();
        let renamed = kanban.rename_board(&board.board.id, "Home").unwrap();
        assert_eq!(renamed.name, "Home");
        let column = kanban
            .rename_column(&board.columns[0].column.id, "Backlog")
            .unwrap();
        assert_eq!(column.title, "Backlog");
        assert!(kanban.rename_board("missing", "x").is_err());
    }

    #[test]
    fn columns_append_and_close_gaps() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let board = kanban.create_board("Work").unwrap();
        let review = kanban.create_column(&board.board.id, "Review").unwrap();
        assert_eq!(review.order, 3);

        kanban
            .delete_column(&board.columns[1].column.id)
            .unwrap();
        let detail = kanban.get_board(&board.board.id).unwrap();
        let columns: Vec<(&str, i32)> = detail
            .columns
            .iter()
            .map(|c| (c.column.title.as_str(), c.column.order))
            .collect();
        assert_eq!(columns, vec![("To Do", 0), ("Done", 1), ("Review", 2)]);
    }

    #[test]
    fn reorder_columns_last_to_first() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let board = kanban.create_board("Work").unwrap();
        let columns = kanban.reorder_columns(&board.board.id, 2, 0).unwrap();
        let titles: Vec<&str> = columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Done", "To Do", "In Progress"]);

        let detail = kanban.get_board(&board.board.id).unwrap();
        assert_eq!(detail.columns[0].column.title, "Done");
        assert_eq!(detail.columns[0].column.order, 0);
    }

    #[test]
    fn tasks_append_with_dense_order() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        assert_eq!(titles(&detail, 0), vec!["T1", "T2", "T3"]);
        assert_eq!(orders(&detail, 0), vec![0, 1, 2]);
        assert_eq!(titles(&detail, 1), vec!["T4"]);
    }

    #[test]
    fn create_task_cleans_fields() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let board = kanban.create_board("Work").unwrap();
        let task = kanban
            .create_task(
                &board.columns[0].column.id,
                NewTask {
                    title: " Write report ".into(),
                    description: Some("   ".into()),
                    priority: Priority::High,
                    due_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 12),
                    tags: vec!["work".into(), " work".into(), "".into(), "q1".into()],
                },
            )
            .unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, None);
        assert_eq!(task.tags, vec!["work", "q1"]);

        let loaded = kanban.get_task(&task.id).unwrap();
        assert_eq!(loaded, task);
    }

    #[test]
    fn move_task_across_columns() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        let doing = detail.columns[1].column.id.clone();

        let moved = kanban.move_task(&task_id(&detail, "T2"), &doing, 0).unwrap();
        assert_eq!(moved.column_id, doing);
        assert_eq!(moved.order, 0);

        let after = kanban.get_board(&detail.board.id).unwrap();
        assert_eq!(titles(&after, 0), vec!["T1", "T3"]);
        assert_eq!(orders(&after, 0), vec![0, 1]);
        assert_eq!(titles(&after, 1), vec!["T2", "T4"]);
        assert_eq!(orders(&after, 1), vec![0, 1]);
        assert_eq!(after.task_count(), 4);
    }

    #[test]
    fn move_task_within_column_clamps_index() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        let todo = detail.columns[0].column.id.clone();

        kanban.move_task(&task_id(&detail, "T1"), &todo, 99).unwrap();
        let after = kanban.get_board(&detail.board.id).unwrap();
        assert_eq!(titles(&after, 0), vec!["T2", "T3", "T1"]);
        assert_eq!(orders(&after, 0), vec![0, 1, 2]);
    }

    #[test]
    fn move_task_to_other_board_is_rejected() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        let other = kanban.create_board("Other").unwrap();
        let err = kanban
            .move_task(&task_id(&detail, "T1"), &other.columns[0].column.id, 0)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        let after = kanban.get_board(&detail.board.id).unwrap();
        assert_eq!(titles(&after, 0), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn delete_task_closes_gap() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        kanban.delete_task(&task_id(&detail, "T1")).unwrap();
        let after = kanban.get_board(&detail.board.id).unwrap();
        assert_eq!(titles(&after, 0), vec!["T2", "T3"]);
        assert_eq!(orders(&after, 0), vec![0, 1]);
        assert!(kanban.delete_task("missing").is_err());
    }

    #[test]
    fn update_and_complete_task() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        let id = task_id(&detail, "T3");

        let updated = kanban
            .update_task(
                &id,
                TaskPatch {
                    title: Some("T3 renamed".into()),
                    priority: Some(Priority::Low),
                    tags: Some(vec!["home".into()]),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "T3 renamed");
        assert_eq!(updated.priority, Priority::Low);
        assert_eq!(updated.order, 2);

        let done = kanban.set_task_completed(&id, true).unwrap();
        let first_stamp = done.completed_at;
        assert!(first_stamp.is_some());
        let again = kanban.set_task_completed(&id, true).unwrap();
        assert_eq!(again.completed_at, first_stamp);
        let undone = kanban.set_task_completed(&id, false).unwrap();
        assert!(!undone.is_completed());
    }

    #[test]
    fn repair_orders_fixes_corrupted_lists() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        db.conn()
            .execute(
                "UPDATE tasks SET position = 7 WHERE column_id = ?1",
                params![detail.columns[0].column.id],
            )
            .unwrap();
        db.conn()
            .execute(
                "UPDATE columns SET position = position + 10 WHERE board_id = ?1",
                params![detail.board.id],
            )
            .unwrap();

        assert_eq!(kanban.repair_orders(&detail.board.id).unwrap(), 2);
        let after = kanban.get_board(&detail.board.id).unwrap();
        assert_eq!(titles(&after, 0), vec!["T1", "T2", "T3"]);
        assert_eq!(orders(&after, 0), vec![0, 1, 2]);
        assert_eq!(after.columns[2].column.order, 2);
        assert_eq!(kanban.repair_orders(&detail.board.id).unwrap(), 0);
    }

    #[test]
    fn drag_session_outcome_is_persisted() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        let t3 = task_id(&detail, "T3");
        let t4 = task_id(&detail, "T4");

        let mut session = DragSession::new(detail.layout());
        session.start(DragItem::Task(t3)).unwrap();
        session.hover_item(&t4).unwrap();
        let intent = session.drop().unwrap().unwrap();
        kanban.apply_move(&intent).unwrap();
        session.confirm().unwrap();

        let after = kanban.get_board(&detail.board.id).unwrap();
        assert_eq!(after.layout(), *session.persisted());
        assert_eq!(titles(&after, 1), vec!["T3", "T4"]);
    }

    #[test]
    fn failed_move_rolls_session_back_to_store() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        let t1 = task_id(&detail, "T1");
        let t4 = task_id(&detail, "T4");

        let mut session = DragSession::new(detail.layout());
        session.start(DragItem::Task(t1.clone())).unwrap();
        session.hover_item(&t4).unwrap();
        let intent = session.drop().unwrap().unwrap();

        // The task disappears before the write lands.
        kanban.delete_task(&t1).unwrap();
        assert!(kanban.apply_move(&intent).is_err());
        session.rollback().unwrap();
        assert_eq!(*session.layout(), detail.layout());

        session.sync(kanban.layout(&detail.board.id).unwrap()).unwrap();
        assert_eq!(*session.persisted(), kanban.layout(&detail.board.id).unwrap());
    }

    #[test]
    fn column_drag_is_persisted() {
        let db = Database::open_memory().unwrap();
        let kanban = KanbanDb::new(&db, "local");
        let detail = seeded(&kanban);
        let done = detail.columns[2].column.id.clone();
        let todo = detail.columns[0].column.id.clone();

        let mut session = DragSession::new(detail.layout());
        session.start(DragItem::Column(done)).unwrap();
        session.hover_item(&todo).unwrap();
        let intent = session.drop().unwrap().unwrap();
        kanban.apply_move(&intent).unwrap();

        let after = kanban.get_board(&detail.board.id).unwrap();
        assert_eq!(after.columns[0].column.title, "Done");
        assert_eq!(after.columns[1].tasks.len(), 3);
    }
}
