//! Board, column and task records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ordering::{BoardLayout, Lane, Ordered, Reparent};

pub const BOARD_NAME_MAX: usize = 50;
pub const COLUMN_TITLE_MAX: usize = 50;
pub const TASK_TITLE_MAX: usize = 255;

/// Name of the board created for an owner with no boards.
pub const INITIAL_BOARD_NAME: &str = "My Board";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{other}' (low, medium, high)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub column_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub order: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

impl Ordered for Column {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Reparent for Column {
    fn set_parent(&mut self, parent_id: &str) {
        self.board_id = parent_id.to_string();
    }
}

impl Ordered for Task {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Reparent for Task {
    fn set_parent(&mut self, parent_id: &str) {
        self.column_id = parent_id.to_string();
    }
}

/// Fields for a new task. Only the title is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial task update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnWithTasks {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<Task>,
}

/// A board with its columns and their tasks, all in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<ColumnWithTasks>,
}

impl BoardDetail {
    /// Id-only view used by drag sessions.
    pub fn layout(&self) -> BoardLayout {
        BoardLayout {
            lanes: self
                .columns
                .iter()
                .map(|c| Lane {
                    id: c.column.id.clone(),
                    task_ids: c.tasks.iter().map(|t| t.id.clone()).collect(),
                })
                .collect(),
        }
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_and_displays() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::Low.to_string(), "Low");
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TaskPatch::default().is_empty());
        let patch = TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
