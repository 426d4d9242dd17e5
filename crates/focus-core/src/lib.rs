//! # Focus Core Library
//!
//! This library provides the core logic for Focus, a single-owner
//! productivity workspace. All operations are exposed through the `focus`
//! CLI binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Streaks**: pure date-granular streak computation shared by habits and
//!   insights
//! - **Ordering**: dense ordering for columns and tasks, plus the drag
//!   interaction state machine
//! - **Storage**: SQLite persistence with versioned migrations, and TOML
//!   configuration
//! - **Features**: kanban, habits, pomodoro, journal, calendar and insights,
//!   each a small store scoped to one owner
//!
//! ## Key Components
//!
//! - [`compute_streak`]: streak for a set of dates under a cadence
//! - [`reorder_within_list`] / [`move_across_lists`]: list reconciliation
//! - [`DragSession`]: drag state with an optimistic layout
//! - [`Database`]: shared SQLite connection
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod error;
pub mod habit;
pub mod insights;
pub mod journal;
pub mod kanban;
pub mod ordering;
pub mod pomodoro;
pub mod storage;
pub mod streak;

pub use calendar::{CalendarDb, CalendarEvent, EventPatch, NewEvent};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use habit::{Habit, HabitDay, HabitDb, HabitPatch, HabitSummary, LogToggle, NewHabit};
pub use insights::{InsightsDb, ProductivityStats};
pub use journal::{JournalDb, JournalEntry};
pub use kanban::{Board, BoardDetail, Column, KanbanDb, NewTask, Priority, Task, TaskPatch};
pub use ordering::{
    append_new_item, move_across_lists, reorder_within_list, BoardLayout, DragItem, DragSession,
    DragState, MoveIntent,
};
pub use pomodoro::{
    AbandonOutcome, FocusTimer, PomodoroSession, SessionDb, TimerDurations, TimerEvent, TimerMode,
};
pub use storage::{data_dir, Config, Database};
pub use streak::{compute_streak, productivity_streak, ActivityEvent, Cadence, ReferenceClock};
