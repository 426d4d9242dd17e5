//! Kanban boards: boards hold ordered columns, columns hold ordered tasks.

mod model;
mod store;

pub use model::{
    Board, BoardDetail, Column, ColumnWithTasks, NewTask, Priority, Task, TaskPatch,
    BOARD_NAME_MAX, COLUMN_TITLE_MAX, INITIAL_BOARD_NAME, TASK_TITLE_MAX,
};
pub use store::KanbanDb;
