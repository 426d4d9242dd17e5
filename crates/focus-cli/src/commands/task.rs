//! Task management commands for CLI.

use clap::{ArgGroup, Subcommand};
use focus_core::kanban::{NewTask, Priority, TaskPatch};
use focus_core::{DragItem, DragSession};

use crate::workspace::{parse_tags, print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Append a task to a column
    Add {
        /// Column ID
        column_id: String,
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Priority: low, medium or high (default: medium)
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Get task details
    Show {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
        /// New priority
        #[arg(long)]
        priority: Option<Priority>,
        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,
    },
    /// Mark a task completed
    Done {
        /// Task ID
        id: String,
        /// Mark it not completed instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Move a task to INDEX of COLUMN (same board, index clamped)
    Move {
        /// Task ID
        id: String,
        /// Destination column ID
        column_id: String,
        /// Destination index (0-based)
        index: usize,
    },
    /// Play one drag gesture on a board and persist the drop
    #[command(group(ArgGroup::new("item").required(true).args(["task", "column"])))]
    Drag {
        /// Board ID
        board_id: String,
        /// Task being dragged
        #[arg(long)]
        task: Option<String>,
        /// Column being dragged
        #[arg(long)]
        column: Option<String>,
        /// Task or column ID to hover over before dropping
        #[arg(long)]
        over: Option<String>,
        /// Column whose empty area to hover over before dropping
        #[arg(long, conflicts_with = "over")]
        over_list: Option<String>,
        /// Cancel instead of dropping
        #[arg(long)]
        cancel: bool,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let ws = Workspace::open()?;
    let kanban = ws.kanban();

    match action {
        TaskAction::Add {
            column_id,
            title,
            description,
            priority,
            due,
            tags,
        } => {
            let due_date = due.map(|raw| ws.clock().parse_date(&raw)).transpose()?;
            let task = kanban.create_task(
                &column_id,
                NewTask {
                    title,
                    description,
                    priority,
                    due_date,
                    tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
                },
            )?;
            print_json(&task)?;
        }
        TaskAction::Show { id } => {
            print_json(&kanban.get_task(&id)?)?;
        }
        TaskAction::Update {
            id,
            title,
            description,
            clear_description,
            priority,
            due,
            clear_due,
            tags,
        } => {
            let due_date = match (due, clear_due) {
                (Some(raw), _) => Some(Some(ws.clock().parse_date(&raw)?)),
                (None, true) => Some(None),
                (None, false) => None,
            };
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                priority,
                due_date,
                tags: tags.as_deref().map(parse_tags),
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            print_json(&kanban.update_task(&id, patch)?)?;
        }
        TaskAction::Done { id, undo } => {
            print_json(&kanban.set_task_completed(&id, !undo)?)?;
        }
        TaskAction::Delete { id } => {
            kanban.delete_task(&id)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        TaskAction::Move {
            id,
            column_id,
            index,
        } => {
            print_json(&kanban.move_task(&id, &column_id, index)?)?;
        }
        TaskAction::Drag {
            board_id,
            task,
            column,
            over,
            over_list,
            cancel,
        } => {
            let item = match (task, column) {
                (Some(task_id), _) => DragItem::Task(task_id),
                (None, Some(column_id)) => DragItem::Column(column_id),
                (None, None) => return Err("drag needs --task or --column".into()),
            };

            let mut session = DragSession::new(kanban.layout(&board_id)?);
            session.start(item)?;
            if let Some(target) = over {
                session.hover_item(&target)?;
            } else if let Some(list) = over_list {
                session.hover_list(&list)?;
            }

            let intent = if cancel {
                session.cancel()?;
                None
            } else {
                session.drop()?
            };
            if let Some(intent) = &intent {
                if let Err(e) = kanban.apply_move(intent) {
                    session.rollback()?;
                    return Err(e.into());
                }
                session.confirm()?;
            }
            print_json(&serde_json::json!({
                "state": session.state(),
                "intent": intent,
                "layout": kanban.layout(&board_id)?,
            }))?;
        }
    }
    Ok(())
}
