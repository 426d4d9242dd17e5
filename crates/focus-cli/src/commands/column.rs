use clap::Subcommand;

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum ColumnAction {
    /// Append a column to a board
    Add {
        /// Board ID
        board_id: String,
        /// Column title
        title: String,
    },
    /// Rename a column
    Rename {
        /// Column ID
        id: String,
        /// New title
        title: String,
    },
    /// Delete a column and its tasks
    Delete {
        /// Column ID
        id: String,
    },
    /// Move the column at FROM to TO (0-based, clamped)
    Move {
        /// Board ID
        board_id: String,
        from: usize,
        to: usize,
    },
}

pub fn run(action: ColumnAction) -> CliResult {
    let ws = Workspace::open()?;
    let kanban = ws.kanban();

    match action {
        ColumnAction::Add { board_id, title } => {
            print_json(&kanban.create_column(&board_id, &title)?)?;
        }
        ColumnAction::Rename { id, title } => {
            print_json(&kanban.rename_column(&id, &title)?)?;
        }
        ColumnAction::Delete { id } => {
            kanban.delete_column(&id)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        ColumnAction::Move { board_id, from, to } => {
            print_json(&kanban.reorder_columns(&board_id, from, to)?)?;
        }
    }
    Ok(())
}
