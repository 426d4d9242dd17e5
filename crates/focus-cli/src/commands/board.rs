use clap::Subcommand;

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum BoardAction {
    /// List boards, oldest first
    List,
    /// Show a board with its columns and tasks
    Show {
        /// Board ID (defaults to the first board, created if none exist)
        id: Option<String>,
    },
    /// Create a board with the configured default columns
    Create {
        /// Board name
        name: String,
    },
    /// Rename a board
    Rename {
        /// Board ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a board with its columns and tasks
    Delete {
        /// Board ID
        id: String,
    },
    /// Re-densify column and task ordering of a board
    Repair {
        /// Board ID
        id: String,
    },
}

pub fn run(action: BoardAction) -> CliResult {
    let ws = Workspace::open()?;
    let kanban = ws.kanban();

    match action {
        BoardAction::List => {
            kanban.ensure_initial_board()?;
            print_json(&kanban.list_boards()?)?;
        }
        BoardAction::Show { id } => {
            let detail = match id {
                Some(id) => kanban.get_board(&id)?,
                None => kanban.ensure_initial_board()?,
            };
            print_json(&detail)?;
        }
        BoardAction::Create { name } => {
            print_json(&kanban.create_board(&name)?)?;
        }
        BoardAction::Rename { id, name } => {
            print_json(&kanban.rename_board(&id, &name)?)?;
        }
        BoardAction::Delete { id } => {
            kanban.delete_board(&id)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        BoardAction::Repair { id } => {
            let repaired = kanban.repair_orders(&id)?;
            print_json(&serde_json::json!({ "board_id": id, "repaired_lists": repaired }))?;
        }
    }
    Ok(())
}
