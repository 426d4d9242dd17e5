use chrono::Utc;
use clap::Subcommand;
use focus_core::pomodoro::DEFAULT_RECENT_LIMIT;

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Finalized sessions, newest first
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Stop an open session (kept if it ran at least a minute)
    Abandon {
        /// Session ID
        id: String,
    },
    /// Session count and total focus time
    Totals,
}

pub fn run(action: SessionAction) -> CliResult {
    let ws = Workspace::open()?;
    let sessions = ws.sessions();

    match action {
        SessionAction::Recent { limit } => {
            print_json(&sessions.recent_sessions(limit)?)?;
        }
        SessionAction::Abandon { id } => {
            let outcome = sessions.abandon_session(&id, Utc::now())?;
            print_json(&serde_json::json!({ "session_id": id, "outcome": outcome }))?;
        }
        SessionAction::Totals => {
            print_json(&sessions.totals()?)?;
        }
    }
    Ok(())
}
