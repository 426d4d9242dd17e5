use clap::Subcommand;
use focus_core::journal::DEFAULT_RECENT_LIMIT;

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum JournalAction {
    /// Write the entry for a date, replacing its content
    Write {
        /// Entry text
        content: String,
        /// Entry date (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the entry for a date
    Show {
        /// Entry date (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Entries, newest date first
    List {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Delete an entry
    Delete {
        /// Entry ID
        id: String,
    },
}

pub fn run(action: JournalAction) -> CliResult {
    let ws = Workspace::open()?;
    let journal = ws.journal();

    match action {
        JournalAction::Write { content, date } => {
            let date = ws.date_or_today(date.as_deref())?;
            print_json(&journal.upsert_entry(date, &content)?)?;
        }
        JournalAction::Show { date } => {
            let date = ws.date_or_today(date.as_deref())?;
            match journal.entry_by_date(date)? {
                Some(entry) => print_json(&entry)?,
                None => return Err(format!("no journal entry for {date}").into()),
            }
        }
        JournalAction::List { limit } => {
            print_json(&journal.recent_entries(limit)?)?;
        }
        JournalAction::Delete { id } => {
            journal.delete_entry(&id)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
    }
    Ok(())
}
