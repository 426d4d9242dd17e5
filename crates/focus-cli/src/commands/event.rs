use clap::Subcommand;
use focus_core::{EventPatch, NewEvent};

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum EventAction {
    /// Create an event
    Add {
        /// Event title
        title: String,
        /// Start (RFC 3339, or YYYY-MM-DD for local midnight)
        #[arg(long)]
        start: String,
        /// End (RFC 3339, or YYYY-MM-DD)
        #[arg(long)]
        end: String,
        #[arg(long)]
        all_day: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Show an event
    Show {
        /// Event ID
        id: String,
    },
    /// Events lying entirely within a range, latest first
    List {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Update an event
    Update {
        /// Event ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        all_day: Option<bool>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
    },
}

pub fn run(action: EventAction) -> CliResult {
    let ws = Workspace::open()?;
    let calendar = ws.calendar();
    let clock = ws.clock();

    match action {
        EventAction::Add {
            title,
            start,
            end,
            all_day,
            description,
            location,
        } => {
            let event = calendar.create_event(NewEvent {
                title,
                description,
                location,
                start: clock.parse_instant(&start)?,
                end: clock.parse_instant(&end)?,
                all_day,
            })?;
            print_json(&event)?;
        }
        EventAction::Show { id } => {
            print_json(&calendar.get_event(&id)?)?;
        }
        EventAction::List { from, to } => {
            let events =
                calendar.events_between(clock.parse_instant(&from)?, clock.parse_instant(&to)?)?;
            print_json(&events)?;
        }
        EventAction::Update {
            id,
            title,
            start,
            end,
            all_day,
            description,
            location,
        } => {
            let patch = EventPatch {
                title,
                description: description.map(Some),
                location: location.map(Some),
                start: start.map(|raw| clock.parse_instant(&raw)).transpose()?,
                end: end.map(|raw| clock.parse_instant(&raw)).transpose()?,
                all_day,
            };
            print_json(&calendar.update_event(&id, patch)?)?;
        }
        EventAction::Delete { id } => {
            calendar.delete_event(&id)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
    }
    Ok(())
}
