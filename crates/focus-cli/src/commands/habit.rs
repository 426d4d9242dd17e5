use clap::Subcommand;
use focus_core::habit::DEFAULT_HISTORY_DAYS;
use focus_core::streak::Cadence;
use focus_core::{HabitPatch, NewHabit};

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Create {
        /// Habit title
        title: String,
        /// Cadence: daily, weekly or monthly
        #[arg(long, default_value = "daily")]
        cadence: Cadence,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// First day of the habit (defaults to today)
        #[arg(long)]
        start: Option<String>,
    },
    /// List habits with their current status and streak
    List {
        /// Evaluate as of this date (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Toggle the check-in for a date
    Check {
        /// Habit ID
        id: String,
        /// Date to toggle (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Per-day check-ins for the last N days
    History {
        /// Habit ID
        id: String,
        #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: u32,
    },
    /// Update a habit
    Update {
        /// Habit ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        cadence: Option<Cadence>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        start: Option<String>,
    },
    /// Delete a habit and its check-ins
    Delete {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction) -> CliResult {
    let ws = Workspace::open()?;
    let habits = ws.habits();

    match action {
        HabitAction::Create {
            title,
            cadence,
            description,
            icon,
            color,
            start,
        } => {
            let start_date = start.map(|raw| ws.clock().parse_date(&raw)).transpose()?;
            let habit = habits.create_habit(NewHabit {
                title,
                description,
                cadence,
                icon,
                color,
                start_date,
            })?;
            print_json(&habit)?;
        }
        HabitAction::List { date } => {
            let today = ws.date_or_today(date.as_deref())?;
            print_json(&habits.list_habits(today)?)?;
        }
        HabitAction::Check { id, date } => {
            let date = ws.date_or_today(date.as_deref())?;
            let toggle = habits.toggle_habit_log(&id, date)?;
            print_json(&serde_json::json!({
                "habit_id": id,
                "date": date,
                "result": toggle,
            }))?;
        }
        HabitAction::History { id, days } => {
            let today = ws.clock().today();
            print_json(&habits.habit_history(&id, days, today)?)?;
        }
        HabitAction::Update {
            id,
            title,
            cadence,
            description,
            icon,
            color,
            start,
        } => {
            let start_date = start.map(|raw| ws.clock().parse_date(&raw)).transpose()?;
            let patch = HabitPatch {
                title,
                description: description.map(Some),
                cadence,
                icon: icon.map(Some),
                color: color.map(Some),
                start_date,
            };
            print_json(&habits.update_habit(&id, patch)?)?;
        }
        HabitAction::Delete { id } => {
            habits.delete_habit(&id)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
    }
    Ok(())
}
