use clap::Subcommand;

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Completed tasks, focus time, sessions and the productivity streak
    Summary {
        /// Evaluate as of this date (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Every dated activity counted towards the streak
    Activity,
}

pub fn run(action: Option<StatsAction>) -> CliResult {
    let ws = Workspace::open()?;
    let insights = ws.insights();

    match action.unwrap_or(StatsAction::Summary { date: None }) {
        StatsAction::Summary { date } => {
            let today = ws.date_or_today(date.as_deref())?;
            print_json(&insights.productivity_stats(today)?)?;
        }
        StatsAction::Activity => {
            print_json(&insights.activity()?)?;
        }
    }
    Ok(())
}
