use chrono::Utc;
use clap::Subcommand;
use focus_core::pomodoro::{now_ms, PomodoroSession};
use focus_core::{FocusTimer, TimerEvent, TimerMode};

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Start or resume the countdown
    Start {
        /// Task to link the focus session to
        #[arg(long)]
        task: Option<String>,
    },
    /// Pause the countdown
    Pause,
    /// Switch mode: focus, short or long
    Mode { mode: TimerMode },
    /// Restart the current mode from its full duration
    Reset,
    /// Finish the current period now
    Complete,
}

fn load_timer(ws: &Workspace) -> Result<FocusTimer, Box<dyn std::error::Error>> {
    let durations = ws.config.timer_durations();
    let mut timer = FocusTimer::load(&ws.db)?.unwrap_or_else(|| FocusTimer::new(durations));
    timer.set_durations(durations);
    Ok(timer)
}

/// Record the end of a period: a finished focus period finalizes its session
/// at the instant the countdown ended, not when the CLI noticed.
fn finish_period(
    ws: &Workspace,
    event: &TimerEvent,
) -> Result<Option<PomodoroSession>, Box<dyn std::error::Error>> {
    let TimerEvent::Completed { session_id, .. } = event;
    let ended_at = event.ended_at().unwrap_or_else(Utc::now);
    match session_id {
        Some(id) => Ok(Some(ws.sessions().complete_session(id, ended_at)?)),
        None => Ok(None),
    }
}

/// Abandon a session detached by a mode switch or reset.
fn drop_session(ws: &Workspace, session_id: Option<String>) -> CliResult {
    if let Some(id) = session_id {
        ws.sessions().abandon_session(&id, Utc::now())?;
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CliResult {
    let ws = Workspace::open()?;
    let mut timer = load_timer(&ws)?;

    // Catch up on time that passed since the last invocation.
    let mut event = timer.tick(now_ms());
    let mut session = match &event {
        Some(event) => finish_period(&ws, event)?,
        None => None,
    };

    match action {
        TimerAction::Status => {}
        TimerAction::Start { task } => {
            if task.is_some() {
                timer.select_task(task);
            }
            if timer.start(now_ms()) {
                let opened = ws
                    .sessions()
                    .start_session(timer.selected_task_id.as_deref(), Utc::now())?;
                timer.attach_session(opened.id.clone());
                session = Some(opened);
            }
        }
        TimerAction::Pause => {
            timer.pause(now_ms());
        }
        TimerAction::Mode { mode } => {
            drop_session(&ws, timer.set_mode(mode))?;
        }
        TimerAction::Reset => {
            drop_session(&ws, timer.reset())?;
        }
        TimerAction::Complete => {
            let completed = timer.complete(now_ms());
            session = finish_period(&ws, &completed)?;
            event = Some(completed);
        }
    }

    timer.save(&ws.db)?;
    print_json(&serde_json::json!({
        "timer": timer,
        "label": timer.mode.label(),
        "progress": timer.progress(),
        "event": event,
        "session": session,
    }))
}
