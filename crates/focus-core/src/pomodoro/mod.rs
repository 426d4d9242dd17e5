//! Pomodoro: the focus timer and the sessions it records.

mod session;
mod timer;

pub use session::{
    AbandonOutcome, PomodoroSession, RecentSession, SessionDb, SessionTotals,
    DEFAULT_RECENT_LIMIT, MIN_KEPT_SECONDS,
};
pub use timer::{now_ms, FocusTimer, TimerDurations, TimerEvent, TimerMode, TIMER_KEY};
