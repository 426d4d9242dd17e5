//! Focus timer state.
//!
//! The timer is a wall-clock-based state machine with no internal thread.
//! The caller passes the current epoch milliseconds to each command and
//! persists the state between invocations (see [`FocusTimer::load`]).
//!
//! ## State Transitions
//!
//! ```text
//! Focus(idle) -> start -> Focus(active) -> tick..0 -> ShortBreak(idle)
//! ShortBreak | LongBreak -> tick..0 -> Focus(idle)
//! ```
//!
//! Only focus periods are recorded as sessions. Commands that leave a focus
//! period early (`reset`, `set_mode`) hand back the open session id so the
//! caller can abandon it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::storage::Database;

/// kv key holding the serialized timer.
pub const TIMER_KEY: &str = "focus_timer";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    /// Mode entered after this one completes.
    pub fn next(self) -> TimerMode {
        match self {
            TimerMode::Focus => TimerMode::ShortBreak,
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "focus" => Ok(TimerMode::Focus),
            "short" | "short_break" => Ok(TimerMode::ShortBreak),
            "long" | "long_break" => Ok(TimerMode::LongBreak),
            other => Err(format!("unknown timer mode '{other}' (focus, short, long)")),
        }
    }
}

/// Length of each mode in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDurations {
    pub focus_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
        }
    }
}

impl TimerDurations {
    pub fn for_mode(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Focus => self.focus_secs,
            TimerMode::ShortBreak => self.short_break_secs,
            TimerMode::LongBreak => self.long_break_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    /// The running period reached zero.
    Completed {
        mode: TimerMode,
        next_mode: TimerMode,
        /// Focus session to finalize, if one was open.
        session_id: Option<String>,
        /// Epoch ms at which the period ended. A catch-up tick long after
        /// expiry reports the moment the countdown hit zero.
        ended_at_ms: u64,
    },
}

impl TimerEvent {
    /// Instant the period ended.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        let TimerEvent::Completed { ended_at_ms, .. } = self;
        i64::try_from(*ended_at_ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

/// Persisted timer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTimer {
    pub mode: TimerMode,
    pub time_left_secs: u64,
    pub is_active: bool,
    #[serde(default)]
    pub selected_task_id: Option<String>,
    #[serde(default)]
    pub current_session_id: Option<String>,
    /// Epoch ms up to which elapsed time has been applied (only while active).
    #[serde(default)]
    pub last_tick_epoch_ms: Option<u64>,
    #[serde(default)]
    pub durations: TimerDurations,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(TimerDurations::default())
    }
}

impl FocusTimer {
    pub fn new(durations: TimerDurations) -> Self {
        Self {
            mode: TimerMode::Focus,
            time_left_secs: durations.focus_secs,
            is_active: false,
            selected_task_id: None,
            current_session_id: None,
            last_tick_epoch_ms: None,
            durations,
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Load the saved timer, if any.
    pub fn load(db: &Database) -> Result<Option<Self>> {
        match db.kv_get(TIMER_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        let json = serde_json::to_string(self)?;
        db.kv_set(TIMER_KEY, &json)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn total_secs(&self) -> u64 {
        self.durations.for_mode(self.mode)
    }

    /// 0.0 .. 1.0 progress within the current period.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.time_left_secs.min(total) as f64 / total as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply new durations. An idle, untouched period picks up the new length.
    pub fn set_durations(&mut self, durations: TimerDurations) {
        let untouched = !self.is_active && self.time_left_secs == self.total_secs();
        self.durations = durations;
        if untouched {
            self.time_left_secs = self.total_secs();
        }
    }

    pub fn select_task(&mut self, task_id: Option<String>) {
        self.selected_task_id = task_id;
    }

    /// Record the session opened for the current focus period.
    pub fn attach_session(&mut self, session_id: impl Into<String>) {
        self.current_session_id = Some(session_id.into());
    }

    /// Start or resume counting down.
    ///
    /// Returns `true` when a focus period starts without an open session, in
    /// which case the caller opens one and calls [`attach_session`](Self::attach_session).
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.is_active {
            return false;
        }
        if self.time_left_secs == 0 {
            self.time_left_secs = self.total_secs();
        }
        self.is_active = true;
        self.last_tick_epoch_ms = Some(now_ms);
        self.mode == TimerMode::Focus && self.current_session_id.is_none()
    }

    /// Stop counting down, keeping the remaining time and open session.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if !self.is_active {
            return false;
        }
        self.flush_elapsed(now_ms);
        self.is_active = false;
        self.last_tick_epoch_ms = None;
        true
    }

    /// Apply wall-clock time since the last tick.
    pub fn tick(&mut self, now_ms: u64) -> Option<TimerEvent> {
        if !self.is_active {
            return None;
        }
        let deadline = self
            .last_tick_epoch_ms
            .map(|last| last.saturating_add(self.time_left_secs.saturating_mul(1000)));
        self.flush_elapsed(now_ms);
        if self.time_left_secs == 0 {
            let ended_at_ms = deadline.map_or(now_ms, |deadline| deadline.min(now_ms));
            return Some(self.complete(ended_at_ms));
        }
        None
    }

    /// Switch mode: full duration, inactive. Returns an open focus session
    /// that the caller should abandon.
    pub fn set_mode(&mut self, mode: TimerMode) -> Option<String> {
        let detached = self.current_session_id.take();
        self.mode = mode;
        self.time_left_secs = self.total_secs();
        self.is_active = false;
        self.last_tick_epoch_ms = None;
        detached
    }

    /// Restart the current mode from its full duration. Returns an open
    /// focus session that the caller should abandon.
    pub fn reset(&mut self) -> Option<String> {
        self.set_mode(self.mode)
    }

    /// Finish the current period at `now_ms` and switch to the next mode.
    pub fn complete(&mut self, now_ms: u64) -> TimerEvent {
        let mode = self.mode;
        let session_id = self.current_session_id.take();
        let next_mode = mode.next();
        self.set_mode(next_mode);
        TimerEvent::Completed {
            mode,
            next_mode,
            session_id,
            ended_at_ms: now_ms,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Consume whole elapsed seconds; the sub-second remainder stays on the
    /// tick cursor.
    fn flush_elapsed(&mut self, now_ms: u64) {
        if let Some(last) = self.last_tick_epoch_ms {
            let elapsed_secs = now_ms.saturating_sub(last) / 1000;
            self.time_left_secs = self.time_left_secs.saturating_sub(elapsed_secs);
            self.last_tick_epoch_ms = Some(last + elapsed_secs * 1000);
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn short_timer() -> FocusTimer {
        FocusTimer::new(TimerDurations {
            focus_secs: 10,
            short_break_secs: 3,
            long_break_secs: 6,
        })
    }

    #[test]
    fn defaults_are_25_5_15() {
        let timer = FocusTimer::default();
        assert_eq!(timer.mode, TimerMode::Focus);
        assert_eq!(timer.time_left_secs, 25 * 60);
        assert_eq!(timer.durations.short_break_secs, 5 * 60);
        assert_eq!(timer.durations.long_break_secs, 15 * 60);
        assert!(!timer.is_active);
    }

    #[test]
    fn start_requests_session_only_for_focus() {
        let mut timer = short_timer();
        assert!(timer.start(T0));
        assert!(!timer.start(T0 + 100));
        timer.attach_session("s1");
        timer.pause(T0 + 1000);
        assert!(!timer.start(T0 + 2000));

        let mut breaktime = short_timer();
        breaktime.set_mode(TimerMode::ShortBreak);
        assert!(!breaktime.start(T0));
    }

    #[test]
    fn tick_uses_wall_clock_and_keeps_remainder() {
        let mut timer = short_timer();
        timer.start(T0);
        assert_eq!(timer.tick(T0 + 2_500), None);
        assert_eq!(timer.time_left_secs, 8);
        assert_eq!(timer.tick(T0 + 3_000), None);
        assert_eq!(timer.time_left_secs, 7);
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let mut timer = short_timer();
        timer.start(T0);
        assert!(timer.pause(T0 + 4_000));
        assert_eq!(timer.time_left_secs, 6);
        assert_eq!(timer.tick(T0 + 60_000), None);
        assert_eq!(timer.time_left_secs, 6);
        assert!(!timer.pause(T0 + 61_000));
    }

    #[test]
    fn focus_completion_switches_to_short_break() {
        let mut timer = short_timer();
        timer.start(T0);
        timer.attach_session("s1");
        let event = timer.tick(T0 + 60_000).unwrap();
        assert_eq!(
            event,
            TimerEvent::Completed {
                mode: TimerMode::Focus,
                next_mode: TimerMode::ShortBreak,
                session_id: Some("s1".into()),
                ended_at_ms: T0 + 10_000,
            }
        );
        assert_eq!(timer.mode, TimerMode::ShortBreak);
        assert_eq!(timer.time_left_secs, 3);
        assert!(!timer.is_active);
        assert!(timer.current_session_id.is_none());
    }

    #[test]
    fn late_tick_reports_when_countdown_hit_zero() {
        let mut timer = short_timer();
        timer.start(T0);
        timer.tick(T0 + 3_400);
        timer.pause(T0 + 4_000);
        timer.start(T0 + 20_000);
        let event = timer.tick(T0 + 3 * 60 * 60 * 1000).unwrap();
        let TimerEvent::Completed { ended_at_ms, .. } = event;
        assert_eq!(ended_at_ms, T0 + 26_000);
        assert_eq!(
            event.ended_at().unwrap().timestamp_millis(),
            (T0 + 26_000) as i64
        );
    }

    #[test]
    fn break_completion_returns_to_focus() {
        let mut timer = short_timer();
        timer.set_mode(TimerMode::LongBreak);
        let TimerEvent::Completed {
            next_mode,
            ended_at_ms,
            ..
        } = timer.complete(T0);
        assert_eq!(ended_at_ms, T0);
        assert_eq!(next_mode, TimerMode::Focus);
        assert_eq!(timer.time_left_secs, 10);
    }

    #[test]
    fn reset_and_set_mode_detach_open_session() {
        let mut timer = short_timer();
        timer.start(T0);
        timer.attach_session("s1");
        timer.tick(T0 + 4_000);
        assert_eq!(timer.reset(), Some("s1".into()));
        assert_eq!(timer.time_left_secs, 10);
        assert!(!timer.is_active);

        timer.start(T0 + 5_000);
        timer.attach_session("s2");
        assert_eq!(timer.set_mode(TimerMode::ShortBreak), Some("s2".into()));
        assert_eq!(timer.set_mode(TimerMode::Focus), None);
    }

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("short".parse::<TimerMode>().unwrap(), TimerMode::ShortBreak);
        assert_eq!("Long-Break".parse::<TimerMode>().unwrap(), TimerMode::LongBreak);
        assert!("nap".parse::<TimerMode>().is_err());
    }

    #[test]
    fn set_durations_updates_untouched_period() {
        let mut timer = FocusTimer::default();
        timer.set_durations(TimerDurations {
            focus_secs: 50 * 60,
            ..TimerDurations::default()
        });
        assert_eq!(timer.time_left_secs, 50 * 60);

        timer.start(T0);
        timer.tick(T0 + 5_000);
        timer.set_durations(TimerDurations::default());
        assert_eq!(timer.time_left_secs, 50 * 60 - 5);
    }

    #[test]
    fn persists_through_kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(FocusTimer::load(&db).unwrap().is_none());
        let mut timer = short_timer();
        timer.select_task(Some("task-1".into()));
        timer.start(T0);
        timer.save(&db).unwrap();
        assert_eq!(FocusTimer::load(&db).unwrap(), Some(timer));
    }
}
