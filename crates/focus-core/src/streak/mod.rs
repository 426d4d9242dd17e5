//! Streak and activity-continuity engine.
//!
//! Shared by habits (per-habit streaks) and insights (the cross-feature
//! productivity streak). All functions here are pure; the caller supplies
//! "today" from a [`ReferenceClock`].

mod clock;
mod engine;

pub use clock::ReferenceClock;
pub use engine::{
    compute_streak, daily_streak, period_count, productivity_streak, ActivityEvent, ActivityKind,
    Cadence,
};
