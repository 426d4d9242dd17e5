pub mod board;
pub mod column;
pub mod config;
pub mod event;
pub mod habit;
pub mod journal;
pub mod session;
pub mod stats;
pub mod task;
pub mod timer;
