mod config;
pub mod database;
pub mod migrations;

pub use config::{ClockConfig, Config, KanbanConfig, ProfileConfig, TimerConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `FOCUS_DATA_DIR` overrides the location. Otherwise `~/.config/focus/`,
/// or `~/.config/focus-dev/` when `FOCUS_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("FOCUS_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUS_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("focus-dev")
            } else {
                base_dir.join("focus")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
