//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Profile identity all data is scoped to
//! - Pomodoro durations
//! - Reference time zone for date-granular computations
//! - Default kanban columns
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::pomodoro::TimerDurations;
use crate::streak::ReferenceClock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_owner_id")]
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
}

/// Reference time zone. Unset means the system local zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanConfig {
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub kanban: KanbanConfig,
}

fn default_owner_id() -> String {
    "local".into()
}
fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_columns() -> Vec<String> {
    vec!["To Do".into(), "In Progress".into(), "Done".into()]
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
        }
    }
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            default_columns: default_columns(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| Self::invalid(key, e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => Self::parse_number(key, value)?,
                    // Optional numeric settings are stored as null until set.
                    serde_json::Value::Null => match value.trim() {
                        "" | "none" | "null" => serde_json::Value::Null,
                        other => Self::parse_number(key, other)?,
                    },
                    serde_json::Value::Array(_) if !value.trim_start().starts_with('[') => {
                        serde_json::Value::Array(
                            value
                                .split(',')
                                .map(|s| serde_json::Value::String(s.trim().to_string()))
                                .collect(),
                        )
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| Self::invalid(key, e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn parse_number(key: &str, value: &str) -> std::result::Result<serde_json::Value, ConfigError> {
        if let Ok(n) = value.parse::<i64>() {
            Ok(serde_json::Value::Number(n.into()))
        } else if let Ok(n) = value.parse::<f64>() {
            serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| Self::invalid(key, format!("cannot parse '{value}' as number")))
        } else {
            Err(Self::invalid(key, format!("cannot parse '{value}' as number")))
        }
    }

    /// Path of the config file in the data directory.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| Self::invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Flatten to `(dotted key, value)` pairs.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.profile.owner_id.trim().is_empty() {
            return Err(Self::invalid("profile.owner_id", "must not be empty"));
        }
        for (key, minutes) in [
            ("timer.focus_minutes", self.timer.focus_minutes),
            ("timer.short_break_minutes", self.timer.short_break_minutes),
            ("timer.long_break_minutes", self.timer.long_break_minutes),
        ] {
            if minutes == 0 {
                return Err(Self::invalid(key, "must be at least 1"));
            }
        }
        if let Some(offset) = self.clock.utc_offset_minutes {
            ReferenceClock::with_offset_minutes(offset)
                .map_err(|e| Self::invalid("clock.utc_offset_minutes", e.to_string()))?;
        }
        if self.kanban.default_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(Self::invalid(
                "kanban.default_columns",
                "column titles must not be empty",
            ));
        }
        Ok(())
    }

    /// Reference clock for "today" computations.
    pub fn clock(&self) -> ReferenceClock {
        self.clock
            .utc_offset_minutes
            .and_then(|minutes| ReferenceClock::with_offset_minutes(minutes).ok())
            .unwrap_or_default()
    }

    pub fn timer_durations(&self) -> TimerDurations {
        TimerDurations {
            focus_secs: u64::from(self.timer.focus_minutes) * 60,
            short_break_secs: u64::from(self.timer.short_break_minutes) * 60,
            long_break_secs: u64::from(self.timer.long_break_minutes) * 60,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
