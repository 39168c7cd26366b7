//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The default owner used by the CLI
//! - Planner day window, break length and default durations
//! - Recurrence preview length
//!
//! Configuration is stored at `~/.config/dayplan/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::clock::{parse_window_end, ClockTime};
use crate::error::{ConfigError, Result, ValidationError};
use crate::scheduler::SchedulerConfig;

/// Planner (auto-scheduler) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_day_start")]
    pub day_start: String,
    /// Exclusive end of the window; `24:00` allowed.
    #[serde(default = "default_day_end")]
    pub day_end: String,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    /// Duration given to a candidate line that names none.
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    /// Duration assumed for an existing occurrence that has none.
    #[serde(default = "default_duration_minutes")]
    pub default_busy_minutes: u32,
}

/// Recurrence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    #[serde(default = "default_preview_days")]
    pub preview_days: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/dayplan/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

// Default functions
fn default_owner() -> String {
    "local".into()
}
fn default_day_start() -> String {
    "09:00".into()
}
fn default_day_end() -> String {
    "18:00".into()
}
fn default_break_minutes() -> u32 {
    10
}
fn default_duration_minutes() -> u32 {
    30
}
fn default_preview_days() -> u32 {
    14
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            day_end: default_day_end(),
            break_minutes: default_break_minutes(),
            default_duration_minutes: default_duration_minutes(),
            default_busy_minutes: default_duration_minutes(),
        }
    }
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            preview_days: default_preview_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            planner: PlannerConfig::default(),
            recurrence: RecurrenceConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u32>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("only leaf values can be set".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path to the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be determined.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, or create default if missing.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or parsed,
    /// or if creating a default config fails.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Config::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
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

    /// Set a config value by key without saving.
    ///
    /// The updated configuration must still produce a valid
    /// [`SchedulerConfig`]; otherwise nothing changes.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.scheduler_config().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Build the validated planner configuration.
    ///
    /// # Errors
    /// Returns a validation error for malformed clock values, an inverted
    /// window, or a zero default duration.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ValidationError> {
        let day_start: ClockTime = self.planner.day_start.parse()?;
        let day_end = parse_window_end(&self.planner.day_end)?;
        let config = SchedulerConfig {
            day_start: day_start.minutes(),
            day_end,
            break_minutes: self.planner.break_minutes,
            default_duration_minutes: self.planner.default_duration_minutes,
            default_busy_minutes: self.planner.default_busy_minutes,
        };
        config.validate()?;
        Ok(config)
    }
}
