//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - User name used to personalize reminders
//! - Location and calculation method
//! - Per-prayer reminder switches and lead times
//! - Timing source endpoint, cache age, clock settings
//!
//! Configuration is stored at `~/.config/nur/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::cache::DEFAULT_MAX_AGE_DAYS;
use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::location::Location;
use crate::method::CalculationMethod;
use crate::prayer::Prayer;
use crate::preferences::ReminderPreferences;
use crate::zone::DayZone;

pub const DEFAULT_TIMING_BASE_URL: &str = "https://api.aladhan.com/v1/timings";

/// Remote timing source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Schedule cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

/// Schedule clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Fixed "+HH:MM" offset calendar days are reckoned in.
    /// Absent means the system's local time zone.
    #[serde(default)]
    pub utc_offset: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/nur/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub calculation_method: CalculationMethod,
    #[serde(default)]
    pub reminders: ReminderPreferences,
    #[serde(default)]
    pub timing_source: TimingSourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub clock: ClockConfig,
}

// Default functions
fn default_base_url() -> String {
    DEFAULT_TIMING_BASE_URL.into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_max_age_days() -> u32 {
    DEFAULT_MAX_AGE_DAYS
}
fn default_tick_secs() -> u64 {
    60
}

impl Default for TimingSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            utc_offset: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            location: Location::default(),
            calculation_method: CalculationMethod::default(),
            reminders: ReminderPreferences::default(),
            timing_source: TimingSourceConfig::default(),
            cache: CacheConfig::default(),
            clock: ClockConfig::default(),
        }
    }
}

impl TimingSourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}

impl Config {
    /// Value a reminders map implies for a prayer it has no entry for.
    fn reminder_entry_default(key: &str) -> Option<serde_json::Value> {
        let (map, name) = key.strip_prefix("reminders.")?.split_once('.')?;
        name.parse::<Prayer>().ok().filter(|p| p.name() == name)?;
        match map {
            "enabled" => Some(serde_json::Value::Bool(true)),
            "lead_minutes" => Some(serde_json::Value::Number(0.into())),
            _ => None,
        }
    }

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

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = match obj.get(part) {
                    Some(v) => v.clone(),
                    None => Self::reminder_entry_default(key).ok_or_else(unknown)?,
                };

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("'{value}': {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
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

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Check values that deserialize fine but are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, e: ValidationError| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        };
        self.location
            .validate()
            .map_err(|e| invalid("location", e))?;
        self.day_zone().map_err(|e| invalid("clock.utc_offset", e))?;
        Ok(())
    }

    /// Zone calendar days are reckoned in.
    pub fn day_zone(&self) -> Result<DayZone, ValidationError> {
        match self.clock.utc_offset.as_deref() {
            None => Ok(DayZone::Local),
            Some(s) if s.trim().is_empty() || s.eq_ignore_ascii_case("local") => Ok(DayZone::Local),
            Some(s) => DayZone::parse_offset(s),
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)
            .cloned()
            .or_else(|| Self::reminder_entry_default(key))?;
        match val {
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. Returns error if key is
    /// unknown or the resulting config is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }
}
