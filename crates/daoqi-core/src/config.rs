//! TOML-based application configuration.
//!
//! Stores reminder preferences:
//! - Daily digest time and on/off switch
//! - Advance reminder lead time before a task's due moment
//! - Overdue sweep interval
//!
//! Configuration is stored at `~/.config/daoqi/config.toml`.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::data_dir;

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/daoqi/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Wall-clock time of the daily digest, "HH:MM".
    #[serde(default = "default_digest_time")]
    pub digest_time: String,
    #[serde(default = "default_true")]
    pub digest_enabled: bool,
    /// Minutes before the due moment at which the advance reminder fires.
    #[serde(default = "default_advance_minutes")]
    pub advance_minutes: u32,
    #[serde(default = "default_true")]
    pub due_reminder_enabled: bool,
    /// Hours between overdue sweeps.
    #[serde(default = "default_sweep_interval_hours")]
    pub sweep_interval_hours: u32,
    /// Default @-all behavior for scopes without an explicit setting.
    #[serde(default)]
    pub at_all_enabled: bool,
}

// Default functions
fn default_digest_time() -> String {
    "08:00".to_string()
}
fn default_advance_minutes() -> u32 {
    30
}
fn default_sweep_interval_hours() -> u32 {
    2
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            digest_time: default_digest_time(),
            digest_enabled: true,
            advance_minutes: default_advance_minutes(),
            due_reminder_enabled: true,
            sweep_interval_hours: default_sweep_interval_hours(),
            at_all_enabled: false,
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/daoqi"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.digest_time()?;
        if self.sweep_interval_hours == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sweep_interval_hours".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parsed digest time.
    pub fn digest_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.digest_time, "%H:%M").map_err(|_| {
            ConfigError::InvalidValue {
                key: "digest_time".to_string(),
                message: format!("expected HH:MM, got {:?}", self.digest_time),
            }
        })
    }

    pub fn advance(&self) -> Duration {
        Duration::minutes(i64::from(self.advance_minutes))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::hours(i64::from(self.sweep_interval_hours))
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Rejects unknown keys and values the
    /// field cannot hold; does not persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| invalid("not an object".to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| invalid("unknown config key".to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse {value:?} as bool")))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("cannot parse {value:?} as number")))?
                    .into(),
            ),
            _ => serde_json::Value::String(value.to_string()),
        };
        obj.insert(key.to_string(), new_value);

        let updated: Config =
            serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.digest_time, "08:00");
        assert_eq!(parsed.advance_minutes, 30);
        assert_eq!(parsed.sweep_interval_hours, 2);
        assert!(parsed.digest_enabled);
        assert!(parsed.due_reminder_enabled);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str("advance_minutes = 15").unwrap();
        assert_eq!(cfg.advance_minutes, 15);
        assert_eq!(cfg.digest_time, "08:00");
        assert!(cfg.digest_enabled);
    }

    #[test]
    fn digest_time_parses_and_rejects_garbage() {
        let mut cfg = Config::default();
        assert_eq!(
            cfg.digest_time().unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        cfg.digest_time = "25:00".to_string();
        assert!(matches!(
            cfg.digest_time(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn set_updates_typed_fields() {
        let mut cfg = Config::default();
        cfg.set("digest_time", "09:30").unwrap();
        assert_eq!(cfg.digest_time, "09:30");
        cfg.set("advance_minutes", "45").unwrap();
        assert_eq!(cfg.advance_minutes, 45);
        cfg.set("digest_enabled", "false").unwrap();
        assert!(!cfg.digest_enabled);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("no_such_key", "1").is_err());
        assert!(cfg.set("advance_minutes", "soon").is_err());
        assert!(cfg.set("digest_time", "morning").is_err());
        // Unchanged after failed sets.
        assert_eq!(cfg.advance_minutes, 30);
        assert_eq!(cfg.digest_time, "08:00");
    }

    #[test]
    fn save_and_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.advance_minutes = 10;
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.advance_minutes, 10);
    }
}
