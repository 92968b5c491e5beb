//! TOML-based application configuration.
//!
//! Stores preferences that are not part of the dashboard snapshot:
//! - Focus and break preset lengths
//! - Tip rotation interval and whether it starts enabled
//! - Default log level
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{validate_minutes, DEFAULT_BREAK_MIN, DEFAULT_FOCUS_MIN};
use crate::tips::TIP_ROTATION_PERIOD;

pub const CONFIG_FILE: &str = "config.toml";

/// Timer presets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

/// Study tip rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipsConfig {
    #[serde(default = "default_rotation_secs")]
    pub rotation_secs: u64,
    /// Value of the auto-rotate setting for a fresh store.
    #[serde(default = "default_true")]
    pub auto_rotate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Used when `STUDYDESK_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub tips: TipsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_focus_minutes() -> u32 {
    DEFAULT_FOCUS_MIN
}
fn default_break_minutes() -> u32 {
    DEFAULT_BREAK_MIN
}
fn default_rotation_secs() -> u64 {
    TIP_ROTATION_PERIOD.as_secs()
}
fn default_true() -> bool {
    true
}
fn default_level() -> String {
    "warn".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl Default for TipsConfig {
    fn default() -> Self {
        Self {
            rotation_secs: default_rotation_secs(),
            auto_rotate: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl TipsConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.rotation_secs)
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

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                    _ => return Err(unknown()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Checks ranges that the TOML types alone do not enforce.
    ///
    /// # Errors
    /// Returns the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, minutes) in [
            ("timer.focus_minutes", self.timer.focus_minutes),
            ("timer.break_minutes", self.timer.break_minutes),
        ] {
            validate_minutes(minutes).map_err(|e| ConfigError::InvalidValue {
                key: key.into(),
                message: e.to_string(),
            })?;
        }
        if self.tips.rotation_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tips.rotation_secs".into(),
                message: "must be at least 1 second".into(),
            });
        }
        LevelFilter::from_str(&self.logging.level).map_err(|e| ConfigError::InvalidValue {
            key: "logging.level".into(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// `<data dir>/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from(CONFIG_FILE),
            message: e.to_string(),
        })?;
        Ok(dir.join(CONFIG_FILE))
    }

    /// Load from the data directory, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Like [`Config::load`], for an explicit path.
    ///
    /// # Errors
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
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

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
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
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a leaf value by dot-separated key. The change is not saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or is out of range. The config is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
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

    /// Every leaf as `(dot.path, value)`, sorted by key.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            flatten("", &json, &mut out);
        }
        out
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
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
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.timer.focus_minutes, 25);
        assert_eq!(parsed.tips.rotation_secs, 30);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\nfocus_minutes = 50\n").unwrap();
        assert_eq!(parsed.timer.focus_minutes, 50);
        assert_eq!(parsed.timer.break_minutes, 5);
        assert!(parsed.tips.auto_rotate);
        assert_eq!(parsed.logging.level, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("tips.auto_rotate").as_deref(), Some("true"));
        assert_eq!(cfg.get("timer.focus_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("warn"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("timer").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("timer.focus_minutes", "50").unwrap();
        cfg.set("tips.auto_rotate", "false").unwrap();
        cfg.set("logging.level", "debug").unwrap();
        assert_eq!(cfg.timer.focus_minutes, 50);
        assert!(!cfg.tips.auto_rotate);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.set("timer", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values_without_change() {
        let mut cfg = Config::default();
        assert!(cfg.set("tips.auto_rotate", "not_a_bool").is_err());
        assert!(cfg.set("timer.focus_minutes", "121").is_err());
        assert!(cfg.set("timer.break_minutes", "0").is_err());
        assert!(cfg.set("tips.rotation_secs", "0").is_err());
        assert!(cfg.set("logging.level", "loud").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn list_flattens_leaves() {
        let keys: Vec<String> = Config::default().list().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"timer.focus_minutes".to_string()));
        assert!(keys.contains(&"tips.rotation_secs".to_string()));
        assert!(keys.contains(&"logging.level".to_string()));
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("timer.break_minutes", "10").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timer.break_minutes, 10);
    }

    #[test]
    fn load_from_rejects_out_of_range_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[timer]\nfocus_minutes = 500\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_leaves_unreadable_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let bytes = b"[timer]\nfocus_minutes = \xff\xfe\n";
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
