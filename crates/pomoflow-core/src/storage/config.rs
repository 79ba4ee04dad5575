//! TOML-based application configuration.
//!
//! Stores:
//! - Countdown durations per timer mode
//! - Distraction prompt sampling parameters
//! - The remote API endpoint
//!
//! Configuration is stored at `~/.config/pomoflow/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::data_dir;
use crate::distraction::{DistractionSampler, DEFAULT_GROUP_SIZE, DEFAULT_QUOTA};
use crate::error::{ConfigError, CoreError};
use crate::timer::ModeDurations;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Countdown durations, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_secs")]
    pub focus_secs: u64,
    /// Falls back to `focus_secs` when unset.
    #[serde(default)]
    pub short_break_secs: Option<u64>,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistractionConfig {
    #[serde(default = "default_group_size")]
    pub group_size: u64,
    #[serde(default = "default_prompts_per_group")]
    pub prompts_per_group: u64,
    /// Keep the prompt history across restarts.
    #[serde(default = "default_true")]
    pub persist_history: bool,
    /// Fixed RNG seed; entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Remote features are disabled while this is unset.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomoflow/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub distraction: DistractionConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_focus_secs() -> u64 {
    25 * 60
}
fn default_long_break_secs() -> u64 {
    15 * 60
}
fn default_group_size() -> u64 {
    DEFAULT_GROUP_SIZE
}
fn default_prompts_per_group() -> u64 {
    DEFAULT_QUOTA
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_secs: default_focus_secs(),
            short_break_secs: None,
            long_break_secs: default_long_break_secs(),
        }
    }
}

impl Default for DistractionConfig {
    fn default() -> Self {
        Self {
            group_size: default_group_size(),
            prompts_per_group: default_prompts_per_group(),
            persist_history: true,
            seed: None,
        }
    }
}

impl TimerConfig {
    pub fn durations(&self) -> ModeDurations {
        ModeDurations {
            work_secs: self.focus_secs,
            short_break_secs: self.short_break_secs.unwrap_or(self.focus_secs),
            long_break_secs: self.long_break_secs,
        }
    }
}

impl DistractionConfig {
    /// Fresh sampler with these parameters and an empty history.
    pub fn sampler(&self) -> Result<DistractionSampler, ConfigError> {
        DistractionSampler::new(self.group_size, self.prompts_per_group).map_err(|e| {
            ConfigError::InvalidValue {
                key: "distraction".into(),
                message: e.to_string(),
            }
        })
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
                    // Unset optional: "none" or empty keeps it unset.
                    serde_json::Value::Null => match value.trim() {
                        "" | "none" => serde_json::Value::Null,
                        v => match v.parse::<u64>() {
                            Ok(n) => serde_json::Value::Number(n.into()),
                            Err(_) => serde_json::Value::String(v.to_string()),
                        },
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    serde_json::Value::String(_) => match value.trim() {
                        "none" => serde_json::Value::Null,
                        _ => serde_json::Value::String(value.into()),
                    },
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load from disk, writing the defaults out if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        if path.exists() {
            Ok(Self::load_from(&path)?)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        Ok(self.save_to(&Self::path()?)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Reject values the timer or sampler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |key: &str, secs: u64| {
            if secs == 0 {
                Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be greater than zero".into(),
                })
            } else {
                Ok(())
            }
        };
        positive("timer.focus_secs", self.timer.focus_secs)?;
        positive("timer.long_break_secs", self.timer.long_break_secs)?;
        if let Some(secs) = self.timer.short_break_secs {
            positive("timer.short_break_secs", secs)?;
        }
        self.distraction.sampler()?;
        if let Some(base) = &self.api.base_url {
            url::Url::parse(base).map_err(|e| ConfigError::InvalidValue {
                key: "api.base_url".into(),
                message: e.to_string(),
            })?;
        }
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

    /// Update one value in memory. The whole configuration is revalidated
    /// and left unchanged on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Every leaf key with its current value, in dot-path form.
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
    }

    #[test]
    fn short_break_defaults_to_focus() {
        let mut cfg = Config::default();
        cfg.timer.focus_secs = 1200;
        let d = cfg.timer.durations();
        assert_eq!(d.work_secs, 1200);
        assert_eq!(d.short_break_secs, 1200);
        assert_eq!(d.long_break_secs, 900);

        cfg.timer.short_break_secs = Some(300);
        assert_eq!(cfg.timer.durations().short_break_secs, 300);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[timer]\nfocus_secs = 60\n").unwrap();
        assert_eq!(cfg.timer.focus_secs, 60);
        assert_eq!(cfg.timer.long_break_secs, 900);
        assert_eq!(cfg.distraction.group_size, 10);
        assert!(cfg.distraction.persist_history);
        assert!(cfg.api.base_url.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.focus_secs").as_deref(), Some("1500"));
        assert_eq!(cfg.get("distraction.persist_history").as_deref(), Some("true"));
        assert_eq!(cfg.get("api.base_url").as_deref(), Some("null"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.apply("timer.focus_secs", "600").unwrap();
        cfg.apply("distraction.persist_history", "false").unwrap();
        cfg.apply("timer.short_break_secs", "120").unwrap();
        cfg.apply("api.base_url", "http://localhost:8000").unwrap();
        cfg.apply("distraction.seed", "42").unwrap();
        assert_eq!(cfg.timer.focus_secs, 600);
        assert!(!cfg.distraction.persist_history);
        assert_eq!(cfg.timer.short_break_secs, Some(120));
        assert_eq!(cfg.api.base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cfg.distraction.seed, Some(42));

        cfg.apply("api.base_url", "none").unwrap();
        assert!(cfg.api.base_url.is_none());
    }

    #[test]
    fn apply_rejects_bad_input() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.apply("timer", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.apply("distraction.persist_history", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.apply("timer.focus_secs", "0").is_err());
        assert!(cfg.apply("distraction.prompts_per_group", "11").is_err());
        assert!(cfg.apply("api.base_url", "not a url").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut cfg = Config::default();
        cfg.apply("timer.long_break_secs", "1200").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);

        std::fs::write(&path, "timer = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn entries_lists_leaf_keys() {
        let keys: Vec<String> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"timer.focus_secs".to_string()));
        assert!(keys.contains(&"distraction.seed".to_string()));
        assert!(keys.contains(&"api.base_url".to_string()));
    }
}
