//! TOML-based application configuration.
//!
//! Holds:
//! - Offer mechanics (countdown window, stock decay parameters)
//! - Contact details used to build follow-up links
//! - Which storage backend to open
//!
//! Configuration is stored at `~/.config/offerkit/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::stock::StockConfig;

/// Longest accepted countdown window: one year.
pub const MAX_COUNTDOWN_HOURS: u32 = 24 * 366;

/// Urgency mechanics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferConfig {
    /// Rolling countdown window, restarted on expiry.
    #[serde(default = "default_countdown_hours")]
    pub countdown_hours: u32,
    #[serde(default = "default_initial_stock")]
    pub initial_stock: u32,
    /// Stock never decays below this.
    #[serde(default = "default_min_stock_floor")]
    pub min_stock_floor: u32,
    /// Base decay interval, jittered per day.
    #[serde(default = "default_decrement_every_min")]
    pub decrement_every_min: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactConfig {
    #[serde(default = "default_phone")]
    pub phone: String,
    #[serde(default = "default_telegram_username")]
    pub telegram_username: String,
    #[serde(default = "default_whatsapp_number")]
    pub whatsapp_number: String,
    #[serde(default = "default_product_name")]
    pub product_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackendKind,
    /// Database file name, relative to the data directory.
    #[serde(default = "default_db_file")]
    pub file: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/offerkit/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub offer: OfferConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_countdown_hours() -> u32 {
    48
}
fn default_initial_stock() -> u32 {
    20
}
fn default_min_stock_floor() -> u32 {
    6
}
fn default_decrement_every_min() -> u32 {
    17
}
fn default_phone() -> String {
    "+37499752599".into()
}
fn default_telegram_username() -> String {
    "AvetikN".into()
}
fn default_whatsapp_number() -> String {
    "37499752599".into()
}
fn default_product_name() -> String {
    "Premium Tool Set".into()
}
fn default_backend() -> StorageBackendKind {
    StorageBackendKind::Sqlite
}
fn default_db_file() -> String {
    "offerkit.db".into()
}

impl Default for OfferConfig {
    fn default() -> Self {
        Self {
            countdown_hours: default_countdown_hours(),
            initial_stock: default_initial_stock(),
            min_stock_floor: default_min_stock_floor(),
            decrement_every_min: default_decrement_every_min(),
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            phone: default_phone(),
            telegram_username: default_telegram_username(),
            whatsapp_number: default_whatsapp_number(),
            product_name: default_product_name(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            file: default_db_file(),
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
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot assign a whole section".into()));
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

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
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

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The new configuration must
    /// still produce valid engine inputs; nothing is written to disk.
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
        updated
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.countdown_window()?;
        self.stock_config()?;
        Ok(())
    }

    pub fn countdown_window(&self) -> Result<Duration, ValidationError> {
        if self.offer.countdown_hours == 0 {
            return Err(ValidationError::InvalidValue {
                field: "offer.countdown_hours".into(),
                message: "countdown window must be positive".into(),
            });
        }
        if self.offer.countdown_hours > MAX_COUNTDOWN_HOURS {
            return Err(ValidationError::InvalidValue {
                field: "offer.countdown_hours".into(),
                message: format!("countdown window must be at most {MAX_COUNTDOWN_HOURS} hours"),
            });
        }
        Ok(Duration::hours(i64::from(self.offer.countdown_hours)))
    }

    pub fn stock_config(&self) -> Result<StockConfig, ValidationError> {
        StockConfig::new(
            self.offer.initial_stock,
            self.offer.min_stock_floor,
            self.offer.decrement_every_min,
        )
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
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[offer]\ninitial_stock = 30\n").unwrap();
        assert_eq!(parsed.offer.initial_stock, 30);
        assert_eq!(parsed.offer.min_stock_floor, 6);
        assert_eq!(parsed.storage.backend, StorageBackendKind::Sqlite);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.offer.countdown_hours, 48);
        assert_eq!(cfg.offer.initial_stock, 20);
        assert_eq!(cfg.offer.min_stock_floor, 6);
        assert_eq!(cfg.offer.decrement_every_min, 17);
        assert_eq!(cfg.storage.file, "offerkit.db");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("offer.countdown_hours").as_deref(), Some("48"));
        assert_eq!(cfg.get("contact.telegram_username").as_deref(), Some("AvetikN"));
        assert_eq!(cfg.get("storage.backend").as_deref(), Some("sqlite"));
        assert!(cfg.get("offer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_number_and_string() {
        let mut cfg = Config::default();
        cfg.set("offer.initial_stock", "25").unwrap();
        cfg.set("contact.phone", "+100").unwrap();
        assert_eq!(cfg.offer.initial_stock, 25);
        assert_eq!(cfg.contact.phone, "+100");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("offer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("offer.initial_stock", "lots").is_err());
        assert!(cfg.set("storage.backend", "redis").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_floor_above_initial() {
        let mut cfg = Config::default();
        let err = cfg.set("offer.min_stock_floor", "21").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.offer.min_stock_floor, 6);
    }

    #[test]
    fn zero_countdown_is_invalid() {
        let mut cfg = Config::default();
        assert!(cfg.set("offer.countdown_hours", "0").is_err());
    }

    #[test]
    fn oversized_countdown_is_invalid() {
        let mut cfg = Config::default();
        let err = cfg.set("offer.countdown_hours", "4294967295").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.offer.countdown_hours, 48);

        cfg.set("offer.countdown_hours", &MAX_COUNTDOWN_HOURS.to_string())
            .unwrap();
        assert_eq!(
            cfg.countdown_window().unwrap(),
            Duration::hours(i64::from(MAX_COUNTDOWN_HOURS))
        );

        let file: Config = toml::from_str("[offer]\ncountdown_hours = 100000\n").unwrap();
        assert!(file.countdown_window().is_err());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("offer.decrement_every_min", "9").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().offer.decrement_every_min, 9);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "offer = 3 = 4").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
