//! Durable key-value storage.
//!
//! [`Store`] is the only gateway to persisted state. It serializes values as
//! JSON over a pluggable string-keyed [`KvBackend`] and absorbs every failure:
//! a corrupt or unreadable value reads as absent, and a rejected write is
//! logged and dropped. Callers get best-effort persistence and must not assume
//! a write landed.

mod config;
mod database;
mod memory;

pub use config::{
    Config, ContactConfig, OfferConfig, StorageBackendKind, StorageConfig, MAX_COUNTDOWN_HOURS,
};
pub use database::SqliteBackend;
pub use memory::MemoryBackend;

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{ConfigError, CoreError, StoreError};

/// Keys under which the page state lives. One owner per key.
pub mod keys {
    pub const LEADS: &str = "shop-tools-leads";
    pub const COMMENTS: &str = "shop-tools-comments";
    pub const COUNTDOWN_START: &str = "shop-tools-countdown-start";
    pub const STOCK_STATE: &str = "shop-tools-stock-state";

    pub const ALL: [&str; 4] = [LEADS, COMMENTS, COUNTDOWN_START, STOCK_STATE];
}

/// Raw string-keyed persistence medium.
pub trait KvBackend: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    fn remove_raw(&self, key: &str) -> Result<(), StoreError>;

    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Typed JSON wrapper over a shared backend.
///
/// Cloning is cheap; clones write through to the same backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KvBackend>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Store backed by a fresh, unbounded in-memory map.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open the store described by `config`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable, or if the
    /// SQLite file cannot be opened or migrated.
    pub fn open(config: &StorageConfig) -> Result<Self, CoreError> {
        match config.backend {
            StorageBackendKind::Memory => Ok(Self::in_memory()),
            StorageBackendKind::Sqlite => {
                let path = data_dir()?.join(&config.file);
                Ok(Self::new(SqliteBackend::open(path)?))
            }
        }
    }

    /// Read and deserialize `key`. Absent, empty, unreadable and malformed
    /// values all come back as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_raw(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored item");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "failed to parse stored item");
                None
            }
        }
    }

    /// Serialize and store `value`. Returns whether the write landed; a
    /// failure is logged and otherwise ignored.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(source) => {
                let e = StoreError::Serde {
                    key: key.to_string(),
                    source,
                };
                error!(key, error = %e, "failed to serialize item");
                return false;
            }
        };
        match self.backend.set_raw(key, &raw) {
            Ok(()) => true,
            Err(e) => {
                error!(key, error = %e, "failed to set stored item");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove_raw(key) {
            error!(key, error = %e, "failed to remove stored item");
        }
    }

    /// Keys currently present in the backend; empty on failure.
    pub fn keys(&self) -> Vec<String> {
        self.backend.keys().unwrap_or_else(|e| {
            warn!(error = %e, "failed to list stored keys");
            Vec::new()
        })
    }

    // ── Array-valued keys ────────────────────────────────────────────

    pub fn get_or_empty<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.get(key).unwrap_or_default()
    }

    pub fn append<T: Serialize + DeserializeOwned>(&self, key: &str, item: T) -> bool {
        let mut items: Vec<T> = self.get_or_empty(key);
        items.push(item);
        self.set(key, &items)
    }

    /// Insert at the head, so newest-first listings need no sorting.
    pub fn prepend<T: Serialize + DeserializeOwned>(&self, key: &str, item: T) -> bool {
        let mut items: Vec<T> = self.get_or_empty(key);
        items.insert(0, item);
        self.set(key, &items)
    }

    /// Replace the first item matching `predicate`. Returns false when
    /// nothing matched or the write failed.
    pub fn update_where<T, P, F>(&self, key: &str, predicate: P, updater: F) -> bool
    where
        T: Serialize + DeserializeOwned,
        P: Fn(&T) -> bool,
        F: FnOnce(T) -> T,
    {
        let mut items: Vec<T> = self.get_or_empty(key);
        let Some(index) = items.iter().position(predicate) else {
            return false;
        };
        let item = items.remove(index);
        items.insert(index, updater(item));
        self.set(key, &items)
    }

    /// Drop every item matching `predicate`; returns how many were dropped.
    pub fn remove_where<T, P>(&self, key: &str, predicate: P) -> usize
    where
        T: Serialize + DeserializeOwned,
        P: Fn(&T) -> bool,
    {
        let items: Vec<T> = self.get_or_empty(key);
        let before = items.len();
        let kept: Vec<T> = items.into_iter().filter(|item| !predicate(item)).collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.set(key, &kept);
        }
        removed
    }

    pub fn count<T: DeserializeOwned>(&self, key: &str) -> usize {
        self.get_or_empty::<T>(key).len()
    }
}

/// Returns `~/.config/offerkit[-dev]/` based on OFFERKIT_ENV.
///
/// Set OFFERKIT_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("OFFERKIT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("offerkit-dev")
    } else {
        base_dir.join("offerkit")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
