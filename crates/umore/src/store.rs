//! Persistence of the journal in a key-value store
//!
//! The journal lives under two independent keys:
//! - `grid`: JSON array of 365 color strings
//! - `darkMode`: JSON boolean
//!
//! Reads treat a missing or undecodable key as absent. Writes are best
//! effort: failures are logged and dropped.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::types::{Mood, DAYS_IN_GRID};

pub const GRID_KEY: &str = "grid";
pub const DARK_MODE_KEY: &str = "darkMode";

/// Errors raised at the storage boundary
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed value under key `{key}`: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored grid has {found} days, expected {expected}")]
    WrongLength { expected: usize, found: usize },
}

/// String-keyed storage of string values
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Store chosen at runtime (on disk or in memory)
pub type DynStore = Box<dyn KeyValueStore + Send>;

/// Process-local store, nothing survives a restart
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Whatever was found in the store; `None` means the key was absent or unusable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub moods: Option<Vec<Mood>>,
    pub dark_mode: Option<bool>,
}

/// Reads and writes journal state through a [`KeyValueStore`]
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Load both keys independently
    pub fn load(&self) -> Snapshot {
        let moods = self.read_grid().unwrap_or_else(|e| {
            warn!(key = GRID_KEY, error = %e, "Ignoring stored grid");
            None
        });
        let dark_mode = self.read_dark_mode().unwrap_or_else(|e| {
            warn!(key = DARK_MODE_KEY, error = %e, "Ignoring stored dark mode flag");
            None
        });

        debug!(
            has_grid = moods.is_some(),
            has_dark_mode = dark_mode.is_some(),
            "Loaded journal state"
        );
        Snapshot { moods, dark_mode }
    }

    /// Write both keys
    #[cfg(test)]
    pub fn save(&mut self, moods: &[Mood], dark_mode: bool) {
        self.save_moods(moods);
        self.save_dark_mode(dark_mode);
    }

    pub fn save_moods(&mut self, moods: &[Mood]) {
        match serde_json::to_string(moods) {
            Ok(json) => self.write(GRID_KEY, &json),
            Err(e) => warn!(key = GRID_KEY, error = %e, "Failed to encode grid"),
        }
    }

    pub fn save_dark_mode(&mut self, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        self.write(DARK_MODE_KEY, value);
    }

    /// Drop the stored grid so the next load starts from defaults
    pub fn clear_moods(&mut self) {
        if let Err(e) = self.store.remove(GRID_KEY) {
            warn!(key = GRID_KEY, error = %e, "Failed to remove stored grid");
        }
    }

    fn write(&mut self, key: &'static str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key = key, error = %e, "Failed to persist value");
        }
    }

    fn read_grid(&self) -> Result<Option<Vec<Mood>>, StoreError> {
        self.store
            .get(GRID_KEY)?
            .map(|raw| decode_grid(&raw))
            .transpose()
    }

    fn read_dark_mode(&self) -> Result<Option<bool>, StoreError> {
        self.store
            .get(DARK_MODE_KEY)?
            .map(|raw| {
                serde_json::from_str::<bool>(&raw).map_err(|source| StoreError::Malformed {
                    key: DARK_MODE_KEY,
                    source,
                })
            })
            .transpose()
    }
}

/// Decode a stored grid, rejecting anything that is not exactly one mood per day
pub fn decode_grid(raw: &str) -> Result<Vec<Mood>, StoreError> {
    let moods: Vec<Mood> = serde_json::from_str(raw).map_err(|source| StoreError::Malformed {
        key: GRID_KEY,
        source,
    })?;

    if moods.len() != DAYS_IN_GRID {
        return Err(StoreError::WrongLength {
            expected: DAYS_IN_GRID,
            found: moods.len(),
        });
    }

    Ok(moods)
}
