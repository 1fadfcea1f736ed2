//! In-memory key-value store for development and testing.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::KeyValueStore;
use crate::error::{Result, SessionError};

/// In-memory [`KeyValueStore`] with optional failure injection.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
    failure: RwLock<Option<String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `reason` (or succeed again
    /// with `None`).
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.write() = reason.map(str::to_string);
    }

    /// Raw access that bypasses failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    fn check(&self) -> Result<()> {
        match self.failure.read().as_ref() {
            Some(reason) => Err(SessionError::Cache(reason.clone())),
            None => Ok(()),
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries.write().remove(key);
        Ok(())
    }
}
