//! Bootstrap cache: the persisted `{user, orgId, role, ts}` snapshot.
//!
//! Advisory, never authoritative. The infallible methods are what the
//! coordinator uses; they log and swallow every storage or parse failure so
//! the startup path can never be blocked by a broken cache.

use std::sync::Arc;

use olio_types::{BootstrapRecord, Identity, OrganizationId, Role};
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::Result;

#[derive(Clone)]
pub struct BootstrapCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl BootstrapCache {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Best-effort read; an empty record on any failure.
    pub fn read(&self) -> BootstrapRecord {
        match self.try_read() {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Bootstrap cache read failed, starting cold");
                BootstrapRecord::default()
            }
        }
    }

    /// Best-effort write of the latest known state.
    pub fn write(&self, user: &Identity, org_id: Option<&OrganizationId>, role: Option<Role>) {
        let record = BootstrapRecord::new(user.clone(), org_id.cloned(), role);
        if let Err(e) = self.try_write(&record) {
            warn!(key = %self.key, error = %e, "Bootstrap cache write failed");
        }
    }

    /// Best-effort removal, used on sign-out.
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            warn!(key = %self.key, error = %e, "Bootstrap cache clear failed");
        }
    }

    /// Read the record, reporting storage failures.
    ///
    /// Unparseable contents are not an error: they are logged and treated
    /// as an empty record.
    pub fn try_read(&self) -> Result<BootstrapRecord> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(BootstrapRecord::default());
        };
        match serde_json::from_str::<BootstrapRecord>(&raw) {
            Ok(record) => {
                debug!(key = %self.key, warm = record.is_warm(), "Bootstrap cache read");
                Ok(record)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Ignoring corrupt bootstrap cache");
                Ok(BootstrapRecord::default())
            }
        }
    }

    pub fn try_write(&self, record: &BootstrapRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.store.set(&self.key, &raw)
    }

    pub fn try_clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryKeyValueStore;

    fn cache() -> (Arc<MemoryKeyValueStore>, BootstrapCache) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let cache = BootstrapCache::new(store.clone(), "olio.bootstrap");
        (store, cache)
    }

    #[test]
    fn test_empty_store_reads_empty_record() {
        let (_, cache) = cache();
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let (store, cache) = cache();
        let org = OrganizationId::new("org-1");
        cache.write(&Identity::new("u-1"), Some(&org), Some(Role::Owner));

        let record = cache.read();
        assert!(record.is_warm());
        assert_eq!(record.org_id, Some(org));
        assert_eq!(record.role, Some(Role::Owner));
        assert!(store.raw("olio.bootstrap").unwrap().contains("\"orgId\":\"org-1\""));
    }

    #[test]
    fn test_corrupt_json_reads_empty() {
        let (store, cache) = cache();
        store.insert_raw("olio.bootstrap", "{not json");
        assert!(cache.try_read().unwrap().is_empty());
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let (store, cache) = cache();
        cache.write(&Identity::new("u-1"), None, Some(Role::Member));
        store.set_failure(Some("disk full"));

        assert!(cache.read().is_empty());
        cache.write(&Identity::new("u-2"), None, None);
        cache.clear();
        assert!(cache.try_read().is_err());

        store.set_failure(None);
        let record = cache.read();
        assert_eq!(record.user.unwrap().id.as_str(), "u-1");
    }

    #[test]
    fn test_clear_removes_record() {
        let (_, cache) = cache();
        cache.write(&Identity::new("u-1"), None, None);
        cache.clear();
        assert!(cache.read().is_empty());
    }
}
