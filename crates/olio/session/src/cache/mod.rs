//! Persisted key-value storage and the bootstrap cache built on it.

mod bootstrap;
mod file;
mod memory;

pub use bootstrap::BootstrapCache;
pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

use crate::error::Result;

/// Synchronous string key-value store, the shape of browser local storage.
///
/// Reads happen once at startup on the critical path of the first frame, so
/// the interface is deliberately blocking and small.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
