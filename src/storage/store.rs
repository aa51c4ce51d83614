use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use super::schema::Database;
use super::types::DatabaseError;

/// Default capacity of [`MemoryStore`]
pub const DEFAULT_MEMORY_CAPACITY: usize = 512;

/// String key-value persistence.
///
/// Implemented by [`MemoryStore`] for tests and single runs, and by
/// [`Database`] for a cache that survives between builds.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, DatabaseError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), DatabaseError>> + Send;
}

/// Bounded in-memory store; the least recently used key is evicted first.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<LruCache<String, String>>,
}

impl MemoryStore {
    /// Creates a store holding at most `capacity` keys (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, String>> {
        // A panic while holding the lock cannot leave the map half-written
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.lock().put(key.to_owned(), value.to_owned());
        Ok(())
    }
}

impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.get_value(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.set_value(key, value).await
    }
}
