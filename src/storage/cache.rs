use futures::future::join_all;

use super::store::KeyValueStore;
use super::types::DatabaseError;
use crate::api::ApiError;
use crate::gallery::{FetchOutcome, MetadataSource, PodcastMetadata};

/// Key prefix for cached podcast metadata
const KEY_PREFIX: &str = "podcast:";

/// Catalog metadata persisted as JSON under `podcast:{uuid}`.
#[derive(Debug)]
pub struct MetadataCache<S> {
    store: S,
}

impl<S: KeyValueStore> MetadataCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(uuid: &str) -> String {
        format!("{KEY_PREFIX}{uuid}")
    }

    /// Cached metadata for `uuid`.
    ///
    /// A value that no longer deserializes is reported as a miss.
    pub async fn get(&self, uuid: &str) -> Result<Option<PodcastMetadata>, DatabaseError> {
        let Some(raw) = self.store.get(&Self::key(uuid)).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<PodcastMetadata>(&raw) {
            Ok(mut meta) => {
                // The key is authoritative
                meta.uuid = uuid.to_owned();
                Ok(Some(meta))
            }
            Err(e) => {
                tracing::warn!(uuid = %uuid, error = %e, "Ignoring corrupt cached metadata");
                Ok(None)
            }
        }
    }

    /// Stores `meta` under its uuid, replacing any previous value.
    pub async fn put(&self, meta: &PodcastMetadata) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(meta)?;
        self.store.set(&Self::key(&meta.uuid), &raw).await
    }
}

/// Serves gallery metadata from the cache instead of the catalog.
///
/// Used for offline builds. Misses become [`ApiError::NotCached`] and count
/// as failed fetches.
#[derive(Debug)]
pub struct CachedSource<S> {
    cache: MetadataCache<S>,
}

impl<S: KeyValueStore> CachedSource<S> {
    pub fn new(cache: MetadataCache<S>) -> Self {
        Self { cache }
    }

    async fn lookup(&self, uuid: &str) -> FetchOutcome {
        let rejected = || FetchOutcome::Rejected {
            uuid: uuid.to_owned(),
            error: ApiError::NotCached(uuid.to_owned()),
        };

        match self.cache.get(uuid).await {
            Ok(Some(data)) => FetchOutcome::Fulfilled {
                uuid: uuid.to_owned(),
                data,
            },
            Ok(None) => {
                tracing::warn!(uuid = %uuid, "No cached metadata for podcast");
                rejected()
            }
            Err(e) => {
                tracing::warn!(uuid = %uuid, error = %e, "Failed to read cached metadata");
                rejected()
            }
        }
    }
}

impl<S: KeyValueStore> MetadataSource for CachedSource<S> {
    async fn fetch_outcomes(&self, uuids: &[String]) -> Vec<FetchOutcome> {
        join_all(uuids.iter().map(|uuid| self.lookup(uuid))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn meta(uuid: &str) -> PodcastMetadata {
        PodcastMetadata {
            uuid: uuid.into(),
            title: Some("Cached show".into()),
            updated_at: Some("2024-05-01T00:00:00Z".into()),
            ..PodcastMetadata::default()
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = MetadataCache::new(MemoryStore::default());
        cache.put(&meta("a")).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some(meta("a")));
        assert_eq!(cache.get("b").await.unwrap(), None);
        assert!(cache.store().get("podcast:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_value_is_miss() {
        let cache = MetadataCache::new(MemoryStore::default());
        cache.store().set("podcast:a", "{not json").await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cached_source_outcomes() {
        let cache = MetadataCache::new(MemoryStore::default());
        cache.put(&meta("a")).await.unwrap();
        let source = CachedSource::new(cache);

        let outcomes = source
            .fetch_outcomes(&["a".to_string(), "b".to_string()])
            .await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_fulfilled());
        match &outcomes[1] {
            FetchOutcome::Rejected { uuid, error } => {
                assert_eq!(uuid, "b");
                assert!(matches!(error, ApiError::NotCached(id) if id == "b"));
            }
            other => panic!("expected a miss, got {other:?}"),
        }
    }
}
