//! Cache for generated artifacts.

use crate::artifacts::Artifact;
use crate::error::{Result, TarpitError};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Cache key: (archetype id, lowercased format).
pub type ArtifactKey = (String, String);

/// Generated artifacts, re-served until they expire.
#[derive(Clone)]
pub struct ArtifactCache {
    inner: Cache<ArtifactKey, Arc<Artifact>>,
}

impl ArtifactCache {
    /// Create a new cache with the given parameters.
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { inner }
    }

    /// Return the cached artifact for `key`, generating and storing it on a miss.
    ///
    /// Concurrent misses for one key share a single generation. Failed
    /// generations are not cached.
    pub async fn get_or_generate<F>(&self, key: ArtifactKey, generate: F) -> Result<Arc<Artifact>>
    where
        F: FnOnce() -> Result<Artifact>,
    {
        let format = key.1.clone();
        self.inner
            .try_get_with(key, async move { generate().map(Arc::new) })
            .await
            .map_err(|shared| {
                Arc::try_unwrap(shared)
                    .unwrap_or_else(|shared| TarpitError::artifact(format, shared))
            })
    }

    /// Get the current entry count.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
