//! Read-through TTL cache
//!
//! One process-wide store shared by every resource kind. Keys carry their
//! kind, so entries of different kinds never collide. Expiry is lazy:
//! stale entries read as absent and are replaced on the next load.

use crate::models::ResourceKind;
use crate::Result;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Identifies one cached object: a kind singleton (`markets`) or a
/// kind-scoped id (`market-data:42`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    kind: ResourceKind,
    id: Option<String>,
}

impl ResourceKey {
    pub fn singleton(kind: ResourceKind) -> Self {
        Self { kind, id: None }
    }

    pub fn scoped(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Immutable once stored; refreshes replace the whole entry.
struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

#[derive(Clone, Default)]
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<ResourceKey, CacheEntry>>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key` if present, unexpired and of type `T`.
    pub async fn get<T>(&self, key: &ResourceKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        if entry.is_expired(Instant::now()) {
            debug!(key = %key, "Cache entry expired");
            return None;
        }

        match entry.value.downcast_ref::<T>() {
            Some(value) => Some(value.clone()),
            None => {
                warn!(key = %key, "Cache entry has unexpected type");
                None
            }
        }
    }

    pub async fn insert<T>(&self, key: ResourceKey, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        let entry = CacheEntry {
            value: Arc::new(value),
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Return the cached value, or run `loader` and cache its result.
    ///
    /// Loader errors are returned unchanged and leave the key empty, so the
    /// next call goes back to the network.
    pub async fn fetch_or_load<T, F, Fut>(&self, key: &ResourceKey, ttl: Duration, loader: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get::<T>(key).await {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache miss, loading");

        match loader().await {
            Ok(value) => {
                self.insert(key.clone(), value.clone(), ttl).await;
                Ok(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Load failed, nothing cached");
                Err(e)
            }
        }
    }

    pub async fn invalidate(&self, key: &ResourceKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
