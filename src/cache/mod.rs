//! Keyed TTL cache for snapshots loaded from the remote store.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: Arc<V>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() >= expires_at,
            None => false,
        }
    }
}

/// In-memory cache with an optional time-to-live. A `None` TTL keeps
/// entries until invalidated; a zero TTL disables caching.
///
/// Every invalidation bumps a generation counter. Loaders capture
/// [`InMemoryCache::generation`] before reading the backing store and store
/// the result with [`InMemoryCache::set_if_current`], so a load that raced
/// with a write is returned to its caller but never cached.
#[derive(Debug)]
pub struct InMemoryCache<K, V> {
    store: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Option<Duration>,
    generation: AtomicU64,
}

impl<K, V> InMemoryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_some_and(|ttl| ttl.is_zero())
    }

    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|entry| entry.is_expired()) {
            store.remove(key);
        }
        None
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Caches `value` only if nothing was invalidated since `seen` was read
    pub async fn set_if_current(&self, key: K, value: V, seen: u64) -> Arc<V> {
        let value = Arc::new(value);
        if !self.is_disabled() {
            let mut store = self.store.write().await;
            if self.generation.load(Ordering::SeqCst) == seen {
                store.insert(key, CacheEntry::new(value.clone(), self.ttl));
            }
        }
        value
    }

    pub async fn invalidate(&self, key: &K) {
        let mut store = self.store.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        store.remove(key);
    }

    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        store.clear();
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.store
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }
}
