// ABOUTME: In-memory cache backend with LRU eviction and per-entry TTL
// ABOUTME: A background sweeper reclaims expired entries between accesses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

use super::{CacheConfig, CacheProvider};
use crate::errors::AppResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Stored value plus its expiry deadline
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    deadline: Instant,
}

impl Entry {
    fn live(&self) -> bool {
        Instant::now() < self.deadline
    }
}

/// Aborts the sweeper task once the last cache clone is gone
struct Sweeper(JoinHandle<()>);

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.0.abort();
    }
}

type Store = Arc<RwLock<LruCache<String, Entry>>>;

/// Bounded in-memory cache
///
/// The LRU bound caps memory under challenge-issuance floods; expired entries
/// are dropped on access and swept periodically in between. Clones share the
/// same store and sweeper.
#[derive(Clone)]
pub struct InMemoryCache {
    store: Store,
    _sweeper: Option<Arc<Sweeper>>,
}

impl InMemoryCache {
    /// Capacity used when the configured bound is zero
    const FALLBACK_CAPACITY: usize = 1000;

    fn with_config(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries)
            .or_else(|| NonZeroUsize::new(Self::FALLBACK_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        let store: Store = Arc::new(RwLock::new(LruCache::new(capacity)));

        let sweeper = config.enable_background_cleanup.then(|| {
            let store = store.clone();
            let period = config.cleanup_interval;
            Arc::new(Sweeper(tokio::spawn(async move {
                let mut tick = tokio::time::interval(period);
                loop {
                    tick.tick().await;
                    Self::sweep(&store).await;
                }
            })))
        });

        Self {
            store,
            _sweeper: sweeper,
        }
    }

    async fn sweep(store: &Store) {
        let mut guard = store.write().await;
        let dead: Vec<String> = guard
            .iter()
            .filter(|(_, entry)| !entry.live())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &dead {
            guard.pop(key);
        }
        drop(guard);

        if !dead.is_empty() {
            tracing::debug!("Swept {} expired cache entries", dead.len());
        }
    }
}

#[async_trait::async_trait]
impl CacheProvider for InMemoryCache {
    async fn new(config: CacheConfig) -> AppResult<Self> {
        Ok(Self::with_config(&config))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let entry = Entry {
            value: value.to_owned(),
            deadline: Instant::now() + ttl,
        };
        // push evicts the LRU entry when the cache is at capacity
        self.store.write().await.push(key.to_owned(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut store = self.store.write().await;
        match store.get(key) {
            Some(entry) if entry.live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                store.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        // pop under the write lock: of two concurrent takes, one gets None
        let popped = self.store.write().await.pop(key);
        Ok(popped.and_then(|entry| entry.live().then_some(entry.value)))
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        self.store.write().await.pop(key);
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        // Nothing can fail beyond lock acquisition
        let _guard = self.store.read().await;
        Ok(())
    }
}
