// ABOUTME: Short-TTL key/value cache abstraction backing the captcha store
// ABOUTME: Pluggable backends: in-memory (single process) and Redis (multi-instance)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

/// Cache selection based on configuration
pub mod factory;
/// In-memory cache implementation
pub mod memory;
/// Redis cache implementation
pub mod redis;

use crate::errors::AppResult;
use std::time::Duration;

pub use factory::Cache;
pub use memory::InMemoryCache;
pub use redis::RedisCache;

/// Cache provider trait for pluggable backend implementations
///
/// Values are plain strings; the only consumer is the captcha store, which
/// keeps lowercase challenge answers under a namespaced key. `take` is the
/// load-bearing operation: it must remove the entry atomically so a stored
/// answer can be consumed at most once even under concurrent verification
/// attempts.
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync + Clone {
    /// Create new cache instance with configuration
    ///
    /// # Errors
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Store a value with a TTL
    ///
    /// # Errors
    /// Returns an error if storage fails
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Retrieve a value if present and unexpired
    ///
    /// # Errors
    /// Returns an error if the lookup fails
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Remove and return a value in one atomic step
    ///
    /// # Errors
    /// Returns an error if the removal fails
    async fn take(&self, key: &str) -> AppResult<Option<String>>;

    /// Remove a single entry
    ///
    /// # Errors
    /// Returns an error if invalidation fails
    async fn invalidate(&self, key: &str) -> AppResult<()>;

    /// Verify the cache backend is healthy
    ///
    /// # Errors
    /// Returns an error if the health check fails
    async fn health_check(&self) -> AppResult<()>;
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (in-memory backend)
    pub max_entries: usize,
    /// Redis connection URL (Redis backend)
    pub redis_url: Option<String>,
    /// Sweep interval for expired entries (in-memory backend)
    pub cleanup_interval: Duration,
    /// Enable the background cleanup task (disable in tests to avoid runtime conflicts)
    pub enable_background_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: crate::constants::defaults::CAPTCHA_CACHE_MAX_ENTRIES,
            redis_url: None,
            cleanup_interval: Duration::from_secs(60),
            enable_background_cleanup: true,
        }
    }
}
