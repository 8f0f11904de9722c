// ABOUTME: Cache factory for configuration-based backend selection
// ABOUTME: Dispatches to the in-memory or Redis provider behind one type
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

use super::{memory::InMemoryCache, redis::RedisCache, CacheConfig, CacheProvider};
use crate::errors::AppResult;
use std::time::Duration;

/// Unified cache handle over the configured backend
#[derive(Clone)]
pub enum Cache {
    /// Single-process in-memory backend
    Memory(InMemoryCache),
    /// Shared Redis backend
    Redis(RedisCache),
}

impl Cache {
    /// Create a cache instance based on configuration
    ///
    /// A configured `redis_url` selects the Redis backend; otherwise the
    /// bounded in-memory backend is used.
    ///
    /// # Errors
    /// Returns an error if backend initialization fails
    pub async fn new(config: CacheConfig) -> AppResult<Self> {
        if config.redis_url.is_some() {
            tracing::info!("Initializing Redis cache backend");
            Ok(Self::Redis(RedisCache::new(config).await?))
        } else {
            tracing::info!(
                "Initializing in-memory cache (max entries: {})",
                config.max_entries
            );
            Ok(Self::Memory(InMemoryCache::new(config).await?))
        }
    }

    /// Store a value with a TTL
    ///
    /// # Errors
    /// Returns an error if storage fails
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        match self {
            Self::Memory(c) => c.set(key, value, ttl).await,
            Self::Redis(c) => c.set(key, value, ttl).await,
        }
    }

    /// Retrieve a value if present and unexpired
    ///
    /// # Errors
    /// Returns an error if the lookup fails
    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match self {
            Self::Memory(c) => c.get(key).await,
            Self::Redis(c) => c.get(key).await,
        }
    }

    /// Remove and return a value atomically
    ///
    /// # Errors
    /// Returns an error if the removal fails
    pub async fn take(&self, key: &str) -> AppResult<Option<String>> {
        match self {
            Self::Memory(c) => c.take(key).await,
            Self::Redis(c) => c.take(key).await,
        }
    }

    /// Remove a single entry
    ///
    /// # Errors
    /// Returns an error if invalidation fails
    pub async fn invalidate(&self, key: &str) -> AppResult<()> {
        match self {
            Self::Memory(c) => c.invalidate(key).await,
            Self::Redis(c) => c.invalidate(key).await,
        }
    }

    /// Verify the backend is reachable
    ///
    /// # Errors
    /// Returns an error if the health check fails
    pub async fn health_check(&self) -> AppResult<()> {
        match self {
            Self::Memory(c) => c.health_check().await,
            Self::Redis(c) => c.health_check().await,
        }
    }
}
