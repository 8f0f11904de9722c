// ABOUTME: Redis cache implementation for multi-instance deployments
// ABOUTME: Uses GETDEL for the atomic single-use take operation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

use super::{CacheConfig, CacheProvider};
use crate::errors::{AppError, AppResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

/// Namespace prefix for all keys written by this service
const KEY_PREFIX: &str = "parley:cache:";

/// Redis cache implementation with automatic reconnection
///
/// `ConnectionManager` handles reconnects transparently. TTLs map to Redis
/// key expiry; `take` maps to GETDEL so single-use consumption stays atomic
/// across server instances.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    async fn new_with_config(config: &CacheConfig) -> AppResult<Self> {
        let redis_url = config
            .redis_url
            .as_ref()
            .ok_or_else(|| AppError::config("Redis URL is required for the Redis cache backend"))?;

        info!("Connecting to Redis at {}", redis_url);

        let client = redis::Client::open(redis_url.as_str())
            .map_err(|e| AppError::internal(format!("Failed to create Redis client: {e}")))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::internal(format!("Failed to connect to Redis: {e}")))?;

        info!("Successfully connected to Redis");
        Ok(Self { manager })
    }

    fn namespaced(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

#[async_trait::async_trait]
impl CacheProvider for RedisCache {
    async fn new(config: CacheConfig) -> AppResult<Self> {
        Self::new_with_config(&config).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(Self::namespaced(key), value, ttl_secs)
            .await
            .map_err(|e| AppError::internal(format!("Redis SET failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(Self::namespaced(key))
            .await
            .map_err(|e| AppError::internal(format!("Redis GET failed: {e}")))
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get_del(Self::namespaced(key))
            .await
            .map_err(|e| AppError::internal(format!("Redis GETDEL failed: {e}")))
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(Self::namespaced(key))
            .await
            .map_err(|e| AppError::internal(format!("Redis DEL failed: {e}")))?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| AppError::internal(format!("Redis health check failed: {e}")))?;
        Ok(())
    }
}
