// ABOUTME: Server resource bundle constructed once at startup
// ABOUTME: Explicit dependency injection instead of module-level singletons
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

//! Shared server resources threaded through axum state

use crate::auth::TokenCodec;
use crate::cache::Cache;
use crate::captcha::CaptchaStore;
use crate::config::ServerConfig;
use crate::crypto::PasswordHasher;
use crate::database::Database;
use crate::errors::AppResult;
use crate::oauth2::{CodeLedger, OAuth2AuthorizationServer};
use std::sync::Arc;
use std::time::Duration;

/// Everything a request handler needs, built once in `main`
#[derive(Clone)]
pub struct ServerResources {
    /// Persistent store
    pub database: Arc<Database>,
    /// Token codec for all three token kinds
    pub codec: Arc<TokenCodec>,
    /// Password hashing facade
    pub hasher: PasswordHasher,
    /// Captcha issuance and verification
    pub captcha: CaptchaStore,
    /// OAuth 2.0 authorization server core
    pub oauth2: OAuth2AuthorizationServer,
    /// Runtime configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Assemble resources from configuration and the opened collaborators
    ///
    /// # Errors
    /// Returns an error if the password hasher rejects the configured cost
    pub fn new(config: ServerConfig, database: Database, cache: Cache) -> AppResult<Self> {
        let database = Arc::new(database);
        let codec = Arc::new(TokenCodec::new(
            config.auth.token_secrets(),
            config.auth.token_lifetimes(),
        ));
        let hasher = PasswordHasher::new(config.password.hash_cost)?;
        let captcha = CaptchaStore::new(cache, Duration::from_secs(config.captcha.ttl_secs));
        let ledger = CodeLedger::new(database.clone());
        let oauth2 =
            OAuth2AuthorizationServer::new(database.clone(), ledger, codec.clone(), hasher);

        Ok(Self {
            database,
            codec,
            hasher,
            captcha,
            oauth2,
            config: Arc::new(config),
        })
    }
}
