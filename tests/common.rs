// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides common database, resource, and HTTP request helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project
#![allow(dead_code)]

//! Shared test utilities for `parley_auth`
//!
//! Common setup functions to reduce duplication across integration tests.

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use parley_auth::{
    cache::{Cache, CacheConfig, CacheProvider, InMemoryCache},
    config::{AuthConfig, CaptchaConfig, DatabaseConfig, Environment, PasswordConfig, ServerConfig},
    context::ServerResources,
    crypto::PasswordHasher,
    database::Database,
    models::{OAuthClient, User},
    routes,
};
use std::sync::{Arc, Once};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    Ok(Arc::new(Database::new("sqlite::memory:").await?))
}

/// Test configuration with low-cost hashing and fixed secrets
pub fn create_test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        auth: AuthConfig {
            login_secret: "test-login-secret".into(),
            access_secret: "test-access-secret".into(),
            session_secret: "test-session-secret".into(),
            login_expiry_days: 7,
            access_expiry_days: 5,
            session_expiry_secs: 3600,
        },
        password: PasswordConfig { hash_cost: 10 },
        captcha: CaptchaConfig {
            ttl_secs: 300,
            redis_url: None,
            max_entries: 1000,
        },
    }
}

/// Build full server resources plus a handle on the captcha cache
///
/// The returned `Cache` clone shares storage with the captcha store, so tests
/// can plant known challenge answers.
pub async fn create_test_resources() -> Result<(Arc<ServerResources>, Cache)> {
    init_test_logging();
    let config = create_test_config();
    let database = Database::new("sqlite::memory:").await?;
    let memory = InMemoryCache::new(CacheConfig {
        enable_background_cleanup: false,
        ..CacheConfig::default()
    })
    .await
    .map_err(|e| anyhow::anyhow!("cache init failed: {e}"))?;
    let cache = Cache::Memory(memory);

    let resources = Arc::new(
        ServerResources::new(config, database, cache.clone())
            .map_err(|e| anyhow::anyhow!("resource init failed: {e}"))?,
    );
    Ok((resources, cache))
}

/// Build the application router over fresh resources
pub async fn create_test_app() -> Result<(Router, Arc<ServerResources>, Cache)> {
    let (resources, cache) = create_test_resources().await?;
    Ok((routes::router(resources.clone()), resources, cache))
}

/// Create a user with the given password, hashed at test cost
pub async fn create_test_user(
    resources: &ServerResources,
    email: &str,
    password: &str,
) -> Result<User> {
    let hasher = PasswordHasher::new(10).map_err(|e| anyhow::anyhow!("{e}"))?;
    let user = User::new(
        email.to_owned(),
        hasher.hash(password).map_err(|e| anyhow::anyhow!("{e}"))?,
        Some("Test User".into()),
    );
    resources.database.create_user(&user).await?;
    Ok(user)
}

/// Register a client with a single allowed redirect URI
pub async fn register_test_client(
    resources: &ServerResources,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
) -> Result<OAuthClient> {
    let client = OAuthClient {
        id: Uuid::new_v4(),
        client_id: client_id.to_owned(),
        client_secret: client_secret.to_owned(),
        client_name: Some("Test App".into()),
        redirect_uris: vec![redirect_uri.to_owned()],
        created_at: Utc::now(),
    };
    resources.database.register_client(&client).await?;
    Ok(client)
}

/// Plant a captcha challenge with a known answer, returning its id
pub async fn plant_captcha(cache: &Cache, answer: &str) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    cache
        .set(
            &format!("captcha:{id}"),
            &answer.to_lowercase(),
            Duration::from_secs(300),
        )
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(id)
}

/// POST a JSON body to the router
pub async fn post_json(
    app: &Router,
    path: &str,
    body: serde_json::Value,
) -> Result<Response<Body>> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))?;
    Ok(app.clone().oneshot(request).await?)
}

/// GET a path, optionally with a bearer token
pub async fn get_with_auth(
    app: &Router,
    path: &str,
    bearer: Option<&str>,
) -> Result<Response<Body>> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(app.clone().oneshot(builder.body(Body::empty())?).await?)
}

/// POST a JSON body with a bearer token
pub async fn post_json_with_auth(
    app: &Router,
    path: &str,
    body: serde_json::Value,
    bearer: &str,
) -> Result<Response<Body>> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
        .body(Body::from(serde_json::to_vec(&body)?))?;
    Ok(app.clone().oneshot(request).await?)
}

/// Read a response body as JSON
pub async fn response_json(response: Response<Body>) -> Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Assert a status and return the decoded body
pub async fn expect_status(
    response: Response<Body>,
    status: StatusCode,
) -> Result<serde_json::Value> {
    assert_eq!(response.status(), status, "unexpected status");
    response_json(response).await
}
