// ABOUTME: HTTP route composition for the authorization server
// ABOUTME: Merges auth, OAuth, and credential-store routers behind the auth guard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

//! HTTP surface wiring

/// Per-user provider credential store routes
pub mod api_keys;
/// Signup, login, and captcha routes
pub mod auth;
/// OAuth 2.0 authorization and token routes
pub mod oauth2;

use crate::constants::service;
use crate::context::ServerResources;
use crate::middleware::require_auth;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the complete application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(oauth2::OAuth2Routes::routes(resources.clone()))
        .merge(api_keys::ApiKeyRoutes::routes(resources.clone()))
        .route("/health", get(handle_health))
        .route("/", get(handle_health))
        .layer(axum::middleware::from_fn_with_state(resources, require_auth))
        .layer(TraceLayer::new_for_http())
}

/// Liveness endpoint
async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": service::NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
