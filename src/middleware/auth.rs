// ABOUTME: Request authentication guard for protected paths
// ABOUTME: Accepts the session cookie or an Authorization bearer token, exempting public prefixes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

use crate::auth::TokenKind;
use crate::constants::cookies;
use crate::context::ServerResources;
use crate::errors::{AppError, AppResult};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use uuid::Uuid;

/// Identity attached to a request after the guard admits it
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Authenticated user id
    pub user_id: Uuid,
    /// Email claim from the verified token
    pub email: String,
}

/// Extract a named cookie from the Cookie header
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.to_owned());
            }
        }
    }
    None
}

/// Extract a bearer token from the Authorization header
#[must_use]
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Paths reachable without a token
///
/// The login, signup, OAuth, and captcha surfaces must stay open or nobody
/// could ever obtain a token; everything else requires one.
fn is_public_path(path: &str) -> bool {
    path == "/"
        || path == "/health"
        || path.starts_with("/login")
        || path.starts_with("/signup")
        || path.starts_with("/oauth")
        || path.starts_with("/auth")
}

/// Authenticate a request from its headers
///
/// The session cookie is tried first (browser flow), then the Authorization
/// header, against the session and login token kinds. OAuth access tokens
/// authorize downstream resource servers, not this dashboard surface.
///
/// # Errors
/// Returns an [`AppError`] when no usable token is present or verification fails
pub fn authenticate_headers(
    resources: &ServerResources,
    headers: &HeaderMap,
) -> AppResult<AuthenticatedUser> {
    let token = get_cookie_value(headers, cookies::SESSION_TOKEN)
        .or_else(|| extract_bearer(headers))
        .ok_or_else(AppError::auth_required)?;

    let claims = resources
        .codec
        .verify(TokenKind::Session, &token)
        .or_else(|_| resources.codec.verify(TokenKind::Login, &token))
        .map_err(|e| {
            tracing::warn!("Token verification failed: {}", e);
            AppError::auth_invalid("Invalid token")
        })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::auth_invalid("Invalid user id in token"))?;

    Ok(AuthenticatedUser {
        user_id,
        email: claims.email,
    })
}

/// Axum middleware rejecting unauthenticated requests to protected paths
pub async fn require_auth(
    State(resources): State<Arc<ServerResources>>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    match authenticate_headers(&resources, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
