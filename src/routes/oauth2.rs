// ABOUTME: OAuth 2.0 HTTP route handlers for authorization and token exchange
// ABOUTME: Thin wrappers delegating to the OAuth2AuthorizationServer core
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

//! OAuth 2.0 routes
//!
//! `POST /oauth/login` runs the interactive authorization step and answers
//! with the composed redirect URL; `POST /oauth/token` is the server-to-server
//! exchange and speaks RFC 6749 error payloads.

use crate::context::ServerResources;
use crate::errors::AppError;
use crate::oauth2::models::{OAuth2Error, OAuthLoginRequest, TokenRequest};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;

/// OAuth 2.0 routes
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all OAuth 2.0 routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/oauth/login", post(Self::handle_oauth_login))
            .route("/oauth/token", post(Self::handle_token))
            .with_state(resources)
    }

    /// Interactive login for an OAuth flow; issues the authorization code
    async fn handle_oauth_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<OAuthLoginRequest>,
    ) -> Result<Response, AppError> {
        let response = resources.oauth2.authorize_login(request).await?;
        Ok(Json(response).into_response())
    }

    /// Token exchange; redeems the code for a bearer access token
    async fn handle_token(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<TokenRequest>,
    ) -> Result<Response, OAuth2Error> {
        let response = resources.oauth2.exchange_token(request).await?;
        Ok(Json(response).into_response())
    }
}
