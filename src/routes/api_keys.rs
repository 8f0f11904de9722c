// ABOUTME: Per-user provider credential store routes
// ABOUTME: Stores prefixed third-party API keys consumed by the downstream chat proxy
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

//! Provider credential routes
//!
//! Stored values embed the lower-cased provider name as a prefix
//! (`"<provider>_<secret>"`) so provenance is checkable without another
//! column. Both routes sit behind the authentication guard.

use crate::context::ServerResources;
use crate::errors::AppError;
use crate::middleware::AuthenticatedUser;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Credential upsert request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    pub key_type: Option<String>,
    pub api_key: Option<String>,
}

/// Provider credential routes
pub struct ApiKeyRoutes;

impl ApiKeyRoutes {
    /// Create the credential store routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/user/api-keys",
                get(Self::handle_get).post(Self::handle_update),
            )
            .with_state(resources)
    }

    /// Return the caller's credential map
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Extension(user): Extension<AuthenticatedUser>,
    ) -> Result<Response, AppError> {
        let api_keys = resources
            .database
            .get_user_api_keys(user.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok(Json(serde_json::json!({ "api_keys": api_keys })).into_response())
    }

    /// Upsert one provider credential for the caller
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        Extension(user): Extension<AuthenticatedUser>,
        Json(request): Json<UpdateApiKeyRequest>,
    ) -> Result<Response, AppError> {
        let (Some(key_type), Some(api_key)) =
            (request.key_type.as_deref(), request.api_key.as_deref())
        else {
            return Err(AppError::missing_field("Missing keyType or apiKey"));
        };

        let provider = key_type.to_lowercase();
        let stored_value = format!("{provider}_{api_key}");

        let updated = resources
            .database
            .update_user_api_key(user.user_id, &provider, &stored_value)
            .await?;

        if !updated {
            return Err(AppError::not_found("User"));
        }

        tracing::info!("API key updated for user {} provider {}", user.user_id, provider);
        Ok(Json(serde_json::json!({ "message": "API key updated successfully" })).into_response())
    }
}
