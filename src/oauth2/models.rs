// ABOUTME: OAuth 2.0 data models for the authorization and token endpoints
// ABOUTME: RFC 6749 shaped request, response, and error structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Interactive authorization request: user credentials plus client context
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthLoginRequest {
    /// User email
    pub email: Option<String>,
    /// User password
    pub password: Option<String>,
    /// Public client identifier
    pub client_id: Option<String>,
    /// Redirect URI, must exactly match a registered entry
    pub redirect_uri: Option<String>,
    /// Opaque client state echoed back on the redirect
    pub state: Option<String>,
}

/// Authorization response carrying the composed redirect URL
#[derive(Debug, Serialize)]
pub struct OAuthLoginResponse {
    /// Human-readable status
    pub message: String,
    /// `redirect_uri` with `code` (and `state`, when supplied) appended
    pub redirect_url: String,
}

/// OAuth 2.0 token exchange request
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Authorization code being redeemed
    pub code: Option<String>,
    /// Public client identifier
    pub client_id: Option<String>,
    /// Client secret
    pub client_secret: Option<String>,
}

/// OAuth 2.0 token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token (JWT)
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Seconds until the token expires; derived from the same duration as
    /// the `exp` claim
    pub expires_in: i64,
}

/// OAuth 2.0 error response (RFC 6749 Section 5.2)
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    pub error_description: String,
}

impl OAuth2Error {
    /// Create an `invalid_request` error (400)
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self {
            error: "invalid_request".to_owned(),
            error_description: description.to_owned(),
        }
    }

    /// Create an `invalid_client` error (401)
    #[must_use]
    pub fn invalid_client() -> Self {
        Self {
            error: "invalid_client".to_owned(),
            error_description: "Invalid client credentials".to_owned(),
        }
    }

    /// Create an `invalid_grant` error (400)
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self {
            error: "invalid_grant".to_owned(),
            error_description: description.to_owned(),
        }
    }

    /// Create a `server_error` error (500)
    #[must_use]
    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_owned(),
            error_description: "Internal server error".to_owned(),
        }
    }

    /// HTTP status for this error code
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self.error.as_str() {
            "invalid_client" => StatusCode::UNAUTHORIZED,
            "server_error" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}
