// ABOUTME: Unified error handling with error codes and HTTP response formatting
// ABOUTME: Maps every domain failure onto the taxonomy the HTTP boundary exposes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

//! # Unified Error Handling
//!
//! Central error type for the authorization server. Domain errors are caught
//! at the HTTP boundary and mapped onto a small taxonomy; raw store or codec
//! errors never reach a client payload. OAuth protocol endpoints use the
//! RFC-shaped [`crate::oauth2::models::OAuth2Error`] payload instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes exposed in HTTP error payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & Authorization
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired,
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid,
    #[serde(rename = "AUTH_MALFORMED")]
    AuthMalformed,
    #[serde(rename = "INVALID_CLIENT")]
    InvalidClient,

    // Validation
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField,

    // Resource management
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists,

    // Internal
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
}

impl ErrorCode {
    /// HTTP status this code maps to at the boundary
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => StatusCode::BAD_REQUEST,
            Self::AuthRequired | Self::AuthInvalid | Self::AuthMalformed | Self::InvalidClient => {
                StatusCode::UNAUTHORIZED
            }
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::ResourceAlreadyExists => StatusCode::CONFLICT,
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-facing description of this error class
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::AuthMalformed => "The authentication token is malformed or corrupted",
            Self::InvalidClient => "Client authentication failed",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::ConfigError => "Configuration error encountered",
        }
    }
}

/// Application error carrying a code and a caller-safe message
#[derive(Debug, Error)]
pub struct AppError {
    /// Taxonomy code deciding the HTTP status
    pub code: ErrorCode,
    /// Message surfaced to the caller (except on 500s)
    pub message: String,
    /// Underlying failure, kept for server-side logs
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// HTTP status derived from the error code
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid authentication credentials or token
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Unknown client or secret mismatch
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::new(ErrorCode::InvalidClient, "Invalid client credentials")
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field absent from the request body
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Resource already exists
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Alias used by fallible service and handler functions
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        // Internal failure detail stays server-side; the payload is opaque.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {self}");
            let sanitized = Self::new(self.code, "Internal server error");
            return (status, Json(ErrorResponse::from(sanitized))).into_response();
        }
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::new(ErrorCode::DatabaseError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(
            ErrorCode::AuthRequired.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::InvalidClient.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::InvalidInput.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::ResourceNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::auth_invalid("Invalid credentials");
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("AUTH_INVALID"));
        assert!(json.contains("Invalid credentials"));
    }

    #[test]
    fn test_app_error_chaining() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let error = AppError::database("insert failed").with_source(source);
        assert_eq!(error.code, ErrorCode::DatabaseError);
        assert!(error.source.is_some());
    }
}
