// ABOUTME: OAuth persistence models for registered clients and authorization codes
// ABOUTME: Tenant carries the per-tenant callback URL used by direct login
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered OAuth client application
///
/// Created out-of-band by an operator; there is no self-service registration.
/// `redirect_uris` is the normalized allow-list; the stored column tolerates
/// several encodings, decoded once at the registry boundary.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Internal database id, referenced by authorization codes
    pub id: Uuid,
    /// Public client identifier presented in authorization requests
    pub client_id: String,
    /// Shared secret, validated only at token exchange
    pub client_secret: String,
    /// Human-readable client name
    pub client_name: Option<String>,
    /// Exact-match allow-list of redirect URIs
    pub redirect_uris: Vec<String>,
    /// When this client was registered
    pub created_at: DateTime<Utc>,
}

/// A single-use authorization code bound to a (client, user) pair
///
/// Lifecycle: issued → redeemed (destructive) or expired → garbage-collected.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// Opaque unguessable code value
    pub code: String,
    /// Internal id of the client the code was issued for
    pub client_id: Uuid,
    /// User who authenticated
    pub user_id: Uuid,
    /// When the code was issued
    pub issued_at: DateTime<Utc>,
    /// When the code stops being redeemable
    pub expires_at: DateTime<Utc>,
    /// Whether the code has been exchanged for a token
    pub used: bool,
}

/// Tenant record resolving a tenant key to its callback URL
#[derive(Debug, Clone)]
pub struct Tenant {
    /// Opaque tenant key presented at direct login
    pub tenant_key: String,
    /// Callback URL the browser is sent to after login
    pub callback_url: String,
}
