// ABOUTME: User account model with password hash and provider credential blob
// ABOUTME: PublicUser is the password-free projection returned by the API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A registered user account
///
/// The `api_keys` blob maps a lower-cased provider name to a provider-scoped
/// secret stored as `"<provider>_<secret>"`. The prefix allows provenance
/// checks without a separate column; the downstream chat proxy reads it when
/// fanning out completion requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Email address, unique across the system
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// bcrypt password hash
    pub password_hash: String,
    /// Provider-name to prefixed-secret map
    pub api_keys: Map<String, Value>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and empty credential store
    #[must_use]
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            api_keys: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Password-free projection for API responses
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// User data safe to return to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}
