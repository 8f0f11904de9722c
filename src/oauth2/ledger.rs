// ABOUTME: Authorization code ledger: issue, redeem exactly once, purge stale rows
// ABOUTME: Codes are 256-bit random values; redemption delegates to the atomic database consume
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

//! # Authorization Code Ledger
//!
//! The state machine per code is `ISSUED -> REDEEMED` (terminal) or
//! `ISSUED -> EXPIRED` (terminal, via cleanup or the time check at
//! redemption). There are no other transitions. Redemption is destructive:
//! the winning redeemer takes the bound identities and the row is gone.

use crate::constants::limits::{AUTH_CODE_BYTES, AUTH_CODE_EXPIRY_MINUTES};
use crate::database::{ConsumeOutcome, Database};
use crate::models::AuthorizationCode;
use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Redemption failure, classified
///
/// The HTTP boundary collapses the first three variants into one
/// `invalid_grant` payload; the distinction exists for logs and tests.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No such code
    #[error("authorization code not found")]
    NotFound,
    /// The code's expiry has passed
    #[error("authorization code expired")]
    Expired,
    /// The code was already redeemed
    #[error("authorization code already used")]
    AlreadyUsed,
    /// The store failed
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Identities bound to a successfully redeemed code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedCode {
    /// Internal id of the client the code was issued for
    pub client_id: Uuid,
    /// User who authorized the code
    pub user_id: Uuid,
}

/// Authorization code ledger over the database
#[derive(Clone)]
pub struct CodeLedger {
    database: Arc<Database>,
    code_ttl: Duration,
}

impl CodeLedger {
    /// Create a ledger with the default code TTL
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            database,
            code_ttl: Duration::minutes(AUTH_CODE_EXPIRY_MINUTES),
        }
    }

    /// Create a ledger with an explicit TTL (tests, nonstandard deployments)
    #[must_use]
    pub const fn with_ttl(database: Arc<Database>, code_ttl: Duration) -> Self {
        Self { database, code_ttl }
    }

    /// Issue a code bound to `(client, user)` and persist it
    ///
    /// Collision safety comes from 256 bits of randomness, not from a
    /// uniqueness-constraint retry loop.
    ///
    /// # Errors
    /// Returns an error if RNG or the insert fails
    pub async fn issue(&self, client_internal_id: Uuid, user_id: Uuid) -> Result<String> {
        let code = generate_code()?;
        let now = Utc::now();

        self.database
            .insert_auth_code(&AuthorizationCode {
                code: code.clone(),
                client_id: client_internal_id,
                user_id,
                issued_at: now,
                expires_at: now + self.code_ttl,
                used: false,
            })
            .await?;

        tracing::debug!("Issued authorization code for user {}", user_id);
        Ok(code)
    }

    /// Redeem a code exactly once, returning the bound identities
    ///
    /// Concurrent attempts on the same code resolve to one success; every
    /// other attempt observes [`LedgerError::AlreadyUsed`] or
    /// [`LedgerError::NotFound`].
    ///
    /// # Errors
    /// Returns a [`LedgerError`] classifying the failure
    pub async fn redeem(&self, code: &str) -> Result<RedeemedCode, LedgerError> {
        match self.database.consume_auth_code(code, Utc::now()).await? {
            ConsumeOutcome::Redeemed { client_id, user_id } => {
                tracing::info!("Authorization code redeemed for user {}", user_id);
                Ok(RedeemedCode { client_id, user_id })
            }
            ConsumeOutcome::NotFound => Err(LedgerError::NotFound),
            ConsumeOutcome::Expired => Err(LedgerError::Expired),
            ConsumeOutcome::AlreadyUsed => Err(LedgerError::AlreadyUsed),
        }
    }

    /// Purge used and expired rows
    ///
    /// Cheap and idempotent; invoked lazily before each authorization or
    /// token-exchange attempt rather than from a background timer.
    ///
    /// # Errors
    /// Returns an error if the delete fails
    pub async fn cleanup(&self) -> Result<u64> {
        let deleted = self.database.cleanup_auth_codes(Utc::now()).await?;
        if deleted > 0 {
            tracing::debug!("Purged {} stale authorization codes", deleted);
        }
        Ok(deleted)
    }
}

/// Generate a random URL-safe code
///
/// # Errors
/// Returns an error if the system RNG fails; the server cannot mint
/// unguessable codes without a working RNG.
fn generate_code() -> Result<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; AUTH_CODE_BYTES];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!("CRITICAL: SystemRandom failed generating auth code: {}", e);
        anyhow::anyhow!("System RNG failure - cannot generate authorization code")
    })?;

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_distinct_and_url_safe() {
        let a = generate_code().unwrap();
        let b = generate_code().unwrap();

        assert_ne!(a, b);
        // 32 bytes -> 43 base64url chars, no padding
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
