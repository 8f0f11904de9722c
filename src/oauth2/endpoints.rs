// ABOUTME: OAuth 2.0 authorization and token-exchange orchestration
// ABOUTME: Login issues a single-use code; exchange redeems it for a bearer access token
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

use super::ledger::{CodeLedger, LedgerError};
use super::models::{OAuth2Error, OAuthLoginRequest, OAuthLoginResponse, TokenRequest, TokenResponse};
use super::registry::ClientRegistry;
use crate::auth::{TokenCodec, TokenKind};
use crate::crypto::PasswordHasher;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use url::Url;

/// OAuth 2.0 authorization server
///
/// Owns no state of its own; every validation re-reads the store so
/// concurrent operator updates to clients and users take effect immediately.
#[derive(Clone)]
pub struct OAuth2AuthorizationServer {
    registry: ClientRegistry,
    ledger: CodeLedger,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
    database: Arc<Database>,
}

impl OAuth2AuthorizationServer {
    /// Assemble the server from its collaborators
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        ledger: CodeLedger,
        codec: Arc<TokenCodec>,
        hasher: PasswordHasher,
    ) -> Self {
        let registry = ClientRegistry::new(database.clone());
        Self {
            registry,
            ledger,
            codec,
            hasher,
            database,
        }
    }

    /// Interactive authorization: verify the user, issue a code, and build
    /// the redirect URL
    ///
    /// Client validation happens before credential verification so an
    /// attacker cannot use this endpoint as a password oracle for arbitrary
    /// redirect targets. Both "no such user" and "wrong password" surface the
    /// same 401.
    ///
    /// # Errors
    /// Returns an [`AppError`] for missing fields, unknown client/redirect,
    /// bad credentials, or store failures
    pub async fn authorize_login(&self, request: OAuthLoginRequest) -> AppResult<OAuthLoginResponse> {
        let (Some(email), Some(password), Some(client_id), Some(redirect_uri)) = (
            request.email.as_deref(),
            request.password.as_deref(),
            request.client_id.as_deref(),
            request.redirect_uri.as_deref(),
        ) else {
            return Err(AppError::missing_field(
                "email, password, client_id, and redirect_uri are required",
            ));
        };

        // Lazy garbage collection before touching the ledger
        self.ledger.cleanup().await?;

        let client = self
            .registry
            .validate(client_id, redirect_uri)
            .await?
            .ok_or_else(|| AppError::invalid_input("Invalid client_id or redirect_uri"))?;

        let user = self
            .database
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid credentials"))?;

        if !self.hasher.verify(password, &user.password_hash).await? {
            tracing::warn!("Failed OAuth login attempt for {}", email);
            return Err(AppError::auth_invalid("Invalid credentials"));
        }

        let code = self.ledger.issue(client.id, user.id).await?;

        let redirect_url = build_redirect_url(redirect_uri, &code, request.state.as_deref())
            .map_err(|e| AppError::internal(format!("Failed to compose redirect URL: {e}")))?;

        tracing::info!(
            "OAuth login succeeded for user {} on client {}",
            user.id,
            client.client_id
        );

        Ok(OAuthLoginResponse {
            message: "Login successful".to_owned(),
            redirect_url,
        })
    }

    /// Token exchange: redeem a code for a bearer access token
    ///
    /// All ledger failures collapse into one `invalid_grant` payload; the
    /// precise cause is only logged. A retry after a successful redemption
    /// deterministically produces `invalid_grant`, never a second token.
    ///
    /// # Errors
    /// Returns an [`OAuth2Error`] shaped per RFC 6749 Section 5.2
    pub async fn exchange_token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        let (Some(code), Some(client_id), Some(client_secret)) = (
            request.code.as_deref(),
            request.client_id.as_deref(),
            request.client_secret.as_deref(),
        ) else {
            return Err(OAuth2Error::invalid_request(
                "Missing required parameters: code, client_id, client_secret",
            ));
        };

        if let Err(e) = self.ledger.cleanup().await {
            tracing::error!("Auth code cleanup failed before token exchange: {e:#}");
            return Err(OAuth2Error::server_error());
        }

        let client = match self.registry.get_client(client_id).await {
            Ok(Some(client)) => client,
            Ok(None) => return Err(OAuth2Error::invalid_client()),
            Err(e) => {
                tracing::error!("Client lookup failed for token exchange: {e:#}");
                return Err(OAuth2Error::server_error());
            }
        };

        // Constant-time compare; the secret is never transmitted elsewhere
        let secret_matches: bool = client
            .client_secret
            .as_bytes()
            .ct_eq(client_secret.as_bytes())
            .into();
        if !secret_matches {
            tracing::warn!("Client secret mismatch for client {}", client.client_id);
            return Err(OAuth2Error::invalid_client());
        }

        let redeemed = match self.ledger.redeem(code).await {
            Ok(redeemed) => redeemed,
            Err(LedgerError::Storage(e)) => {
                tracing::error!("Ledger storage failure during redemption: {e:#}");
                return Err(OAuth2Error::server_error());
            }
            Err(e) => {
                tracing::warn!("Code redemption rejected for client {}: {e}", client_id);
                return Err(OAuth2Error::invalid_grant(
                    "Invalid or expired authorization code",
                ));
            }
        };

        if redeemed.client_id != client.id {
            // The code belongs to a different client; do not reveal which
            tracing::warn!(
                "Code issued to another client presented by {}",
                client.client_id
            );
            return Err(OAuth2Error::invalid_grant(
                "Invalid or expired authorization code",
            ));
        }

        let user = match self.database.get_user(redeemed.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                // A redeemed code pointing at a missing user is a
                // data-integrity signal, not a caller mistake
                tracing::error!(
                    "Redeemed code referenced missing user {}",
                    redeemed.user_id
                );
                return Err(OAuth2Error::invalid_grant("User not found"));
            }
            Err(e) => {
                tracing::error!("User lookup failed during token exchange: {e:#}");
                return Err(OAuth2Error::server_error());
            }
        };

        let access_token = self.codec.mint_access(&user, client_id).map_err(|e| {
            tracing::error!("Access token minting failed: {e:#}");
            OAuth2Error::server_error()
        })?;

        tracing::info!(
            "Access token minted for user {} audience {}",
            user.id,
            client_id
        );

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_owned(),
            expires_in: self.codec.expires_in(TokenKind::Access),
        })
    }
}

/// Append `code` and optional `state` to the redirect URI's query
fn build_redirect_url(redirect_uri: &str, code: &str, state: Option<&str>) -> anyhow::Result<String> {
    let mut url = Url::parse(redirect_uri)?;
    url.query_pairs_mut().append_pair("code", code);
    if let Some(state) = state {
        url.query_pairs_mut().append_pair("state", state);
    }
    Ok(url.to_string())
}
