// ABOUTME: JWT token codec minting and verifying the three bearer token kinds
// ABOUTME: Login, OAuth access, and session cookie tokens with independent secrets and lifetimes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

//! # Token Codec
//!
//! Mints and verifies the three signed bearer token kinds this server issues.
//! Each kind represents a different trust boundary and carries its own signing
//! secret and lifetime:
//!
//! - [`TokenKind::Login`]: direct-login bearer token (7 days, carries name)
//! - [`TokenKind::Access`]: OAuth access token (5 days, carries `aud`)
//! - [`TokenKind::Session`]: browser cookie token (1 hour)
//!
//! Signing is symmetric HMAC-SHA256 so verification stays portable to
//! constrained execution contexts that cannot hold native crypto bindings.

use crate::constants::limits::{
    ACCESS_TOKEN_EXPIRY_DAYS, LOGIN_TOKEN_EXPIRY_DAYS, SESSION_TOKEN_EXPIRY_SECS,
    TOKEN_LEEWAY_SECS,
};
use crate::models::User;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The three token kinds this server mints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Direct-login bearer token returned by the captcha-guarded login flow
    Login,
    /// OAuth access token minted at token exchange, audience-bound to a client
    Access,
    /// Short-lived cookie token for the browser session flow
    Session,
}

impl TokenKind {
    /// Stable name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Access => "access",
            Self::Session => "session",
        }
    }
}

/// Signing secrets, one per token kind
///
/// Kinds resolve their key by tag rather than callers picking an expiry, so a
/// token minted for one boundary never verifies at another unless the
/// deployment genuinely shares one secret.
#[derive(Clone)]
pub struct TokenSecrets {
    login: Vec<u8>,
    access: Vec<u8>,
    session: Vec<u8>,
}

impl TokenSecrets {
    /// Build with an independent secret per kind
    #[must_use]
    pub const fn new(login: Vec<u8>, access: Vec<u8>, session: Vec<u8>) -> Self {
        Self {
            login,
            access,
            session,
        }
    }

    /// Build with one shared secret for all kinds (single-secret deployments)
    #[must_use]
    pub fn from_shared(secret: &[u8]) -> Self {
        Self {
            login: secret.to_vec(),
            access: secret.to_vec(),
            session: secret.to_vec(),
        }
    }

    fn for_kind(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Login => &self.login,
            TokenKind::Access => &self.access,
            TokenKind::Session => &self.session,
        }
    }
}

/// Per-kind token lifetimes
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    /// Direct-login token lifetime
    pub login: Duration,
    /// OAuth access token lifetime
    pub access: Duration,
    /// Session cookie token lifetime
    pub session: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            login: Duration::days(LOGIN_TOKEN_EXPIRY_DAYS),
            access: Duration::days(ACCESS_TOKEN_EXPIRY_DAYS),
            session: Duration::seconds(SESSION_TOKEN_EXPIRY_SECS),
        }
    }
}

impl TokenLifetimes {
    fn for_kind(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Login => self.login,
            TokenKind::Access => self.access,
            TokenKind::Session => self.session,
        }
    }
}

/// JWT claims carried by every token kind
///
/// `name` is present only on login tokens, `aud` only on access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// User email
    pub email: String,
    /// Display name (login tokens)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Audience client id (access tokens)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Token validation error with detailed information
#[derive(Debug, Clone)]
pub enum TokenError {
    /// Token has expired
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    Invalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is not proper JWT format
    Malformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired {
                expired_at,
                current_time,
            } => {
                let since = current_time.signed_duration_since(*expired_at);
                if since.num_minutes() < 60 {
                    write!(
                        f,
                        "Token expired {} minutes ago at {}",
                        since.num_minutes(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                } else if since.num_hours() < 24 {
                    write!(
                        f,
                        "Token expired {} hours ago at {}",
                        since.num_hours(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                } else {
                    write!(
                        f,
                        "Token expired {} days ago at {}",
                        since.num_days(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                }
            }
            Self::Invalid { reason } => write!(f, "Token signature is invalid: {reason}"),
            Self::Malformed { details } => write!(f, "Token is malformed: {details}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Token codec holding secrets, lifetimes, and the expiry leeway
pub struct TokenCodec {
    secrets: TokenSecrets,
    lifetimes: TokenLifetimes,
    leeway_secs: u64,
}

impl TokenCodec {
    /// Create a codec with explicit secrets and lifetimes
    #[must_use]
    pub const fn new(secrets: TokenSecrets, lifetimes: TokenLifetimes) -> Self {
        Self {
            secrets,
            lifetimes,
            leeway_secs: TOKEN_LEEWAY_SECS,
        }
    }

    /// Lifetime of the given kind in whole seconds, as advertised in
    /// `expires_in` fields; derived from the same duration as the `exp` claim
    #[must_use]
    pub fn expires_in(&self, kind: TokenKind) -> i64 {
        self.lifetimes.for_kind(kind).num_seconds()
    }

    /// Mint a direct-login token carrying the user's display name
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn mint_login(&self, user: &User) -> Result<String> {
        self.mint(
            TokenKind::Login,
            Claims {
                sub: user.id.to_string(),
                email: user.email.clone(),
                name: user.display_name.clone(),
                aud: None,
                iat: 0,
                exp: 0,
            },
        )
    }

    /// Mint an OAuth access token audience-bound to `client_id`
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn mint_access(&self, user: &User, client_id: &str) -> Result<String> {
        self.mint(
            TokenKind::Access,
            Claims {
                sub: user.id.to_string(),
                email: user.email.clone(),
                name: None,
                aud: Some(client_id.to_owned()),
                iat: 0,
                exp: 0,
            },
        )
    }

    /// Mint a browser session cookie token
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn mint_session(&self, user: &User) -> Result<String> {
        self.mint(
            TokenKind::Session,
            Claims {
                sub: user.id.to_string(),
                email: user.email.clone(),
                name: None,
                aud: None,
                iat: 0,
                exp: 0,
            },
        )
    }

    fn mint(&self, kind: TokenKind, mut claims: Claims) -> Result<String> {
        let now = Utc::now();
        claims.iat = now.timestamp();
        claims.exp = (now + self.lifetimes.for_kind(kind)).timestamp();

        let key = EncodingKey::from_secret(self.secrets.for_kind(kind));
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key)?;
        Ok(token)
    }

    /// Verify a token of the given kind and return its claims
    ///
    /// Decoding and signature verification run first; expiry is then checked
    /// manually against the configured leeway so an expired token yields a
    /// precise [`TokenError::Expired`] rather than a generic failure.
    ///
    /// # Errors
    /// Returns a [`TokenError`] if the signature is invalid, the token is
    /// malformed, or it has expired.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode_claims(kind, token)?;
        self.check_expiry(&claims)?;

        tracing::debug!(
            "{} token validated for subject {}",
            kind.as_str(),
            claims.sub
        );
        Ok(claims)
    }

    /// Decode claims without expiry validation
    fn decode_claims(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = self.leeway_secs;

        let key = DecodingKey::from_secret(self.secrets.for_kind(kind));
        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Check claims expiry with the configured clock-skew leeway
    fn check_expiry(&self, claims: &Claims) -> Result<(), TokenError> {
        let current_time = Utc::now();
        let leeway = i64::try_from(self.leeway_secs).unwrap_or(0);
        if current_time.timestamp() > claims.exp + leeway {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
            tracing::warn!(
                "Token expired for subject {} at {}",
                claims.sub,
                expired_at.to_rfc3339()
            );
            return Err(TokenError::Expired {
                expired_at,
                current_time,
            });
        }
        Ok(())
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> TokenError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::Invalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => TokenError::Malformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => TokenError::Malformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => TokenError::Malformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            ErrorKind::Utf8(utf8_err) => TokenError::Malformed {
                details: format!("Token contains invalid UTF-8: {utf8_err}"),
            },
            _ => TokenError::Invalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }
}

/// Generate a random signing secret
///
/// # Errors
/// Returns an error if the system RNG fails; the server cannot operate
/// securely without a working RNG.
pub fn generate_token_secret() -> Result<[u8; 64]> {
    use ring::rand::{SecureRandom, SystemRandom};

    let rng = SystemRandom::new();
    let mut secret = [0u8; 64];

    rng.fill(&mut secret).map_err(|e| {
        tracing::error!("CRITICAL: failed to generate secure token secret: {}", e);
        anyhow::anyhow!("System RNG failure - cannot generate secure token secret")
    })?;

    Ok(secret)
}
