// ABOUTME: Environment-variable driven server configuration
// ABOUTME: Parsed once at startup and threaded through constructors
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed configuration read from the process environment

use crate::auth::{TokenLifetimes, TokenSecrets};
use crate::constants::{defaults, limits};
use anyhow::{Context, Result};
use chrono::Duration;
use std::env;
use tracing::warn;

/// Deployment environment, controlling cookie security
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Stable name for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        }
    }

    /// Whether session cookies must carry the `Secure` attribute
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token signing configuration
    pub auth: AuthConfig,
    /// Password hashing configuration
    pub password: PasswordConfig,
    /// Captcha storage configuration
    pub captcha: CaptchaConfig,
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite database URL
    pub url: String,
}

/// Token signing secrets and lifetimes
///
/// Each token kind carries its own secret so keys rotate independently.
/// `JWT_SECRET` seeds all three when per-kind variables are absent, keeping
/// single-secret deployments working.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for direct-login tokens
    pub login_secret: String,
    /// Secret for OAuth access tokens
    pub access_secret: String,
    /// Secret for session cookie tokens
    pub session_secret: String,
    /// Direct-login token lifetime in days
    pub login_expiry_days: i64,
    /// OAuth access token lifetime in days
    pub access_expiry_days: i64,
    /// Session cookie token lifetime in seconds
    pub session_expiry_secs: i64,
}

impl AuthConfig {
    /// Build codec secrets from this configuration
    #[must_use]
    pub fn token_secrets(&self) -> TokenSecrets {
        TokenSecrets::new(
            self.login_secret.as_bytes().to_vec(),
            self.access_secret.as_bytes().to_vec(),
            self.session_secret.as_bytes().to_vec(),
        )
    }

    /// Build codec lifetimes from this configuration
    #[must_use]
    pub fn token_lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            login: Duration::days(self.login_expiry_days),
            access: Duration::days(self.access_expiry_days),
            session: Duration::seconds(self.session_expiry_secs),
        }
    }
}

/// Password hashing settings
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// bcrypt work factor
    pub hash_cost: u32,
}

/// Captcha storage settings
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    /// Challenge TTL in seconds
    pub ttl_secs: u64,
    /// Redis URL; absent selects the in-memory backend
    pub redis_url: Option<String>,
    /// Bound on in-memory entries
    pub max_entries: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error when a variable fails to parse or no signing secret
    /// is configured
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let shared_secret = env::var("JWT_SECRET").ok();
        let secret_for = |name: &str| -> Result<String> {
            env::var(name).ok().or_else(|| shared_secret.clone()).context(format!(
                "{name} is not set and no shared JWT_SECRET fallback is configured"
            ))
        };

        let config = Self {
            http_port: env_var_or("HTTP_PORT", &defaults::HTTP_PORT.to_string())?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment: Environment::parse(&env_var_or("ENVIRONMENT", "development")?),
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", defaults::DATABASE_URL)?,
            },
            auth: AuthConfig {
                login_secret: secret_for("JWT_LOGIN_SECRET")?,
                access_secret: secret_for("JWT_ACCESS_SECRET")?,
                session_secret: secret_for("JWT_SESSION_SECRET")?,
                login_expiry_days: env_var_or(
                    "LOGIN_TOKEN_EXPIRY_DAYS",
                    &limits::LOGIN_TOKEN_EXPIRY_DAYS.to_string(),
                )?
                .parse()
                .context("Invalid LOGIN_TOKEN_EXPIRY_DAYS value")?,
                access_expiry_days: env_var_or(
                    "ACCESS_TOKEN_EXPIRY_DAYS",
                    &limits::ACCESS_TOKEN_EXPIRY_DAYS.to_string(),
                )?
                .parse()
                .context("Invalid ACCESS_TOKEN_EXPIRY_DAYS value")?,
                session_expiry_secs: env_var_or(
                    "SESSION_TOKEN_EXPIRY_SECS",
                    &limits::SESSION_TOKEN_EXPIRY_SECS.to_string(),
                )?
                .parse()
                .context("Invalid SESSION_TOKEN_EXPIRY_SECS value")?,
            },
            password: PasswordConfig {
                hash_cost: env_var_or(
                    "PASSWORD_HASH_COST",
                    &defaults::PASSWORD_HASH_COST.to_string(),
                )?
                .parse()
                .context("Invalid PASSWORD_HASH_COST value")?,
            },
            captcha: CaptchaConfig {
                ttl_secs: env_var_or("CAPTCHA_TTL_SECS", &limits::CAPTCHA_TTL_SECS.to_string())?
                    .parse()
                    .context("Invalid CAPTCHA_TTL_SECS value")?,
                redis_url: env::var("REDIS_URL").ok(),
                max_entries: env_var_or(
                    "CAPTCHA_CACHE_MAX_ENTRIES",
                    &defaults::CAPTCHA_CACHE_MAX_ENTRIES.to_string(),
                )?
                .parse()
                .context("Invalid CAPTCHA_CACHE_MAX_ENTRIES value")?,
            },
        };

        Ok(config)
    }

    /// One-line summary for startup logging; never includes secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} env={} db={} captcha_backend={} access_token_days={}",
            self.http_port,
            self.environment.as_str(),
            self.database.url,
            if self.captcha.redis_url.is_some() {
                "redis"
            } else {
                "memory"
            },
            self.auth.access_expiry_days
        )
    }
}

/// Read an environment variable with a default fallback
fn env_var_or(name: &str, default: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_owned()),
        Err(e) => Err(e).context(format!("Failed to read environment variable {name}")),
    }
}
