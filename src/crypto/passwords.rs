// ABOUTME: bcrypt password hashing with a configurable work factor
// ABOUTME: Verification runs on the blocking pool to keep it off the async executor
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

use crate::errors::{AppError, AppResult};

/// Minimum bcrypt cost accepted by configuration
pub const MIN_HASH_COST: u32 = 10;

/// Password hashing facade holding the configured work factor
///
/// Constructed once at startup and threaded through the service layer;
/// nothing in this crate reaches for a module-level hashing client.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost
    ///
    /// # Errors
    /// Returns a configuration error if `cost` is below [`MIN_HASH_COST`].
    pub fn new(cost: u32) -> AppResult<Self> {
        if cost < MIN_HASH_COST {
            return Err(AppError::config(format!(
                "Password hash cost {cost} below minimum {MIN_HASH_COST}"
            )));
        }
        Ok(Self { cost })
    }

    /// Configured bcrypt cost
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password
    ///
    /// bcrypt salts internally; two hashes of the same input differ.
    ///
    /// # Errors
    /// Returns an internal error if the hashing primitive fails.
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        bcrypt::hash(plaintext, self.cost)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a plaintext password against a stored hash, off the async executor
    ///
    /// A malformed stored hash verifies as `false` rather than erroring, so
    /// callers see one shape for every credential failure.
    ///
    /// # Errors
    /// Returns an internal error only if the blocking task itself fails.
    pub async fn verify(&self, plaintext: &str, hash: &str) -> AppResult<bool> {
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash).unwrap_or(false))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
    }

    /// Synchronous verify for non-async contexts
    #[must_use]
    pub fn verify_blocking(&self, plaintext: &str, hash: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_weak_cost() {
        assert!(PasswordHasher::new(4).is_err());
        assert!(PasswordHasher::new(MIN_HASH_COST).is_ok());
    }

    #[tokio::test]
    async fn test_hash_and_verify_round_trip() {
        let hasher = PasswordHasher::new(MIN_HASH_COST).unwrap();
        let hash = hasher.hash("correct horse battery staple").unwrap();

        assert!(hasher.verify("correct horse battery staple", &hash).await.unwrap());
        assert!(!hasher.verify("wrong password", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_verifies_false() {
        let hasher = PasswordHasher::new(MIN_HASH_COST).unwrap();
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash").await.unwrap());
    }
}
