// ABOUTME: Authorization code persistence with atomic single-use consumption
// ABOUTME: Conditional UPDATE inside a transaction enforces exactly-once redemption

use super::Database;
use crate::models::AuthorizationCode;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

/// Outcome of a consume attempt, classified for the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The code was valid and has been destroyed
    Redeemed {
        /// Internal id of the client the code was issued for
        client_id: Uuid,
        /// User who authorized the code
        user_id: Uuid,
    },
    /// No row for this code
    NotFound,
    /// The row exists but its expiry has passed
    Expired,
    /// The row exists and was already marked used
    AlreadyUsed,
}

impl Database {
    /// Create the auth_codes table
    ///
    /// Timestamps are unix seconds so the conditional consume compares
    /// integers, not encoded strings.
    pub(super) async fn migrate_auth_codes(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS auth_codes (
                code TEXT PRIMARY KEY,
                client_id TEXT NOT NULL REFERENCES oauth_clients(id),
                user_id TEXT NOT NULL REFERENCES users(id),
                issued_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                used BOOLEAN NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_auth_codes_expires_at ON auth_codes(expires_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Persist a freshly issued code
    ///
    /// # Errors
    /// Returns an error if the insert fails (including the negligible-by-
    /// construction case of a code collision on the primary key)
    pub async fn insert_auth_code(&self, auth_code: &AuthorizationCode) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO auth_codes (code, client_id, user_id, issued_at, expires_at, used)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&auth_code.code)
        .bind(auth_code.client_id.to_string())
        .bind(auth_code.user_id.to_string())
        .bind(auth_code.issued_at.timestamp())
        .bind(auth_code.expires_at.timestamp())
        .bind(auth_code.used)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Atomically consume a code, destroying it on success
    ///
    /// The conditional UPDATE is the mutual-exclusion point: of N concurrent
    /// attempts on one code, exactly one observes an affected row. The winner
    /// reads the bound identities and deletes the row inside the same
    /// transaction; losers re-read the row to classify their failure.
    ///
    /// # Errors
    /// Returns an error if a query or the transaction fails
    pub async fn consume_auth_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE auth_codes SET used = 1 WHERE code = $1 AND used = 0 AND expires_at > $2",
        )
        .bind(code)
        .bind(now.timestamp())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 1 {
            let row = sqlx::query("SELECT client_id, user_id FROM auth_codes WHERE code = $1")
                .bind(code)
                .fetch_one(&mut *tx)
                .await?;

            let client_id: String = row.get("client_id");
            let user_id: String = row.get("user_id");

            // Redemption is destructive: a redeemed code cannot be inspected again
            sqlx::query("DELETE FROM auth_codes WHERE code = $1")
                .bind(code)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            return Ok(ConsumeOutcome::Redeemed {
                client_id: Uuid::parse_str(&client_id)?,
                user_id: Uuid::parse_str(&user_id)?,
            });
        }

        // Lost the update: classify why without leaving the transaction
        let row = sqlx::query("SELECT used, expires_at FROM auth_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        let outcome = match row {
            None => ConsumeOutcome::NotFound,
            Some(row) => {
                let used: bool = row.get("used");
                let expires_at: i64 = row.get("expires_at");
                if used {
                    ConsumeOutcome::AlreadyUsed
                } else if expires_at <= now.timestamp() {
                    ConsumeOutcome::Expired
                } else {
                    // The update matched nothing yet the row looks redeemable;
                    // a concurrent redeemer must have won between statements.
                    ConsumeOutcome::AlreadyUsed
                }
            }
        };

        Ok(outcome)
    }

    /// Delete every used or expired code
    ///
    /// # Errors
    /// Returns an error if the delete fails
    pub async fn cleanup_auth_codes(&self, now: DateTime<Utc>) -> Result<u64> {
        let deleted = sqlx::query("DELETE FROM auth_codes WHERE used = 1 OR expires_at < $1")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    /// Count stored codes (test and diagnostics helper)
    ///
    /// # Errors
    /// Returns an error if the query fails
    pub async fn count_auth_codes(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM auth_codes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;
    use super::*;
    use chrono::Duration;

    fn code_row(code: &str, expires_in: Duration) -> AuthorizationCode {
        let now = Utc::now();
        AuthorizationCode {
            code: code.into(),
            client_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            issued_at: now,
            expires_at: now + expires_in,
            used: false,
        }
    }

    #[tokio::test]
    async fn test_consume_is_destructive() {
        let db = create_test_db().await.unwrap();
        let row = code_row("code-1", Duration::minutes(10));
        db.insert_auth_code(&row).await.unwrap();

        let outcome = db.consume_auth_code("code-1", Utc::now()).await.unwrap();
        assert_eq!(
            outcome,
            ConsumeOutcome::Redeemed {
                client_id: row.client_id,
                user_id: row.user_id
            }
        );
        assert_eq!(db.count_auth_codes().await.unwrap(), 0);

        // Second attempt: the row is gone
        let second = db.consume_auth_code("code-1", Utc::now()).await.unwrap();
        assert_eq!(second, ConsumeOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_expired_code_classified() {
        let db = create_test_db().await.unwrap();
        db.insert_auth_code(&code_row("stale", Duration::minutes(-1)))
            .await
            .unwrap();

        let outcome = db.consume_auth_code("stale", Utc::now()).await.unwrap();
        assert_eq!(outcome, ConsumeOutcome::Expired);
    }

    #[tokio::test]
    async fn test_unknown_code_not_found() {
        let db = create_test_db().await.unwrap();
        let outcome = db.consume_auth_code("ghost", Utc::now()).await.unwrap();
        assert_eq!(outcome, ConsumeOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_cleanup_removes_used_and_expired_only() {
        let db = create_test_db().await.unwrap();

        let mut used = code_row("used", Duration::minutes(10));
        used.used = true;
        db.insert_auth_code(&used).await.unwrap();
        db.insert_auth_code(&code_row("stale", Duration::minutes(-5)))
            .await
            .unwrap();
        db.insert_auth_code(&code_row("fresh", Duration::minutes(10)))
            .await
            .unwrap();

        let deleted = db.cleanup_auth_codes(Utc::now()).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.count_auth_codes().await.unwrap(), 1);

        // Fresh code still redeemable after cleanup
        let outcome = db.consume_auth_code("fresh", Utc::now()).await.unwrap();
        assert!(matches!(outcome, ConsumeOutcome::Redeemed { .. }));
    }
}
