// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! SQLite-backed persistence for users, OAuth clients, authorization codes,
//! and tenants. All access goes through parameterized queries; the
//! authorization-code consume path is the only operation that needs a
//! transaction.

mod auth_codes;
mod clients;
mod tenants;
mod users;

pub use auth_codes::ConsumeOutcome;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for user, client, and code storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    /// Returns an error if any table or index creation fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_clients().await?;
        self.migrate_auth_codes().await?;
        self.migrate_tenants().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) async fn create_test_db() -> Result<Database> {
        // In-memory database - each connection gets its own isolated instance
        Database::new("sqlite::memory:").await
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = create_test_db().await.unwrap();
        db.migrate().await.unwrap();
    }
}
