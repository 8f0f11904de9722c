// ABOUTME: User management database operations
// ABOUTME: Account creation, lookup, and the per-user provider credential blob

use super::Database;
use crate::models::User;
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                password_hash TEXT NOT NULL,
                api_keys TEXT NOT NULL DEFAULT '{}',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new user
    ///
    /// # Errors
    /// Returns an error if the email is already in use or the insert fails
    pub async fn create_user(&self, user: &User) -> Result<Uuid> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(anyhow!("Email already in use"));
        }

        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, password_hash, api_keys, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(serde_json::to_string(&user.api_keys)?)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_impl("email", email).await
    }

    async fn get_user_impl(&self, field: &str, value: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT id, email, display_name, password_hash, api_keys, created_at FROM users WHERE {field} = $1"
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_user(&row)).transpose()
    }

    /// Convert a database row to a User struct
    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id: String = row.get("id");
        let api_keys_raw: String = row.get("api_keys");

        Ok(User {
            id: Uuid::parse_str(&id)?,
            email: row.get("email"),
            display_name: row.get("display_name"),
            password_hash: row.get("password_hash"),
            api_keys: parse_api_keys(&api_keys_raw),
            created_at: row.get("created_at"),
        })
    }

    /// Read a user's provider credential map; `None` when the user is absent
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_user_api_keys(&self, user_id: Uuid) -> Result<Option<Map<String, Value>>> {
        let row = sqlx::query("SELECT api_keys FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let raw: String = row.get("api_keys");
            parse_api_keys(&raw)
        }))
    }

    /// Upsert one provider entry in a user's credential map
    ///
    /// Returns `false` when the user does not exist.
    ///
    /// # Errors
    /// Returns an error if a query or serialization fails
    pub async fn update_user_api_key(
        &self,
        user_id: Uuid,
        provider: &str,
        stored_value: &str,
    ) -> Result<bool> {
        let Some(mut keys) = self.get_user_api_keys(user_id).await? else {
            return Ok(false);
        };

        keys.insert(provider.to_owned(), Value::String(stored_value.to_owned()));

        sqlx::query("UPDATE users SET api_keys = $1 WHERE id = $2")
            .bind(serde_json::to_string(&keys)?)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    /// Get total user count
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_user_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Decode the stored credential blob, tolerating legacy encodings
///
/// The column normally holds a JSON object, but older writers stored a
/// JSON-encoded string of an object. Anything undecodable becomes an empty
/// map rather than an error.
fn parse_api_keys(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}
