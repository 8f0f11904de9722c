// ABOUTME: OAuth client persistence: operator-provisioned application records
// ABOUTME: The stored redirect-URI column is decoded at the registry boundary

use super::Database;
use crate::models::OAuthClient;
use crate::oauth2::registry::parse_redirect_uris;
use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the oauth_clients table
    pub(super) async fn migrate_clients(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_clients (
                id TEXT PRIMARY KEY,
                client_id TEXT UNIQUE NOT NULL,
                client_secret TEXT NOT NULL,
                client_name TEXT,
                redirect_uris TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_oauth_clients_client_id ON oauth_clients(client_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Register a client application
    ///
    /// Not exposed over HTTP; used by operator tooling and tests. The
    /// redirect set is stored as a JSON array.
    ///
    /// # Errors
    /// Returns an error if the insert fails
    pub async fn register_client(&self, client: &OAuthClient) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO oauth_clients (id, client_id, client_secret, client_name, redirect_uris, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(client.id.to_string())
        .bind(&client.client_id)
        .bind(&client.client_secret)
        .bind(&client.client_name)
        .bind(serde_json::to_string(&client.redirect_uris)?)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a client by its public identifier
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_client_by_client_id(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        let row = sqlx::query(
            r"
            SELECT id, client_id, client_secret, client_name, redirect_uris, created_at
            FROM oauth_clients WHERE client_id = $1
            ",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let id: String = row.get("id");
            let redirect_raw: String = row.get("redirect_uris");
            Ok(OAuthClient {
                id: Uuid::parse_str(&id)?,
                client_id: row.get("client_id"),
                client_secret: row.get("client_secret"),
                client_name: row.get("client_name"),
                redirect_uris: parse_redirect_uris(&redirect_raw),
                created_at: row.get("created_at"),
            })
        })
        .transpose()
    }

    /// Store a raw redirect-URI column value for a client, bypassing the
    /// canonical JSON-array encoding
    ///
    /// Exists for tests and for repairing records written by older tooling
    /// that stored a JSON string or a bare scalar.
    ///
    /// # Errors
    /// Returns an error if the update fails
    pub async fn set_client_redirect_uris_raw(&self, client_id: &str, raw: &str) -> Result<()> {
        sqlx::query("UPDATE oauth_clients SET redirect_uris = $1 WHERE client_id = $2")
            .bind(raw)
            .bind(client_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
