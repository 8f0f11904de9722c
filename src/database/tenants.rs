// ABOUTME: Tenant records mapping a tenant key to its post-login callback URL
// ABOUTME: Resolved opportunistically during direct login

use super::Database;
use crate::models::Tenant;
use anyhow::Result;

impl Database {
    /// Create the tenants table
    pub(super) async fn migrate_tenants(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tenants (
                tenant_key TEXT PRIMARY KEY,
                callback_url TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a tenant record
    ///
    /// # Errors
    /// Returns an error if the upsert fails
    pub async fn upsert_tenant(&self, tenant: &Tenant) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO tenants (tenant_key, callback_url)
            VALUES ($1, $2)
            ON CONFLICT(tenant_key) DO UPDATE SET callback_url = $2
            ",
        )
        .bind(&tenant.tenant_key)
        .bind(&tenant.callback_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve a tenant key to its callback URL; unknown keys resolve to `None`
    ///
    /// # Errors
    /// Returns an error if the query fails
    pub async fn get_tenant_callback_url(&self, tenant_key: &str) -> Result<Option<String>> {
        let url =
            sqlx::query_scalar("SELECT callback_url FROM tenants WHERE tenant_key = $1")
                .bind(tenant_key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;
    use super::*;

    #[tokio::test]
    async fn test_tenant_round_trip() {
        let db = create_test_db().await.unwrap();
        db.upsert_tenant(&Tenant {
            tenant_key: "acme".into(),
            callback_url: "https://acme.test/welcome".into(),
        })
        .await
        .unwrap();

        assert_eq!(
            db.get_tenant_callback_url("acme").await.unwrap().as_deref(),
            Some("https://acme.test/welcome")
        );
        assert!(db.get_tenant_callback_url("ghost").await.unwrap().is_none());
    }
}
