use async_trait::async_trait;
use sqlx::PgPool;

use super::CredentialStore;
use crate::error::StoreError;

/// Postgres-backed credential store over the `tokens` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("migration failed: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn lookup_hash(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT refresh_token FROM tokens WHERE user_id = $1 AND device_id = $2",
        )
        .bind(user_id)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn update_hash(
        &self,
        user_id: &str,
        device_id: &str,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET refresh_token = $1, updated_at = now()
            WHERE user_id = $2 AND device_id = $3 AND refresh_token = $4
            "#,
        )
        .bind(new_hash)
        .bind(user_id)
        .bind(device_id)
        .bind(expected_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_hash(
        &self,
        user_id: &str,
        device_id: &str,
        hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (user_id, device_id, refresh_token)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, device_id)
            DO UPDATE SET refresh_token = EXCLUDED.refresh_token, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .bind(hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, user_id: &str, device_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND device_id = $2")
            .bind(user_id)
            .bind(device_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_all(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
