// Push notification device token registry.

use sqlx::PgPool;

use crate::error::Result;

#[derive(Clone)]
pub struct DeviceStore {
    pool: PgPool,
}

impl DeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a device token, reactivating it if previously seen.
    pub async fn upsert(&self, token: &str, platform: Option<&str>) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO device_tokens (token, platform, active, last_seen_at)
            VALUES ($1, $2, TRUE, now())
            ON CONFLICT (token) DO UPDATE
                SET active = TRUE,
                    last_seen_at = now(),
                    platform = COALESCE(EXCLUDED.platform, device_tokens.platform)
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(platform)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Mark a token inactive (e.g. FCM reported it unregistered).
    pub async fn deactivate(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE device_tokens SET active = FALSE WHERE token = $1 AND active = TRUE",
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_active(&self) -> Result<Vec<String>> {
        let tokens = sqlx::query_scalar::<_, String>(
            "SELECT token FROM device_tokens WHERE active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }
}
