use sqlx::postgres::PgPool;

pub async fn health_check(pool: &PgPool) -> anyhow::Result<bool> {
    let _result = sqlx::query("SELECT 1").fetch_one(pool).await?;

    Ok(true)
}

/// `health_check` collapsed to a flag for status endpoints.
pub async fn is_connected(pool: &PgPool) -> bool {
    match health_check(pool).await {
        Ok(connected) => connected,
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            false
        }
    }
}
