//! Idempotency fence for post-commit handlers.
//!
//! A handler claims `(handler, event_type, entity_key)` by inserting a row
//! with `ON CONFLICT DO NOTHING`. The claim and the handler's own writes share
//! one transaction: if the action fails, the claim rolls back with it and a
//! later re-delivery can try again.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct HandlerLog {
    pub handler_name: String,
    pub event_type: String,
    pub entity_key: String,
    pub created_at: DateTime<Utc>,
}

impl HandlerLog {
    /// Run `action` at most once per `(handler, event_type, entity_key)`.
    ///
    /// Returns `true` when the action ran, `false` when the key was already
    /// claimed.
    pub async fn try_process<F>(
        handler: &str,
        event_type: &str,
        entity_key: &str,
        pool: &PgPool,
        action: F,
    ) -> Result<bool>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<()>> + Send,
    {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "INSERT INTO handler_logs (handler_name, event_type, entity_key)
             VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(handler)
        .bind(event_type)
        .bind(entity_key)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !claimed {
            debug!(handler, event_type, entity_key, "Already processed, skipping");
            return Ok(false);
        }

        action(&mut *tx).await?;
        tx.commit().await?;

        debug!(handler, event_type, entity_key, "Processed");
        Ok(true)
    }

    pub async fn find(
        handler: &str,
        event_type: &str,
        entity_key: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM handler_logs
             WHERE handler_name = $1 AND event_type = $2 AND entity_key = $3",
        )
        .bind(handler)
        .bind(event_type)
        .bind(entity_key)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Delete claims older than `cutoff`. Returns the number removed.
    pub async fn prune_older_than(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM handler_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

        info!(removed = result.rows_affected(), %cutoff, "Pruned handler log");
        Ok(result.rows_affected())
    }
}
