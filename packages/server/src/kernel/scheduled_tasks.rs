//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (daily, 03:00 by default)
//!     │
//!     └─► HandlerLog::prune_older_than(now - retention)
//! ```
//!
//! The returned [`JobScheduler`] owns every job. The process keeps it alive
//! and calls `shutdown` on stop, which cancels the jobs with it.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::handler_log::HandlerLog;

/// How the handler-log prune job runs.
#[derive(Debug, Clone)]
pub struct PruneSchedule {
    /// Six-field cron expression (seconds first).
    pub cron: String,
    pub retention_days: i64,
}

/// Start all scheduled tasks
pub async fn start_scheduler(pool: PgPool, prune: PruneSchedule) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let retention_days = prune.retention_days;
    let prune_job = Job::new_async(prune.cron.as_str(), move |_uuid, _lock| {
        let pool = pool.clone();
        Box::pin(async move {
            if let Err(e) = run_handler_log_prune(&pool, retention_days).await {
                tracing::error!("Handler log prune failed: {}", e);
            }
        })
    })
    .with_context(|| format!("invalid prune schedule {:?}", prune.cron))?;

    scheduler.add(prune_job).await?;
    scheduler.start().await?;

    tracing::info!(
        schedule = %prune.cron,
        retention_days,
        "Scheduled tasks started (handler log prune)"
    );
    Ok(scheduler)
}

/// Delete idempotency claims older than the retention window.
pub async fn run_handler_log_prune(pool: &PgPool, retention_days: i64) -> Result<u64> {
    let cutoff = Utc::now() - Duration::days(retention_days);
    HandlerLog::prune_older_than(cutoff, pool).await
}
