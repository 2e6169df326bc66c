use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::kernel::scheduled_tasks::PruneSchedule;

/// Handler-log claims are kept at least this long.
pub const MIN_HANDLER_LOG_RETENTION_DAYS: i64 = 30;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub handler_log_retention_days: i64,
    pub handler_log_prune_schedule: String,
    /// Used by the energy estimator when a profile has no weight.
    pub default_user_weight_kg: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let config = Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive number")?,
            handler_log_retention_days: env::var("HANDLER_LOG_RETENTION_DAYS")
                .unwrap_or_else(|_| MIN_HANDLER_LOG_RETENTION_DAYS.to_string())
                .parse()
                .context("HANDLER_LOG_RETENTION_DAYS must be a number of days")?,
            handler_log_prune_schedule: env::var("HANDLER_LOG_PRUNE_SCHEDULE")
                .unwrap_or_else(|_| "0 0 3 * * *".to_string()),
            default_user_weight_kg: env::var("DEFAULT_USER_WEIGHT_KG")
                .unwrap_or_else(|_| "70".to_string())
                .parse()
                .context("DEFAULT_USER_WEIGHT_KG must be a number")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.handler_log_retention_days >= MIN_HANDLER_LOG_RETENTION_DAYS,
            "HANDLER_LOG_RETENTION_DAYS must be at least {} (got {})",
            MIN_HANDLER_LOG_RETENTION_DAYS,
            self.handler_log_retention_days
        );
        ensure!(
            self.database_max_connections > 0,
            "DATABASE_MAX_CONNECTIONS must be positive"
        );
        ensure!(
            self.default_user_weight_kg > 0.0,
            "DEFAULT_USER_WEIGHT_KG must be positive"
        );
        Ok(())
    }

    pub fn prune_schedule(&self) -> PruneSchedule {
        PruneSchedule {
            cron: self.handler_log_prune_schedule.clone(),
            retention_days: self.handler_log_retention_days,
        }
    }
}
