//! Workout core server process
//!
//! Boots configuration, logging, the database pool and migrations, wires the
//! service kernel and the scheduled tasks, then waits for Ctrl-C. Transports
//! embed `ServerDeps` and call the domain activities.

use anyhow::{Context, Result};
use logbook_core::config::Config;
use logbook_core::domains::workouts::EnergyEstimator;
use logbook_core::kernel::{start_scheduler, ServerDeps};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,logbook_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting workout core");

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    let deps = ServerDeps::new(
        pool.clone(),
        EnergyEstimator::new(config.default_user_weight_kg),
    )
    .await;
    tracing::debug!(?deps, "Service kernel ready");

    let mut scheduler = start_scheduler(pool.clone(), config.prune_schedule())
        .await
        .context("Failed to start scheduled tasks")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduled tasks")?;
    pool.close().await;

    Ok(())
}
