//! Maintenance CLI: schema migrations and handler-log pruning.
//!
//! Prints one JSON line per command for scripts to parse.

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use logbook_core::config::{Config, MIN_HANDLER_LOG_RETENTION_DAYS};
use logbook_core::kernel::scheduled_tasks::run_handler_log_prune;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Schema migrations and maintenance for the workout core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,

    /// Delete handler-log claims older than the retention window
    PruneHandlerLog {
        /// Overrides HANDLER_LOG_RETENTION_DAYS
        #[arg(long)]
        retention_days: Option<i64>,
    },
}

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

fn output(resp: &Response) -> Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

async fn connect(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,logbook_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pool = connect(&config).await?;

    let response = match cli.command {
        Commands::Migrate => {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            Response {
                success: true,
                message: Some("migrations applied".to_string()),
                count: None,
            }
        }
        Commands::PruneHandlerLog { retention_days } => {
            let days = retention_days.unwrap_or(config.handler_log_retention_days);
            ensure!(
                days >= MIN_HANDLER_LOG_RETENTION_DAYS,
                "retention must be at least {} days (got {})",
                MIN_HANDLER_LOG_RETENTION_DAYS,
                days
            );
            let deleted = run_handler_log_prune(&pool, days).await?;
            Response {
                success: true,
                message: None,
                count: Some(deleted),
            }
        }
    };

    output(&response)?;
    pool.close().await;
    Ok(())
}
