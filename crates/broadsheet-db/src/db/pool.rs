//! Database setup and initialization

use broadsheet_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Open (creating if needed) the SQLite database and apply pending migrations.
#[tracing::instrument(skip(database_url))]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    tracing::info!(max_connections, "Database connected successfully");

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
