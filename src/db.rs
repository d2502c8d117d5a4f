//! Database connection and pool management for the Outreach CRM API.
//!
//! This module initializes the SeaORM connection pool (Postgres in production,
//! SQLite in tests) and applies the schema migrations.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

const CONNECT_ATTEMPTS: u32 = 5;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Opens the connection pool described by `cfg`.
///
/// Connection failures are retried with a doubling delay. An in-memory SQLite
/// URL gets a single long-lived connection, since each new connection would
/// open a fresh empty database.
///
/// ```no_run
/// use outreach_crm::{config::AppConfig, db::init_pool};
///
/// # async fn open() -> anyhow::Result<()> {
/// let db = init_pool(&AppConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    let url = cfg.database_url.trim();
    if url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "DATABASE_URL is empty".to_string(),
        }
        .into());
    }

    let options = connect_options(cfg, url);
    let mut delay = FIRST_RETRY_DELAY;
    let mut attempt = 1;
    loop {
        match Database::connect(options.clone()).await {
            Ok(conn) => {
                log::info!("Connected to {} database", backend_name(url));
                return Ok(conn);
            }
            Err(source) if attempt >= CONNECT_ATTEMPTS => {
                log::error!("Giving up on the database after {attempt} attempts: {source}");
                return Err(DatabaseError::ConnectionFailed { source }.into());
            }
            Err(err) => {
                log::warn!("Database connection attempt {attempt} failed: {err}; retrying in {delay:?}");
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

fn connect_options(cfg: &AppConfig, url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(url);
    options
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    if is_sqlite_memory(url) {
        options.max_connections(1).min_connections(1);
    } else {
        options
            .max_connections(cfg.db_max_connections.max(1))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800));
    }
    options
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && url.contains(":memory:")
}

fn backend_name(url: &str) -> &'static str {
    if url.starts_with("sqlite:") { "SQLite" } else { "Postgres" }
}

/// Applies all pending schema migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("applying database migrations")?;

    let applied = Migrator::get_applied_migrations(db)
        .await
        .context("listing applied migrations")?;
    log::info!("Database schema up to date ({} migrations applied)", applied.len());

    Ok(())
}

/// Health check for the database connection.
///
/// Executes `SELECT 1` to confirm the pool can still reach the database.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    use sea_orm::Statement;

    if matches!(db, DatabaseConnection::Disconnected) {
        anyhow::bail!("Database connection is not established");
    }

    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_are_detected() {
        assert!(is_sqlite_memory("sqlite::memory:"));
        assert!(!is_sqlite_memory("sqlite://data/outreach.db?mode=rwc"));
        assert!(!is_sqlite_memory("postgres://localhost/outreach"));
    }

    #[tokio::test]
    async fn empty_database_url_is_rejected() {
        let config = AppConfig {
            database_url: "   ".to_string(),
            ..Default::default()
        };

        let result = init_pool(&config).await;

        assert!(matches!(
            result.unwrap_err().downcast::<DatabaseError>(),
            Ok(DatabaseError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn memory_pool_migrates_and_passes_health_check() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 8,
            ..Default::default()
        };

        let db = init_pool(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        health_check(&db).await.unwrap();
    }
}
