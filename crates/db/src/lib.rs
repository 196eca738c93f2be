//! SQLite connection pool and schema bootstrap for the bookstore service.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// URL of a private in-memory database.
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Connection settings for the relational store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DbConfig {
    #[serde(default = "DbConfig::default_url")]
    pub url: String,
    #[serde(default = "DbConfig::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DbConfig::default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl DbConfig {
    pub fn default_url() -> String {
        "sqlite://books.db".to_string()
    }

    fn default_max_connections() -> u32 {
        5
    }

    fn default_acquire_timeout_ms() -> u64 {
        5000
    }

    /// Config pointing at a fresh in-memory database.
    pub fn in_memory() -> Self {
        Self {
            url: IN_MEMORY_URL.to_string(),
            ..Self::default()
        }
    }

    /// Whether the URL targets an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
            acquire_timeout_ms: Self::default_acquire_timeout_ms(),
        }
    }
}

/// Idempotent DDL contributed by a module.
#[derive(Debug, Clone)]
pub struct SchemaStatement {
    pub id: &'static str,
    pub up: &'static str,
}

/// Handle to the relational store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for the configured URL, creating the database file if needed.
    pub async fn connect(config: &DbConfig) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("invalid database url '{}'", config.url))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms));

        // Each in-memory connection is its own database, so keep exactly one alive.
        pool_options = if config.is_in_memory() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to '{}'", config.url))?;

        tracing::info!(
            target: "bookstore-db",
            url = %config.url,
            in_memory = config.is_in_memory(),
            "database pool ready"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute each statement in order. Statements must be safe to re-run.
    pub async fn apply_schema(&self, statements: &[SchemaStatement]) -> anyhow::Result<()> {
        for statement in statements {
            tracing::info!(target: "bookstore-db", id = statement.id, "applying schema statement");
            sqlx::query(statement.up)
                .execute(&self.pool)
                .await
                .with_context(|| format!("schema statement '{}' failed", statement.id))?;
        }
        Ok(())
    }

    /// Round-trip a trivial query to confirm the store is reachable.
    pub async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
