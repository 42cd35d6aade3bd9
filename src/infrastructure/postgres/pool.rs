//! PostgreSQL connection pool.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Errors that can occur with the PostgreSQL pool.
#[derive(Debug, Error)]
pub enum PostgresPoolError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),
}

/// PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresPool {
    /// The underlying connection pool
    pool: PgPool,

    /// Database URL (for logging purposes)
    database_url: String,
}

impl PostgresPool {
    /// Create a new PostgreSQL pool from configuration and verify it with a ping.
    ///
    /// Credentials and the database name are applied on top of `config.url`.
    pub async fn new(
        config: &DatabaseConfig,
        connect_timeout: Duration,
    ) -> Result<Self, PostgresPoolError> {
        let options = PgConnectOptions::from_str(&config.url)?
            .username(&config.username)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.pool)
            .acquire_timeout(connect_timeout)
            .connect_with(options)
            .await?;

        let pool = Self {
            pool,
            database_url: config.url.clone(),
        };

        pool.ping(connect_timeout).await?;

        tracing::info!(
            url = %pool.database_url_masked(),
            database = %config.name,
            pool_size = config.pool,
            "PostgreSQL connection pool created"
        );

        Ok(pool)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the pool can still hand out connections.
    pub fn is_available(&self) -> bool {
        !self.pool.is_closed()
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self, timeout: Duration) -> Result<(), PostgresPoolError> {
        match tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(&self.pool)).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(PostgresPoolError::ConnectionUnavailable(format!(
                "ping timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Get the database URL (masked for logging).
    pub fn database_url_masked(&self) -> String {
        mask_url(&self.database_url)
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

/// Mask the password portion of a connection URL.
fn mask_url(url: &str) -> String {
    let authority = url.find("://").map(|i| i + 3).unwrap_or(0);

    if let Some(at) = url[authority..].find('@').map(|i| authority + i) {
        if let Some(colon) = url[authority..at].find(':').map(|i| authority + i) {
            return format!("{}***{}", &url[..=colon], &url[at..]);
        }
    }
    url.to_string()
}
