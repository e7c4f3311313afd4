//! PostgreSQL access using SQLx.
//!
//! Owns the connection pool and the embedded migrations under `migrations/`,
//! and hands out repositories bound to the pool.

mod users;

pub use users::{PgUserRepository, UserRepository};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("user not found: {0}")]
    UserNotFound(i64),
    #[error("user already exists: {provider}/{provider_id}")]
    UserExists {
        provider: String,
        provider_id: String,
    },
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

    /// Connect to PostgreSQL and apply pending migrations.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Some(Self::IDLE_TIMEOUT))
            .connect(&config.url)
            .await?;

        info!(max_connections = config.max_connections, "Database connected");

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one provided by `#[sqlx::test]`.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run embedded migrations.
    pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(pool).await?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get user repository.
    pub fn users(&self) -> PgUserRepository {
        PgUserRepository::new(self.pool.clone())
    }
}
