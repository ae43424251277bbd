//! `SQLite` database for the tokenpair server.

use std::path::Path;

use sqlx::{Pool, Sqlite};
use tracing::info;

use tokenpair_core::db::{self, DatabaseError, PoolSettings};

#[derive(Clone)]
pub struct AuthDatabase {
    pool: Pool<Sqlite>,
}

impl AuthDatabase {
    /// Open or create the database file and apply migrations.
    pub async fn open(path: &Path, settings: PoolSettings) -> Result<Self, DatabaseError> {
        let pool = db::open_pool(path, settings).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let pool = db::open_pool_in_memory().await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Auth database migrations complete");
        Ok(())
    }

    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
