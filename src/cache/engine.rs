//! SQLite connection pool setup
//!
//! Single-writer serialization comes from SQLite's own file lock plus a
//! generous busy timeout, exactly as spec.md §4.4/§5 require — there is no
//! separate application-level writer mutex.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;
use crate::errors::Error;

static ENGINE: OnceCell<Arc<CacheEngine>> = OnceCell::new();

/// Holds the pool backing every cache read and synchronizer transaction.
pub struct CacheEngine {
    pool: SqlitePool,
}

impl CacheEngine {
    /// Connect to (creating if necessary) the cache database named by
    /// `config.cache_database_path`, apply pragmas, and run migrations.
    pub async fn setup(config: &Config) -> Result<Arc<CacheEngine>, Error> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", config.cache_database_path.display()))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .foreign_keys(true)
                .busy_timeout(Duration::from_secs(15));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(15))
            .connect_with(options)
            .await?;

        let engine = Arc::new(CacheEngine { pool });
        super::migrations::run_migrations(&engine).await?;

        let _ = ENGINE.set(Arc::clone(&engine));

        Ok(engine)
    }

    /// Get the global cache engine instance, once [`CacheEngine::setup`] has
    /// run.
    pub fn get() -> Arc<CacheEngine> {
        ENGINE
            .get()
            .map(Arc::clone)
            .expect("CacheEngine::setup must be called before CacheEngine::get")
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
