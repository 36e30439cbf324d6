//! Store handle
//!
//! Owns the SQLite pools and opens transactions on them. Reads use a pool of
//! `max_connections`. Every write, and every transaction that may write, goes
//! through a single writer connection.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::error::{StoreError, StoreResult};
use super::tx::{Handle, Tx, TxOptions};
use crate::db;

/// Default read pool size
const MAX_CONNECTIONS: u32 = 5;

/// How long a statement waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the record store.
///
/// Cloning is cheap; every clone uses the same pools.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    writer: SqlitePool,
}

impl Store {
    /// Open `dsn`, enable WAL journaling and foreign keys, and ping it.
    pub async fn open(dsn: &str) -> StoreResult<Self> {
        Self::open_with(dsn, MAX_CONNECTIONS).await
    }

    pub async fn open_with(dsn: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(dsn)
            .map_err(StoreError::Connection)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await
            .map_err(StoreError::Connection)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(StoreError::Connection)?;

        db::verify_connection(&pool)
            .await
            .map_err(StoreError::Connection)?;

        tracing::debug!(dsn, max_connections, "Record store opened");

        Ok(Self { pool, writer })
    }

    /// Open a database file by name.
    ///
    /// Names starting with `.` or `/` are used as given; anything else is
    /// resolved inside `data_folder`. Missing parent directories are created.
    pub async fn open_file(
        name: &str,
        data_folder: impl AsRef<Path>,
        max_connections: u32,
    ) -> StoreResult<Self> {
        let path = resolve_data_file(name, data_folder.as_ref());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Connection(sqlx::Error::Io(e)))?;
            }
        }

        Self::open_with(&format!("sqlite://{}", path.display()), max_connections).await
    }

    /// Apply the SQL migrations found in `folder`
    pub async fn migrate(&self, folder: impl AsRef<Path>) -> StoreResult<()> {
        let migrator = Migrator::new(folder.as_ref()).await?;
        migrator.run(&self.writer).await?;

        tracing::info!(
            folder = %folder.as_ref().display(),
            "Migrations applied"
        );
        Ok(())
    }

    /// Round-trip check against the database
    pub async fn ping(&self) -> StoreResult<()> {
        db::verify_connection(&self.pool)
            .await
            .map_err(StoreError::Connection)
    }

    /// Begin a transaction owned by the caller, who must commit or roll it back.
    ///
    /// Unless `options` is read-only, this waits for the writer connection
    /// and holds it until the transaction ends.
    pub async fn begin(&self, options: TxOptions) -> StoreResult<Tx> {
        let pool = if options.read_only {
            &self.pool
        } else {
            &self.writer
        };
        let tx = pool.begin().await?;
        Ok(Tx::new(tx, options))
    }

    pub fn handle(&self) -> Handle<'_> {
        Handle::Store(self)
    }

    /// Read pool, also usable for raw statements
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn writer(&self) -> &SqlitePool {
        &self.writer
    }

    pub async fn close(&self) {
        self.writer.close().await;
        self.pool.close().await;
    }
}

/// Resolve a database file name against the data folder
pub fn resolve_data_file(name: &str, data_folder: &Path) -> PathBuf {
    if name.starts_with('.') || name.starts_with('/') {
        PathBuf::from(name)
    } else {
        data_folder.join(name)
    }
}
