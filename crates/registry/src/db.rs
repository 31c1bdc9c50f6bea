//! Database connection and pool management.

use std::str::FromStr;
use std::time::Duration;

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
const MAX_CONNECTIONS: u32 = 5;
// Concurrent requesters serialize their writes at the database; give a
// losing writer long enough to wait its turn instead of failing with SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const IN_MEMORY_URI: &str = "sqlite::memory:";

/// Database connection pool for the registry.
///
/// This is the main entry point for interacting with the registry database.
/// It manages the SQLite connection pool and provides access to the
/// [`Repository`](crate::Repository).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let mut pool_options = SqlitePoolOptions::new()
            // Apply the query-based PRAGMAs to EVERY connection of the pool,
            // not only to the first one.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS));
        if max == Some(1) {
            // The single connection *is* the in-memory database; never recycle it.
            pool_options = pool_options.idle_timeout(None::<Duration>).max_lifetime(None::<Duration>);
        }
        let pool = pool_options.connect_with(options).await.or_raise(|| ErrorKind::Connect)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect to the registry database at the given `sqlite:` URI.
    ///
    /// Runs migrations. Use `?mode=rwc` in the URI to create the database file
    /// if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Connect`] if the URI is malformed or the database
    /// cannot be opened, and [`ErrorKind::Migration`] if migrations fail.
    #[instrument(skip_all, fields(uri = %uri))]
    pub async fn connect(uri: &str) -> Result<Self> {
        if Self::is_in_memory(uri) {
            return Self::connect_in_memory().await;
        }
        let options = SqliteConnectOptions::from_str(uri).or_raise(|| ErrorKind::Connect)?;
        Self::new(Self::base_options(options), None).await
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str(IN_MEMORY_URI).or_raise(|| ErrorKind::Connect)?;
        // Parallel connections to `:memory:` would each see a different,
        // empty database.
        Self::new(Self::base_options(options), Some(1)).await
    }

    fn is_in_memory(uri: &str) -> bool {
        uri.contains(":memory:") || uri.contains("mode=memory")
    }

    /// Connection options shared between file and in-memory databases.
    fn base_options(options: SqliteConnectOptions) -> SqliteConnectOptions {
        options
            // WAL lets readers proceed while a requester is writing
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA locking_mode = NORMAL;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("performing database migrations", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. Queries issued afterwards fail with [`ErrorKind::Connect`].
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
