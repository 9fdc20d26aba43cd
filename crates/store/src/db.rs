//! Database connection and pool management.

use exn::ResultExt;
use okane_config::{DatabaseConfig, Location};
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Database connection pool for expense records.
///
/// This is the main entry point for interacting with the database. It owns the
/// SQLite connection pool, creates the schema on first connect, and hands the
/// pool to [`Repository`](crate::Repository) instances.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, pool_options: SqlitePoolOptions) -> Result<Self> {
        let pool = pool_options
            // Applies the query-based PRAGMAs to every pooled connection,
            // not only the first one handed out.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect to the database file at the given path.
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_file(path.as_ref(), MAX_CONNECTIONS, BUSY_TIMEOUT).await
    }

    /// Connect to a private in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    #[instrument]
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options(BUSY_TIMEOUT).filename(":memory:");
        // Every connection to ":memory:" is a separate database, so the pool
        // is pinned to exactly one connection that is never reaped.
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::new(options, pool_options).await
    }

    /// Connect according to loaded configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if config.max_connections == 0 {
            exn::bail!(ErrorKind::Config);
        }
        match config.location() {
            Location::Memory => Self::connect_in_memory().await,
            // An empty filename gives every pooled connection its own temporary database.
            Location::File(path) if path.as_os_str().is_empty() => exn::bail!(ErrorKind::Config),
            Location::File(path) => {
                let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
                Self::connect_file(path, config.max_connections, busy_timeout).await
            },
        }
    }

    async fn connect_file(path: &Path, max: u32, busy_timeout: Duration) -> Result<Self> {
        let options = Self::base_options(busy_timeout).filename(path).create_if_missing(true);
        Self::new(options, SqlitePoolOptions::new().max_connections(max)).await
    }

    /// Base connection options shared between file and in-memory databases.
    fn base_options(busy_timeout: Duration) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // WAL lets multi-statement reads run against a stable snapshot
            // while a writer is active.
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // Every relationship in the schema relies on this.
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout)
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA cache_size = -4096;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Run database migrations.
    ///
    /// This is called automatically on connect; already applied migrations
    /// are skipped, so an existing database keeps its data.
    #[instrument("performing database migrations", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns `true` once [`close`](Self::close) has been called on this
    /// handle or any of its clones.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the database connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. Any clone of this handle (and any repository built from
    /// it) fails with [`ErrorKind::Closed`] afterwards. Closing twice is
    /// harmless.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        // Let SQLite update query planner statistics
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }

    /// Run `f` against this database and close it afterwards, whether `f`
    /// succeeded or not.
    ///
    /// If `f` panics the pool is dropped during unwinding, which releases the
    /// connections as well.
    pub async fn scoped<T, F>(self, f: F) -> Result<T>
    where
        F: AsyncFnOnce(&Database) -> Result<T>,
    {
        let result = f(&self).await;
        self.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repository;
    use okane_model::Expense;
    use time::macros::date;

    fn expense() -> Expense {
        Expense::new(date!(2024-01-09).midnight().as_utc(), 1.0, "Susureti")
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(!db.is_closed());
        db.close().await;
        assert!(db.is_closed());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        // Running migrate again should succeed (already applied)
        db.migrate().await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_pragmas_are_applied() {
        let db = Database::connect_in_memory().await.unwrap();
        // Verify a PRAGMA set by SqliteConnectOptions
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 1, "foreign_keys should be ON");
        // Verify a PRAGMA set by after_connect().
        let row: (i64,) = sqlx::query_as("PRAGMA cache_size").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, -4096, "cache size should be 4MiB");
        db.close().await;
    }

    #[tokio::test]
    async fn test_schema_is_created() {
        let db = Database::connect_in_memory().await.unwrap();
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT IN ('_sqlx_migrations', 'sqlite_sequence') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, ["expense_part_tags", "expense_parts", "expenses", "tags"]);
        db.close().await;
    }

    #[tokio::test]
    async fn test_close_twice() {
        let db = Database::connect_in_memory().await.unwrap();
        db.close().await;
        db.close().await;
        assert!(db.is_closed());
    }

    #[tokio::test]
    async fn test_file_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("okane.sqlite3");
        let db = Database::connect(&path).await.unwrap();
        Repository::from(&db).insert_expense(&expense()).await.unwrap();
        db.close().await;

        let db = Database::connect(&path).await.unwrap();
        let expenses = Repository::from(&db).get_expenses().await.unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].shop_name, "Susureti");
        db.close().await;
    }

    #[tokio::test]
    async fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::file(dir.path().join("configured.sqlite3"));
        let db = Database::from_config(&config).await.unwrap();
        assert!(dir.path().join("configured.sqlite3").exists());
        db.close().await;

        let db = Database::from_config(&DatabaseConfig::in_memory()).await.unwrap();
        assert!(Repository::from(&db).get_expenses().await.unwrap().is_empty());
        db.close().await;
    }

    #[tokio::test]
    async fn test_from_config_rejects_zero_connections() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::in_memory()
        };
        let err = Database::from_config(&config).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config));
    }

    #[tokio::test]
    async fn test_from_config_rejects_empty_path() {
        let err = Database::from_config(&DatabaseConfig::file("")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config));
    }

    #[tokio::test]
    async fn test_scoped_closes_on_success() {
        let db = Database::connect_in_memory().await.unwrap();
        let pool = db.pool().clone();
        let id = db
            .scoped(async |db| Repository::from(db).insert_expense(&expense()).await)
            .await
            .unwrap();
        assert_eq!(id.0, 1);
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_scoped_closes_on_error() {
        let db = Database::connect_in_memory().await.unwrap();
        let pool = db.pool().clone();
        let result = db
            .scoped(async |db| {
                let repo = Repository::from(db);
                repo.insert_expense(&expense().with_id(okane_model::ExpenseId(1))).await?;
                // Same id again: rejected, and the error must still close the pool.
                repo.insert_expense(&expense().with_id(okane_model::ExpenseId(1))).await
            })
            .await;
        assert!(result.unwrap_err().is_constraint());
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        db.close().await;
        let err = repo.get_expenses().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Closed));
    }
}
