//! Connection handling for the student store.
//!
//! A [`DbHandle`] owns a sqlx pool for SQLite, PostgreSQL or MySQL wrapped in
//! a SeaORM [`DatabaseConnection`]; repositories only see the latter.
//! [`query`] compiles `query-core` descriptors into SeaORM conditions and
//! [`errors`] classifies driver failures.
//!
//! ```rust,no_run
//! # async fn demo() -> db::Result<()> {
//! use db::{ConnectOpts, DbHandle};
//!
//! let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//! let conn = db.sea();
//! # drop(conn);
//! db.close().await
//! # }
//! ```

pub mod errors;
pub mod query;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sea_orm::{
    DatabaseConnection, SqlxMySqlConnector, SqlxPostgresConnector, SqlxSqliteConnector,
};
use sqlx::pool::PoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use thiserror::Error;

pub use errors::{is_unique_violation, is_unique_violation_code};

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// Carries the redacted DSN.
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    MySql,
    Sqlite,
}

impl DbEngine {
    /// Scheme-based detection; nothing after the scheme is inspected.
    fn from_dsn(dsn: &str) -> Option<Self> {
        let dsn = dsn.trim_start();
        [
            ("postgres://", Self::Postgres),
            ("postgresql://", Self::Postgres),
            ("mysql://", Self::MySql),
            ("sqlite:", Self::Sqlite),
        ]
        .into_iter()
        .find_map(|(scheme, engine)| dsn.starts_with(scheme).then_some(engine))
    }
}

/// Pool settings. Unset values keep the sqlx defaults.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    /// SQLite only: how long a writer waits on a locked database file.
    pub sqlite_busy_timeout: Option<Duration>,
    /// SQLite only: create missing parent directories of the database file.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            acquire_timeout: Some(Duration::from_secs(30)),
            sqlite_busy_timeout: Some(Duration::from_secs(5)),
            create_sqlite_dirs: true,
        }
    }
}

impl ConnectOpts {
    fn pool<DB: sqlx::Database>(&self) -> PoolOptions<DB> {
        let mut pool = PoolOptions::<DB>::new();
        if let Some(max) = self.max_conns {
            pool = pool.max_connections(max);
        }
        if let Some(timeout) = self.acquire_timeout {
            pool = pool.acquire_timeout(timeout);
        }
        pool
    }
}

pub struct DbHandle {
    engine: DbEngine,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        DbEngine::from_dsn(dsn)
            .ok_or_else(|| DbError::UnknownDsn(redact_credentials_in_dsn(Some(dsn))))
    }

    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let dsn = dsn.trim();
        let engine = Self::detect(dsn)?;
        tracing::info!(
            engine = ?engine,
            dsn = %redact_credentials_in_dsn(Some(dsn)),
            "connecting to database"
        );

        let sea = match engine {
            DbEngine::Postgres => SqlxPostgresConnector::from_sqlx_postgres_pool(
                opts.pool().connect(dsn).await?,
            ),
            DbEngine::MySql => {
                SqlxMySqlConnector::from_sqlx_mysql_pool(opts.pool().connect(dsn).await?)
            }
            DbEngine::Sqlite => connect_sqlite(dsn, &opts).await?,
        };

        Ok(Self {
            engine,
            dsn: dsn.to_owned(),
            sea,
        })
    }

    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    pub fn redacted_dsn(&self) -> String {
        redact_credentials_in_dsn(Some(&self.dsn))
    }

    /// Cloning shares the pool.
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    pub async fn close(self) -> Result<()> {
        tracing::debug!(engine = ?self.engine, "closing database pool");
        Ok(self.sea.close().await?)
    }
}

async fn connect_sqlite(dsn: &str, opts: &ConnectOpts) -> Result<DatabaseConnection> {
    let in_memory = is_sqlite_memory(dsn);
    if opts.create_sqlite_dirs && !in_memory {
        create_sqlite_parent(dsn)?;
    }

    let mut conn = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);
    if let Some(busy) = opts.sqlite_busy_timeout {
        conn = conn.busy_timeout(busy);
    }

    let mut pool = opts.pool::<sqlx::Sqlite>();
    if in_memory {
        // Each `:memory:` connection is its own database; keep exactly one alive forever.
        pool = pool
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    } else {
        conn = conn
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool = pool.connect_with(conn).await?;
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

fn is_sqlite_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

fn create_sqlite_parent(dsn: &str) -> Result<()> {
    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);
    let file = rest.split_once('?').map_or(rest, |(path, _)| path);

    // `sqlite:file:...` URIs are left to the driver.
    if file.is_empty() || file.starts_with("file:") {
        return Ok(());
    }
    match Path::new(file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(std::fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

/// Replace the DSN password with `***`; unparsable DSNs with credentials are hidden entirely.
pub fn redact_credentials_in_dsn(dsn: Option<&str>) -> String {
    let Some(dsn) = dsn else {
        return "none".to_owned();
    };
    if !dsn.contains('@') {
        return dsn.to_owned();
    }
    match url::Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "***".to_owned(),
    }
}
