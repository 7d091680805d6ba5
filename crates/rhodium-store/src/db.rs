use crate::{StoreResult, io_error, schema};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

/// A pooled connection. Returned to the pool when dropped, on success or failure.
pub type Session = PooledConnection<SqliteConnectionManager>;

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// How long a connection waits on SQLite's lock before giving up.
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            pool_size: 10,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle to the installation database: a connection pool over one SQLite file.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("state", &self.pool.state())
            .finish()
    }
}

impl Database {
    /// Open (creating if needed) the database file and make sure the schema exists.
    ///
    /// The file is switched to WAL mode once, through a dedicated connection, before the
    /// pool opens any connections of its own.
    pub fn open(path: impl AsRef<Path>, options: &DatabaseOptions) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let setup = Connection::open(&path)?;
        setup.busy_timeout(options.busy_timeout)?;
        setup.execute_batch("PRAGMA journal_mode = WAL;")?;
        schema::create(&setup)?;
        drop(setup);

        let busy_timeout = options.busy_timeout;
        let manager = SqliteConnectionManager::file(&path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")
        });
        let pool = Pool::builder().max_size(options.pool_size).build(manager)?;
        debug!(path = %path.display(), pool_size = options.pool_size, "database opened");
        Ok(Self { pool, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check out a session for the duration of one request.
    pub fn session(&self) -> StoreResult<Session> {
        Ok(self.pool.get()?)
    }

    /// Round-trip a trivial query to prove the database is reachable.
    pub fn health(&self) -> StoreResult<()> {
        let conn = self.session()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
