//! [`SqliteStore`] -- SQLite-backed storage implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::envelope;
use crate::error::{Result, StoreError};
use crate::lock::StoreLock;
use crate::sqlite::schema;

/// Tracks the compressed envelope a store was opened from, so `close()`
/// can recompress the scratch file back over it.
struct Envelope {
    temp: NamedTempFile,
    path: PathBuf,
}

/// SQLite-backed implementation of the [`Storage`](crate::traits::Storage)
/// trait.
///
/// Wraps a [`rusqlite::Connection`] in a `Mutex` for thread safety. All
/// public methods acquire the lock, execute SQL, and release it.
pub struct SqliteStore {
    /// The mutex-protected SQLite connection.
    pub(crate) conn: Mutex<Connection>,
    _advisory_lock: Option<StoreLock>,
    envelope: Mutex<Option<Envelope>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at `path`.
    ///
    /// If `path` ends in `.zst`, it is treated as a compressed envelope:
    /// decompressed into a scratch file on open, recompressed back on
    /// [`SqliteStore::close`]. Otherwise `path` is opened directly.
    /// Enables WAL mode and foreign keys, acquires the cross-process
    /// advisory lock, then initializes the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(?path, "opening store");

        let advisory_lock = StoreLock::acquire(path)?;

        let (conn, envelope) = if envelope::is_compressed(path) {
            let temp = envelope::decompress_to_temp(path)?;
            let conn = Connection::open(temp.path())
                .map_err(|e| StoreError::Connection(format!("failed to open {}: {e}", temp.path().display())))?;
            (conn, Some(Envelope { temp, path: path.to_path_buf() }))
        } else {
            let conn = Connection::open(path)
                .map_err(|e| StoreError::Connection(format!("failed to open {}: {e}", path.display())))?;
            (conn, None)
        };

        let store = Self {
            conn: Mutex::new(conn),
            _advisory_lock: Some(advisory_lock),
            envelope: Mutex::new(envelope),
        };
        store.configure_connection()?;
        store.init_schema()?;

        Ok(store)
    }

    /// Opens an in-memory store (useful for tests). No advisory lock and
    /// no compression envelope apply.
    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory store");
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Connection(format!("failed to open in-memory db: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
            _advisory_lock: None,
            envelope: Mutex::new(None),
        };
        store.configure_connection()?;
        store.init_schema()?;

        Ok(store)
    }

    /// Recompresses the scratch file back over the envelope path, if one
    /// was opened. A no-op for plain files and in-memory stores. Safe to
    /// call more than once; subsequent calls are no-ops.
    pub fn close_impl(&self) -> Result<()> {
        let mut guard = self
            .envelope
            .lock()
            .map_err(|e| StoreError::Connection(format!("mutex poisoned: {e}")))?;
        if let Some(env) = guard.take() {
            // Flush any WAL pages to the main file before reading it back.
            let conn = self.lock_conn()?;
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(|e| StoreError::Connection(format!("checkpoint failed: {e}")))?;
            drop(conn);
            envelope::compress_back(env.temp.path(), &env.path)?;
        }
        Ok(())
    }

    /// Sets connection pragmas (WAL mode, foreign keys, busy timeout).
    fn configure_connection(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| StoreError::Connection(format!("mutex poisoned: {e}")))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| StoreError::Connection(format!("failed to set pragmas: {e}")))?;

        Ok(())
    }

    /// Creates all tables and indexes if they do not exist, then runs
    /// migrations.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| StoreError::Connection(format!("mutex poisoned: {e}")))?;

        let version: std::result::Result<i32, _> = conn.query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| {
                let v: String = row.get(0)?;
                Ok(v.parse::<i32>().unwrap_or(0))
            },
        );
        if let Ok(v) = version {
            if v >= schema::CURRENT_SCHEMA_VERSION {
                debug!(version = v, "schema already at current version, skipping init");
                return Ok(());
            }
        }

        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).map_err(|e| StoreError::Migration {
                name: "init_schema".into(),
                reason: format!("{e}\nStatement: {}", truncate(stmt, 120)),
            })?;
        }

        Self::run_migrations_on_conn(&conn)?;

        conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            rusqlite::params![schema::CURRENT_SCHEMA_VERSION.to_string()],
        )
        .map_err(|e| StoreError::Migration {
            name: "schema_version".into(),
            reason: e.to_string(),
        })?;

        info!("schema initialized (version {})", schema::CURRENT_SCHEMA_VERSION);
        Ok(())
    }

    /// Applies pending migrations tracked via the `metadata` table.
    fn run_migrations_on_conn(conn: &Connection) -> Result<()> {
        for &(name, sql) in schema::MIGRATIONS {
            let key = format!("migration:{name}");
            let already_applied: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM metadata WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get::<_, i32>(0),
                )
                .unwrap_or(0)
                > 0;

            if already_applied {
                debug!(name, "migration already applied, skipping");
                continue;
            }

            debug!(name, "applying migration");
            conn.execute_batch(sql).map_err(|e| StoreError::Migration {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

            conn.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
                rusqlite::params![key, "applied"],
            )
            .map_err(|e| StoreError::Migration {
                name: name.to_string(),
                reason: format!("failed to mark migration: {e}"),
            })?;
        }
        Ok(())
    }

    /// Acquires the connection lock. Helper used by all operation modules.
    pub(crate) fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| StoreError::Connection(format!("mutex poisoned: {e}")))
    }

    pub fn stats_impl(&self) -> Result<crate::traits::Stats> {
        let conn = self.lock_conn()?;
        let node_count: i64 = conn.query_row("SELECT COUNT(*) FROM nodes WHERE tx_to IS NULL", [], |r| r.get(0))?;
        let edge_count: i64 = conn.query_row("SELECT COUNT(*) FROM edges WHERE tx_to IS NULL", [], |r| r.get(0))?;

        let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM nodes WHERE tx_to IS NULL GROUP BY type")?;
        let nodes_by_type = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        drop(conn);

        Ok(crate::traits::Stats {
            schema_version: schema::CURRENT_SCHEMA_VERSION,
            node_count,
            edge_count,
            nodes_by_type,
            watermarks: self.all_watermarks_impl()?,
        })
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

/// Truncates a string for error messages.
fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}...", &s[..max])
    } else {
        s.to_string()
    }
}
