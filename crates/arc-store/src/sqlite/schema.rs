//! DDL statements and migrations for the SQLite schema.
//!
//! Timestamps are stored as TEXT in RFC 3339 format (SQLite has no native
//! datetime type). `extra`/`properties` JSON blobs are TEXT.

/// Current schema version. Bumped whenever DDL or migrations change.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Nodes table ----------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS nodes (
        row_id      INTEGER PRIMARY KEY AUTOINCREMENT,
        id          TEXT NOT NULL,
        type        TEXT NOT NULL,
        title       TEXT,
        body        TEXT,
        repo_id     TEXT,
        source      TEXT NOT NULL DEFAULT '',
        extra       TEXT NOT NULL DEFAULT '{}',
        content_hash TEXT NOT NULL DEFAULT '',
        valid_from  TEXT NOT NULL,
        valid_to    TEXT,
        tx_from     TEXT NOT NULL,
        tx_to       TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_nodes_id ON nodes(id)",
    "CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(type)",
    "CREATE INDEX IF NOT EXISTS idx_nodes_valid_from ON nodes(valid_from)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_current ON nodes(id) WHERE tx_to IS NULL",
    // -- Edges table ------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS edges (
        row_id      INTEGER PRIMARY KEY AUTOINCREMENT,
        src_id      TEXT NOT NULL,
        dst_id      TEXT NOT NULL,
        rel         TEXT NOT NULL,
        properties  TEXT NOT NULL DEFAULT '{}',
        source      TEXT NOT NULL DEFAULT '',
        content_hash TEXT NOT NULL DEFAULT '',
        valid_from  TEXT NOT NULL,
        valid_to    TEXT,
        tx_from     TEXT NOT NULL,
        tx_to       TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_edges_src_rel ON edges(src_id, rel)",
    "CREATE INDEX IF NOT EXISTS idx_edges_dst_rel ON edges(dst_id, rel)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_edges_current ON edges(src_id, dst_id, rel) WHERE tx_to IS NULL",
    // -- Full text search over node title/body --------------------------------
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS nodes_fts USING fts5(
        id UNINDEXED,
        title,
        body
    )
    "#,
    // -- Watermarks table -------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS watermarks (
        source_name TEXT PRIMARY KEY,
        value       TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )
    "#,
    // -- Metadata table (schema version, migration log) -----------------------
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Default metadata values inserted on first init.
pub const DEFAULT_CONFIG: &[(&str, &str)] = &[];

/// Schema migrations applied after initial DDL.
///
/// Each migration is a `(name, sql)` pair. Migrations are tracked in the
/// `metadata` table under the key `migration:<name>` so they run at most once.
pub const MIGRATIONS: &[(&str, &str)] = &[
    // Future migrations go here, e.g.:
    // ("001_add_foo_column", "ALTER TABLE nodes ADD COLUMN foo TEXT DEFAULT ''"),
];
