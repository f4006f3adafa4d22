//! Per-source incremental-ingest watermarks.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::sqlite::nodes::format_datetime;
use crate::sqlite::store::SqliteStore;

/// Returns the opaque watermark JSON last recorded for `source_name`, or
/// `None` if the source has never run.
pub(crate) fn get_watermark_on_conn(conn: &Connection, source_name: &str) -> Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM watermarks WHERE source_name = ?1",
            params![source_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
}

/// Writes a new watermark for `source_name`, overwriting any prior value.
/// Called by the build orchestrator in the same transaction as the
/// ingestor's node/edge writes.
pub(crate) fn set_watermark_on_conn(conn: &Connection, source_name: &str, value: &serde_json::Value) -> Result<()> {
    conn.execute(
        "INSERT INTO watermarks (source_name, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(source_name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![source_name, serde_json::to_string(value)?, format_datetime(&Utc::now())],
    )?;
    Ok(())
}

impl SqliteStore {
    pub fn get_watermark_impl(&self, source_name: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.lock_conn()?;
        get_watermark_on_conn(&conn, source_name)
    }

    pub fn set_watermark_impl(&self, source_name: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.lock_conn()?;
        set_watermark_on_conn(&conn, source_name, value)
    }

    /// Returns every `(source_name, watermark)` pair ever recorded, used
    /// by `stats()`.
    pub(crate) fn all_watermarks_impl(&self) -> Result<Vec<(String, serde_json::Value)>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT source_name, value FROM watermarks")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (name, raw) = row?;
            out.push((name, serde_json::from_str(&raw)?));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;
    use serde_json::json;

    #[test]
    fn absent_watermark_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        assert_eq!(get_watermark_on_conn(&conn, "vcs").unwrap(), None);
    }

    #[test]
    fn set_then_get_roundtrips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let wm = json!({"last_sha": "abc123"});
        set_watermark_on_conn(&conn, "vcs", &wm).unwrap();
        assert_eq!(get_watermark_on_conn(&conn, "vcs").unwrap(), Some(wm));
    }

    #[test]
    fn set_overwrites_prior_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        set_watermark_on_conn(&conn, "vcs", &json!({"last_sha": "aaa"})).unwrap();
        set_watermark_on_conn(&conn, "vcs", &json!({"last_sha": "bbb"})).unwrap();
        assert_eq!(
            get_watermark_on_conn(&conn, "vcs").unwrap(),
            Some(json!({"last_sha": "bbb"}))
        );
    }
}
