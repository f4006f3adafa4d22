//! Node CRUD and close-and-reinsert upsert logic for [`SqliteStore`].

use std::collections::BTreeMap;

use arc_model::content_hash::node_content_hash;
use arc_model::enums::NodeType;
use arc_model::node::Node;
use arc_model::temporal::Bitemporal;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::{Result, StoreError};
use crate::sqlite::store::SqliteStore;

/// Columns selected by every node read, in a stable order matched by
/// [`scan_node`].
pub(crate) const NODE_COLUMNS: &str =
    "id, type, title, body, repo_id, source, extra, content_hash, valid_from, valid_to, tx_from, tx_to";

pub(crate) fn scan_node(row: &Row) -> rusqlite::Result<Node> {
    let extra_json: String = row.get("extra")?;
    let extra: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&extra_json).unwrap_or_default();

    Ok(Node {
        id: row.get("id")?,
        node_type: NodeType::from(row.get::<_, String>("type")?),
        title: row.get("title")?,
        body: row.get("body")?,
        repo_id: row.get("repo_id")?,
        source: row.get("source")?,
        extra,
        temporal: Bitemporal {
            valid_from: parse_datetime(&row.get::<_, String>("valid_from")?),
            valid_to: row.get::<_, Option<String>>("valid_to")?.map(|s| parse_datetime(&s)),
            tx_from: parse_datetime(&row.get::<_, String>("tx_from")?),
            tx_to: row.get::<_, Option<String>>("tx_to")?.map(|s| parse_datetime(&s)),
        },
    })
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Inserts or updates a node, applying close-and-reinsert discipline.
///
/// If no current row exists for `node.id`, inserts one. If a current row
/// exists with the same content hash, this is a no-op (idempotent
/// re-ingest). If the content differs, the current row is closed at
/// `tx_time` and a new current row is inserted open from `tx_time`.
/// Returns `true` if the store changed (insert or update), `false` if the
/// re-ingest was a no-op.
pub(crate) fn upsert_node_on_conn(conn: &Connection, node: &Node, tx_time: DateTime<Utc>) -> Result<bool> {
    let new_hash = node_content_hash(node);

    let current: Option<String> = conn
        .query_row(
            "SELECT content_hash FROM nodes WHERE id = ?1 AND tx_to IS NULL",
            params![node.id],
            |row| row.get(0),
        )
        .ok();

    if let Some(existing_hash) = current {
        if existing_hash == new_hash {
            return Ok(false);
        }
        conn.execute(
            "UPDATE nodes SET tx_to = ?1 WHERE id = ?2 AND tx_to IS NULL",
            params![format_datetime(&tx_time), node.id],
        )?;
    }

    insert_node_row(conn, node, &new_hash, tx_time)?;
    sync_fts(conn, node)?;
    Ok(true)
}

fn insert_node_row(conn: &Connection, node: &Node, content_hash: &str, tx_time: DateTime<Utc>) -> Result<()> {
    if !node.temporal.valid_range_ok() {
        return Err(StoreError::validation(format!(
            "node {} has valid_from > valid_to",
            node.id
        )));
    }
    conn.execute(
        "INSERT INTO nodes (id, type, title, body, repo_id, source, extra, content_hash, valid_from, valid_to, tx_from, tx_to)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL)",
        params![
            node.id,
            node.node_type.as_str(),
            node.title,
            node.body,
            node.repo_id,
            node.source,
            serde_json::to_string(&node.extra)?,
            content_hash,
            format_datetime(&node.temporal.valid_from),
            node.temporal.valid_to.as_ref().map(format_datetime),
            format_datetime(&tx_time),
        ],
    )?;
    Ok(())
}

fn sync_fts(conn: &Connection, node: &Node) -> Result<()> {
    conn.execute("DELETE FROM nodes_fts WHERE id = ?1", params![node.id])?;
    conn.execute(
        "INSERT INTO nodes_fts (id, title, body) VALUES (?1, ?2, ?3)",
        params![node.id, node.title.as_deref().unwrap_or(""), node.body.as_deref().unwrap_or("")],
    )?;
    Ok(())
}

/// Returns the current row for `id`, or `NotFound`.
pub(crate) fn get_current_node_on_conn(conn: &Connection, id: &str) -> Result<Node> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1 AND tx_to IS NULL");
    conn.query_row(&sql, params![id], scan_node)
        .map_err(|_| StoreError::not_found("node", id))
}

/// Returns all current nodes of the given type.
pub(crate) fn get_nodes_by_type_on_conn(conn: &Connection, node_type: &str) -> Result<Vec<Node>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE type = ?1 AND tx_to IS NULL");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![node_type], scan_node)?;
    rows.map(|r| r.map_err(StoreError::from)).collect()
}

/// Returns every historical row for `id`, oldest first. Used by the
/// trace engine's history views.
pub(crate) fn get_node_history_on_conn(conn: &Connection, id: &str) -> Result<Vec<Node>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1 ORDER BY tx_from ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id], scan_node)?;
    rows.map(|r| r.map_err(StoreError::from)).collect()
}

impl SqliteStore {
    pub fn upsert_node_impl(&self, node: &Node) -> Result<bool> {
        let conn = self.lock_conn()?;
        upsert_node_on_conn(&conn, node, Utc::now())
    }

    pub fn upsert_nodes_impl(&self, nodes: &[Node]) -> Result<usize> {
        let conn = self.lock_conn()?;
        let now = Utc::now();
        let mut changed = 0;
        for node in nodes {
            if upsert_node_on_conn(&conn, node, now)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn get_node_impl(&self, id: &str) -> Result<Node> {
        let conn = self.lock_conn()?;
        get_current_node_on_conn(&conn, id)
    }

    pub fn get_nodes_by_type_impl(&self, node_type: &str) -> Result<Vec<Node>> {
        let conn = self.lock_conn()?;
        get_nodes_by_type_on_conn(&conn, node_type)
    }

    pub fn get_node_history_impl(&self, id: &str) -> Result<Vec<Node>> {
        let conn = self.lock_conn()?;
        get_node_history_on_conn(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;
    use arc_model::node::NodeBuilder;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn insert_then_get_current() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let node = NodeBuilder::new("commit:a", NodeType::Commit, "vcs")
            .title("Fix bug")
            .build(ts(1), ts(1));
        assert!(upsert_node_on_conn(&conn, &node, ts(1)).unwrap());

        let fetched = get_current_node_on_conn(&conn, "commit:a").unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Fix bug"));
        assert!(fetched.is_current());
    }

    #[test]
    fn reingest_identical_content_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let node = NodeBuilder::new("commit:a", NodeType::Commit, "vcs")
            .title("Fix bug")
            .build(ts(1), ts(1));
        assert!(upsert_node_on_conn(&conn, &node, ts(1)).unwrap());
        assert!(!upsert_node_on_conn(&conn, &node, ts(2)).unwrap());

        let history = get_node_history_on_conn(&conn, "commit:a").unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn changed_content_closes_and_reinserts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let v1 = NodeBuilder::new("issue:X", NodeType::Issue, "remote")
            .title("Open")
            .build(ts(1), ts(1));
        upsert_node_on_conn(&conn, &v1, ts(1)).unwrap();

        let v2 = NodeBuilder::new("issue:X", NodeType::Issue, "remote")
            .title("Closed")
            .build(ts(5), ts(5));
        assert!(upsert_node_on_conn(&conn, &v2, ts(5)).unwrap());

        let history = get_node_history_on_conn(&conn, "issue:X").unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].is_current());
        assert_eq!(history[0].temporal.tx_to, Some(ts(5)));
        assert!(history[1].is_current());

        let current = get_current_node_on_conn(&conn, "issue:X").unwrap();
        assert_eq!(current.title.as_deref(), Some("Closed"));
    }
}
