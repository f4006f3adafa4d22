//! Full-text search over node title/body via the `nodes_fts` table.

use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};
use crate::sqlite::nodes::get_current_node_on_conn;
use crate::sqlite::store::SqliteStore;
use arc_model::node::Node;

/// Runs an FTS5 match query and returns the matching current nodes,
/// best match first. Non-current (closed) nodes are filtered out even
/// if their historical title/body still matches, since `nodes_fts` is
/// only ever written for the current row (see `nodes::sync_fts`).
pub(crate) fn search_nodes_on_conn(conn: &Connection, query: &str, limit: usize) -> Result<Vec<Node>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM nodes_fts WHERE nodes_fts MATCH ?1 ORDER BY rank LIMIT ?2",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![query, limit as i64], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut nodes = Vec::with_capacity(ids.len());
    for id in ids {
        match get_current_node_on_conn(conn, &id) {
            Ok(node) => nodes.push(node),
            Err(StoreError::NotFound { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(nodes)
}

impl SqliteStore {
    pub fn search_nodes_impl(&self, query: &str, limit: usize) -> Result<Vec<Node>> {
        let conn = self.lock_conn()?;
        search_nodes_on_conn(&conn, query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::nodes::upsert_node_on_conn;
    use arc_model::enums::NodeType;
    use arc_model::node::NodeBuilder;
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn search_finds_title_match() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let node = NodeBuilder::new("adr:use-sqlite", NodeType::Adr, "adr")
            .title("Use SQLite for storage")
            .body("We chose SQLite because it is embeddable.")
            .build(ts(1), ts(1));
        upsert_node_on_conn(&conn, &node, ts(1)).unwrap();

        let results = search_nodes_on_conn(&conn, "SQLite", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "adr:use-sqlite");
    }

    #[test]
    fn search_respects_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        for i in 0..5 {
            let node = NodeBuilder::new(format!("adr:item-{i}"), NodeType::Adr, "adr")
                .title("Authentication decision")
                .build(ts(i), ts(i));
            upsert_node_on_conn(&conn, &node, ts(i)).unwrap();
        }
        let results = search_nodes_on_conn(&conn, "Authentication", 2).unwrap();
        assert_eq!(results.len(), 2);
    }
}
