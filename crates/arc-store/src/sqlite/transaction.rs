//! Transaction wrapper for [`SqliteStore`].

use arc_model::edge::Edge;
use arc_model::node::Node;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::sqlite::edges;
use crate::sqlite::nodes;
use crate::sqlite::store::SqliteStore;
use crate::sqlite::watermarks;
use crate::traits::Transaction;

/// A thin wrapper around a SQLite connection that is inside a
/// transaction. Implements [`Transaction`] by delegating to the same
/// connection-level helpers used by [`SqliteStore`].
pub(crate) struct SqliteTx<'a> {
    pub(crate) conn: &'a Connection,
}

impl Transaction for SqliteTx<'_> {
    fn upsert_node(&self, node: &Node, tx_time: DateTime<Utc>) -> Result<bool> {
        nodes::upsert_node_on_conn(self.conn, node, tx_time)
    }

    fn upsert_edge(&self, edge: &Edge, tx_time: DateTime<Utc>) -> Result<bool> {
        edges::upsert_edge_on_conn(self.conn, edge, tx_time)
    }

    fn get_watermark(&self, source_name: &str) -> Result<Option<Value>> {
        watermarks::get_watermark_on_conn(self.conn, source_name)
    }

    fn set_watermark(&self, source_name: &str, value: &Value) -> Result<()> {
        watermarks::set_watermark_on_conn(self.conn, source_name, value)
    }
}

impl SqliteStore {
    /// Runs a closure inside a database transaction.
    pub fn run_in_transaction_impl(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StoreError::Transaction(format!("failed to begin: {e}")))?;

        let sqlite_tx = SqliteTx { conn: &tx };
        match f(&sqlite_tx) {
            Ok(()) => {
                tx.commit().map_err(|e| StoreError::Transaction(format!("failed to commit: {e}")))?;
                Ok(())
            }
            Err(e) => {
                // Transaction is rolled back on drop.
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_model::edge::EdgeBuilder;
    use arc_model::enums::{EdgeRel, NodeType};
    use arc_model::node::NodeBuilder;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn transaction_commit() {
        let store = test_store();
        store
            .run_in_transaction_impl(&|tx| {
                let node = NodeBuilder::new("commit:a", NodeType::Commit, "vcs").build(ts(1), ts(1));
                tx.upsert_node(&node, ts(1))?;
                tx.set_watermark("vcs", &json!({"last_sha": "a"}))?;
                Ok(())
            })
            .unwrap();

        let conn = store.lock_conn().unwrap();
        assert!(nodes::get_current_node_on_conn(&conn, "commit:a").is_ok());
        assert_eq!(
            watermarks::get_watermark_on_conn(&conn, "vcs").unwrap(),
            Some(json!({"last_sha": "a"}))
        );
    }

    #[test]
    fn transaction_rollback_on_error() {
        let store = test_store();
        let result = store.run_in_transaction_impl(&|tx| {
            let node = NodeBuilder::new("commit:rb", NodeType::Commit, "vcs").build(ts(1), ts(1));
            tx.upsert_node(&node, ts(1))?;
            Err(StoreError::Internal("forced rollback".into()))
        });
        assert!(result.is_err());

        let conn = store.lock_conn().unwrap();
        assert!(nodes::get_current_node_on_conn(&conn, "commit:rb").is_err());
    }

    #[test]
    fn transaction_with_edges_shares_tx_time() {
        let store = test_store();
        store
            .run_in_transaction_impl(&|tx| {
                let commit = NodeBuilder::new("commit:a", NodeType::Commit, "vcs").build(ts(1), ts(1));
                let file = NodeBuilder::new("file:x.rs", NodeType::File, "vcs").build(ts(1), ts(1));
                tx.upsert_node(&commit, ts(1))?;
                tx.upsert_node(&file, ts(1))?;
                let edge = EdgeBuilder::new("commit:a", "file:x.rs", EdgeRel::Modifies, "vcs").build(ts(1), ts(1));
                tx.upsert_edge(&edge, ts(1))?;
                Ok(())
            })
            .unwrap();

        let conn = store.lock_conn().unwrap();
        let out = edges::get_edges_by_src_on_conn(&conn, "commit:a", None).unwrap();
        assert_eq!(out.len(), 1);
    }
}
