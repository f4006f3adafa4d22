//! Embedded SQLite storage backend for the bi-temporal knowledge graph.
//!
//! Provides the [`Storage`] trait and a SQLite implementation
//! ([`SqliteStore`]).

pub mod envelope;
pub mod error;
pub mod lock;
pub mod sqlite;
pub mod traits;

pub use error::StoreError;
pub use sqlite::SqliteStore;
pub use traits::{Stats, Storage, Transaction};

use arc_model::edge::Edge;
use arc_model::node::Node;
use serde_json::Value;

use crate::error::Result;

impl Storage for SqliteStore {
    fn upsert_node(&self, node: &Node) -> Result<bool> {
        self.upsert_node_impl(node)
    }

    fn upsert_nodes(&self, nodes: &[Node]) -> Result<usize> {
        self.upsert_nodes_impl(nodes)
    }

    fn get_node(&self, id: &str) -> Result<Node> {
        self.get_node_impl(id)
    }

    fn get_nodes_by_type(&self, node_type: &str) -> Result<Vec<Node>> {
        self.get_nodes_by_type_impl(node_type)
    }

    fn get_node_history(&self, id: &str) -> Result<Vec<Node>> {
        self.get_node_history_impl(id)
    }

    fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        self.upsert_edge_impl(edge)
    }

    fn upsert_edges(&self, edges: &[Edge]) -> Result<usize> {
        self.upsert_edges_impl(edges)
    }

    fn get_edges_by_src(&self, src_id: &str, rel: Option<&str>) -> Result<Vec<Edge>> {
        self.get_edges_by_src_impl(src_id, rel)
    }

    fn get_edges_by_dst(&self, dst_id: &str, rel: Option<&str>) -> Result<Vec<Edge>> {
        self.get_edges_by_dst_impl(dst_id, rel)
    }

    fn search_nodes(&self, query: &str, limit: usize) -> Result<Vec<Node>> {
        self.search_nodes_impl(query, limit)
    }

    fn get_watermark(&self, source_name: &str) -> Result<Option<Value>> {
        self.get_watermark_impl(source_name)
    }

    fn set_watermark(&self, source_name: &str, value: &Value) -> Result<()> {
        self.set_watermark_impl(source_name, value)
    }

    fn stats(&self) -> Result<Stats> {
        self.stats_impl()
    }

    fn run_in_transaction(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()> {
        self.run_in_transaction_impl(f)
    }

    fn close(&self) -> Result<()> {
        self.close_impl()
    }
}
