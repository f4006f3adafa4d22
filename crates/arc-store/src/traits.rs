//! Storage and Transaction traits -- the public API for graph persistence.
//!
//! Consumers depend on these traits rather than on concrete implementations
//! so that alternative backends (mocks, proxies) can be substituted.

use arc_model::edge::Edge;
use arc_model::node::Node;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;

/// Aggregate counts and health info reported by `stats()`. Backs the
/// Query Facade's `doctor`-shaped health operation.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub schema_version: i32,
    pub node_count: i64,
    pub edge_count: i64,
    /// Breakdown of current node counts by type: `(type_name, count)`.
    pub nodes_by_type: Vec<(String, i64)>,
    /// `(source_name, watermark_json)` for every source that has ever run.
    pub watermarks: Vec<(String, Value)>,
}

/// Primary storage interface for graph persistence.
pub trait Storage: Send + Sync {
    // -- Node operations -------------------------------------------------

    /// Upserts a node, applying close-and-reinsert discipline. Returns
    /// `true` if the store changed.
    fn upsert_node(&self, node: &Node) -> Result<bool>;

    /// Upserts a batch of nodes, sharing one transaction timestamp.
    /// Returns the number that actually changed the store.
    fn upsert_nodes(&self, nodes: &[Node]) -> Result<usize>;

    /// Retrieves the current row for a node id.
    fn get_node(&self, id: &str) -> Result<Node>;

    /// Retrieves all current nodes of the given type.
    fn get_nodes_by_type(&self, node_type: &str) -> Result<Vec<Node>>;

    /// Retrieves every historical row for a node id, oldest first.
    fn get_node_history(&self, id: &str) -> Result<Vec<Node>>;

    // -- Edge operations -------------------------------------------------

    /// Upserts an edge, applying close-and-reinsert discipline. Returns
    /// `true` if the store changed.
    fn upsert_edge(&self, edge: &Edge) -> Result<bool>;

    /// Upserts a batch of edges, sharing one transaction timestamp.
    /// Returns the number that actually changed the store.
    fn upsert_edges(&self, edges: &[Edge]) -> Result<usize>;

    /// Retrieves current outgoing edges from `src_id`, optionally
    /// filtered by relation string.
    fn get_edges_by_src(&self, src_id: &str, rel: Option<&str>) -> Result<Vec<Edge>>;

    /// Retrieves current incoming edges into `dst_id`, optionally
    /// filtered by relation string.
    fn get_edges_by_dst(&self, dst_id: &str, rel: Option<&str>) -> Result<Vec<Edge>>;

    // -- Search ------------------------------------------------------------

    /// Full-text search over current node title/body, best match first.
    fn search_nodes(&self, query: &str, limit: usize) -> Result<Vec<Node>>;

    // -- Watermarks ----------------------------------------------------------

    /// Reads the opaque watermark last recorded for `source_name`.
    fn get_watermark(&self, source_name: &str) -> Result<Option<Value>>;

    /// Writes a new watermark for `source_name`.
    fn set_watermark(&self, source_name: &str, value: &Value) -> Result<()>;

    // -- Health --------------------------------------------------------------

    /// Returns aggregate node/edge counts, schema version, and watermark
    /// state.
    fn stats(&self) -> Result<Stats>;

    // -- Transactions --------------------------------------------------------

    /// Executes a closure within a database transaction.
    ///
    /// If the closure returns `Ok`, the transaction is committed.
    /// If it returns `Err` or panics, the transaction is rolled back.
    fn run_in_transaction(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()>;

    // -- Lifecycle -----------------------------------------------------------

    /// Closes the store, recompressing the envelope if one was opened.
    fn close(&self) -> Result<()>;
}

/// Subset of [`Storage`] available inside a transaction. All rows
/// written through the same [`Transaction`] share one caller-supplied
/// `tx_time`, so a multi-ingestor build can attribute every row from a
/// single commit to the same transaction timestamp.
pub trait Transaction {
    fn upsert_node(&self, node: &Node, tx_time: DateTime<Utc>) -> Result<bool>;
    fn upsert_edge(&self, edge: &Edge, tx_time: DateTime<Utc>) -> Result<bool>;
    fn get_watermark(&self, source_name: &str) -> Result<Option<Value>>;
    fn set_watermark(&self, source_name: &str, value: &Value) -> Result<()>;
}
