//! Deterministic content hashing for nodes and edges.
//!
//! Produces a SHA-256 hex digest over all substantive fields (excluding
//! id, source, and temporal fields) so that identical content produces
//! identical hashes regardless of when or by which ingestor it was
//! last written. The store's upsert path uses this to tell an
//! unchanged re-ingest (skip) apart from a real change (close and
//! reinsert).

use sha2::{Digest, Sha256};

use crate::edge::Edge;
use crate::node::Node;

/// Separator byte written between fields.
const SEP: u8 = 0;

/// Computes a deterministic content hash for a node.
///
/// Excludes `id` (identity, not content), `source` (attribution, not
/// content), and all bi-temporal fields (versioning metadata).
pub fn node_content_hash(node: &Node) -> String {
    let mut h = Sha256::new();
    write_str(&mut h, node.node_type.as_str());
    write_str_opt(&mut h, node.title.as_deref());
    write_str_opt(&mut h, node.body.as_deref());
    write_str_opt(&mut h, node.repo_id.as_deref());
    for (k, v) in &node.extra {
        write_str(&mut h, k);
        write_str(&mut h, &v.to_string());
    }
    format!("{:x}", h.finalize())
}

/// Computes a deterministic content hash for an edge.
///
/// Excludes `source` and all bi-temporal fields; `src_id`/`dst_id`/`rel`
/// are included since they define what the edge *is*, not just its
/// identity (an edge has no separate content beyond its endpoints,
/// relation, and properties).
pub fn edge_content_hash(edge: &Edge) -> String {
    let mut h = Sha256::new();
    write_str(&mut h, &edge.src_id);
    write_str(&mut h, &edge.dst_id);
    write_str(&mut h, edge.rel.as_str());
    for (k, v) in &edge.properties {
        write_str(&mut h, k);
        write_str(&mut h, &v.to_string());
    }
    format!("{:x}", h.finalize())
}

// -- helper writers --------------------------------------------------------

fn write_str(h: &mut Sha256, s: &str) {
    h.update(s.as_bytes());
    h.update([SEP]);
}

fn write_str_opt(h: &mut Sha256, s: Option<&str>) {
    if let Some(s) = s {
        h.update(s.as_bytes());
    }
    h.update([SEP]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeBuilder;
    use crate::enums::{EdgeRel, NodeType};
    use crate::node::NodeBuilder;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn ts(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn node_hash_deterministic() {
        let node = NodeBuilder::new("commit:a", NodeType::Commit, "vcs")
            .title("Fix bug")
            .build(ts(1), ts(1));
        assert_eq!(node_content_hash(&node), node_content_hash(&node));
        assert_eq!(node_content_hash(&node).len(), 64);
    }

    #[test]
    fn node_hash_ignores_id_source_and_time() {
        let a = NodeBuilder::new("commit:a", NodeType::Commit, "vcs")
            .title("Same")
            .build(ts(1), ts(1));
        let b = NodeBuilder::new("commit:b", NodeType::Commit, "other-source")
            .title("Same")
            .build(ts(999), ts(999));
        assert_eq!(node_content_hash(&a), node_content_hash(&b));
    }

    #[test]
    fn node_hash_differs_on_title_change() {
        let a = NodeBuilder::new("commit:a", NodeType::Commit, "vcs")
            .title("A")
            .build(ts(1), ts(1));
        let b = NodeBuilder::new("commit:a", NodeType::Commit, "vcs")
            .title("B")
            .build(ts(1), ts(1));
        assert_ne!(node_content_hash(&a), node_content_hash(&b));
    }

    #[test]
    fn edge_hash_differs_on_property_change() {
        let a = EdgeBuilder::new("commit:a", "file:x", EdgeRel::Modifies, "vcs").build(ts(1), ts(1));
        let b = EdgeBuilder::new("commit:a", "file:x", EdgeRel::Modifies, "vcs")
            .property("lines_changed", Value::from(3))
            .build(ts(1), ts(1));
        assert_ne!(edge_content_hash(&a), edge_content_hash(&b));
    }

    #[test]
    fn edge_hash_ignores_source_and_time() {
        let a = EdgeBuilder::new("commit:a", "file:x", EdgeRel::Modifies, "vcs").build(ts(1), ts(1));
        let b = EdgeBuilder::new("commit:a", "file:x", EdgeRel::Modifies, "other").build(ts(9), ts(9));
        assert_eq!(edge_content_hash(&a), edge_content_hash(&b));
    }
}
