//! Deterministic export: a point-in-time JSON snapshot of the graph,
//! optionally zstd-compressed and HMAC-SHA256 signed.
//!
//! Determinism rests on two things: entities and relationships are always
//! sorted by id, and `generated_at` is supplied by the caller rather than
//! sampled inside this module, so exporting the same store content twice
//! with the same timestamp produces byte-identical output.

use std::collections::{BTreeSet, HashSet, VecDeque};

use arc_model::edge::Edge;
use arc_model::enums::{EdgeRel, NodeType};
use arc_model::node::Node;
use arc_store::Storage;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::error::{ArcError, Result};

/// `ExportOptions::max_hops` default, matching the trace/impact engines'
/// own default hop budgets.
const DEFAULT_EXPORT_MAX_HOPS: usize = 3;

type HmacSha256 = Hmac<Sha256>;

/// Every built-in node type; export with `entity_types: None` scans all of
/// these. Nodes tagged with a plugin's custom type are only included when
/// that type is named explicitly, since there's no way to enumerate an
/// open-ended set of custom tags from the store.
const ALL_BUILTIN_NODE_TYPES: &[NodeType] = &[
    NodeType::Commit,
    NodeType::File,
    NodeType::Function,
    NodeType::Class,
    NodeType::Module,
    NodeType::Component,
    NodeType::Service,
    NodeType::Pr,
    NodeType::Issue,
    NodeType::Adr,
    NodeType::Document,
    NodeType::Concept,
    NodeType::Requirement,
    NodeType::ChangePattern,
    NodeType::Refactoring,
    NodeType::ReasoningNode,
];

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Restrict to these node types; `None` scans every built-in type.
    /// Ignored when `pr_sha` is set -- that mode exports a reachability
    /// subgraph instead of a type/time-windowed scan.
    pub entity_types: Option<Vec<NodeType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Switches the export to a PR-seeded subgraph: the PR merging this
    /// commit sha, every node reachable from it within `max_hops` typed
    /// edges, plus the commits it merges and the files they modify.
    pub pr_sha: Option<String>,
    /// Hop budget for the `pr_sha` subgraph walk.
    pub max_hops: usize,
    /// Pull reasoning-node cached trails into their own top-level field.
    pub include_reasoning_paths: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            entity_types: None,
            since: None,
            until: None,
            pr_sha: None,
            max_hops: DEFAULT_EXPORT_MAX_HOPS,
            include_reasoning_paths: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub schema_version: i32,
    pub generated_at: DateTime<Utc>,
    pub entities: Vec<Node>,
    pub relationships: Vec<Edge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_paths: Option<Vec<Node>>,
}

pub fn export(store: &dyn Storage, options: ExportOptions, generated_at: DateTime<Utc>) -> Result<Snapshot> {
    let (entities, relationships) = if let Some(sha) = &options.pr_sha {
        pr_subgraph(store, sha, options.max_hops)?
    } else {
        windowed_scan(store, &options)?
    };

    let reasoning_paths = if options.include_reasoning_paths {
        Some(entities.iter().filter(|n| n.node_type == NodeType::ReasoningNode).cloned().collect())
    } else {
        None
    };

    let schema_version = store.stats()?.schema_version;

    Ok(Snapshot { schema_version, generated_at, entities, relationships, reasoning_paths })
}

fn windowed_scan(store: &dyn Storage, options: &ExportOptions) -> Result<(Vec<Node>, Vec<Edge>)> {
    let types: Vec<NodeType> = options.entity_types.clone().unwrap_or_else(|| ALL_BUILTIN_NODE_TYPES.to_vec());

    let mut entities = Vec::new();
    for node_type in &types {
        for node in store.get_nodes_by_type(node_type.as_str())? {
            if in_window(node.ts(), options.since, options.until) {
                entities.push(node);
            }
        }
    }
    entities.sort_by(|a, b| a.id.cmp(&b.id));
    entities.dedup_by(|a, b| a.id == b.id);

    let relationships = relationships_among(store, &entities)?;
    Ok((entities, relationships))
}

/// PR-seeded bounded BFS: resolve the PR merging `sha`'s commit, then walk
/// outward through typed edges up to `max_hops`, picking up the commits it
/// merges and the files they modify along the way.
fn pr_subgraph(store: &dyn Storage, sha: &str, max_hops: usize) -> Result<(Vec<Node>, Vec<Edge>)> {
    let commit = store.get_node(&arc_model::id::commit_id(sha))?;
    let pr_edges = store.get_edges_by_src(&commit.id, Some(EdgeRel::Merges.as_str()))?;

    let mut visited: HashSet<String> = HashSet::from([commit.id.clone()]);
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    for edge in &pr_edges {
        if visited.insert(edge.dst_id.clone()) {
            queue.push_back((edge.dst_id.clone(), 0));
        }
    }

    while let Some((node_id, hop)) = queue.pop_front() {
        if hop >= max_hops {
            continue;
        }
        let outgoing = store.get_edges_by_src(&node_id, None)?;
        let incoming = store.get_edges_by_dst(&node_id, None)?;
        for edge in outgoing.iter() {
            if visited.insert(edge.dst_id.clone()) {
                queue.push_back((edge.dst_id.clone(), hop + 1));
            }
        }
        for edge in incoming.iter() {
            if visited.insert(edge.src_id.clone()) {
                queue.push_back((edge.src_id.clone(), hop + 1));
            }
        }
    }

    let mut entities: Vec<Node> = visited.iter().filter_map(|id| store.get_node(id).ok()).collect();
    entities.sort_by(|a, b| a.id.cmp(&b.id));

    let relationships = relationships_among(store, &entities)?;
    Ok((entities, relationships))
}

fn relationships_among(store: &dyn Storage, entities: &[Node]) -> Result<Vec<Edge>> {
    let entity_ids: BTreeSet<&str> = entities.iter().map(|n| n.id.as_str()).collect();

    let mut relationships = Vec::new();
    for node in entities {
        for edge in store.get_edges_by_src(&node.id, None)? {
            if entity_ids.contains(edge.dst_id.as_str()) {
                relationships.push(edge);
            }
        }
    }
    relationships.sort_by(|a, b| (a.src_id.as_str(), a.dst_id.as_str(), a.rel.as_str()).cmp(&(b.src_id.as_str(), b.dst_id.as_str(), b.rel.as_str())));
    relationships.dedup_by(|a, b| a.src_id == b.src_id && a.dst_id == b.dst_id && a.rel == b.rel);
    Ok(relationships)
}

fn in_window(ts: DateTime<Utc>, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> bool {
    since.is_none_or(|s| ts >= s) && until.is_none_or(|u| ts <= u)
}

/// Serializes a snapshot to canonical JSON bytes. Struct field order and
/// `BTreeMap`-backed `extra`/`properties` maps make the output stable
/// across runs for identical input.
pub fn serialize_canonical(snapshot: &Snapshot) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(snapshot).map_err(|e| ArcError::Internal(e.to_string()))
}

/// zstd compression level for export payloads, matching the store
/// envelope's own level.
const COMPRESSION_LEVEL: i32 = 3;

pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    zstd::stream::copy_encode(bytes, &mut out, COMPRESSION_LEVEL)
        .map_err(|e| ArcError::Internal(format!("zstd compression failed: {e}")))?;
    Ok(out)
}

/// Detached HMAC-SHA256 signature, hex-encoded, over the exact bytes that
/// were written to the export file (before or after compression,
/// whichever the caller signs).
pub fn sign(bytes: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(bytes);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a hex-encoded signature in constant time.
pub fn verify(bytes: &[u8], secret: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else { return false };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(bytes);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_model::edge::EdgeBuilder;
    use arc_model::enums::EdgeRel;
    use arc_model::node::NodeBuilder;
    use arc_store::SqliteStore;

    fn seed(store: &SqliteStore) {
        let now = Utc::now();
        let a = NodeBuilder::new("commit:aaaa", NodeType::Commit, "test").build(now, now);
        let b = NodeBuilder::new("file:a.rs", NodeType::File, "test").build(now, now);
        store.upsert_node(&a).unwrap();
        store.upsert_node(&b).unwrap();
        store.upsert_edge(&EdgeBuilder::new("commit:aaaa", "file:a.rs", EdgeRel::Modifies, "test").build(now, now)).unwrap();
    }

    #[test]
    fn export_is_sorted_and_deterministic_for_fixed_timestamp() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store);
        let generated_at = Utc::now();

        let snap_a = export(&store, ExportOptions::default(), generated_at).unwrap();
        let snap_b = export(&store, ExportOptions::default(), generated_at).unwrap();

        let bytes_a = serialize_canonical(&snap_a).unwrap();
        let bytes_b = serialize_canonical(&snap_b).unwrap();
        assert_eq!(bytes_a, bytes_b);
        assert_eq!(snap_a.entities[0].id, "commit:aaaa");
        assert_eq!(snap_a.relationships.len(), 1);
    }

    #[test]
    fn pr_sha_exports_merged_commit_and_modified_files_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let commit = NodeBuilder::new("commit:aaaa", NodeType::Commit, "test").build(now, now);
        let pr = NodeBuilder::new("pr:acme/widget#7", NodeType::Pr, "test").build(now, now);
        let file = NodeBuilder::new("file:auth.py", NodeType::File, "test").build(now, now);
        let unrelated = NodeBuilder::new("commit:bbbb", NodeType::Commit, "test").build(now, now);
        for node in [&commit, &pr, &file, &unrelated] {
            store.upsert_node(node).unwrap();
        }
        store.upsert_edge(&EdgeBuilder::new("commit:aaaa", "pr:acme/widget#7", EdgeRel::Merges, "test").build(now, now)).unwrap();
        store.upsert_edge(&EdgeBuilder::new("commit:aaaa", "file:auth.py", EdgeRel::Modifies, "test").build(now, now)).unwrap();

        let options = ExportOptions { pr_sha: Some("aaaa".to_string()), ..ExportOptions::default() };
        let snap = export(&store, options, now).unwrap();

        let ids: Vec<&str> = snap.entities.iter().map(|n| n.id.as_str()).collect();
        assert!(ids.contains(&"commit:aaaa"));
        assert!(ids.contains(&"pr:acme/widget#7"));
        assert!(ids.contains(&"file:auth.py"));
        assert!(!ids.contains(&"commit:bbbb"));
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let bytes = b"export payload";
        let secret = b"top-secret-key";
        let signature = sign(bytes, secret);
        assert!(verify(bytes, secret, &signature));
        assert!(!verify(bytes, b"wrong-key", &signature));
    }

    #[test]
    fn compress_shrinks_repetitive_payload() {
        let bytes = vec![b'a'; 4096];
        let compressed = compress(&bytes).unwrap();
        assert!(compressed.len() < bytes.len());
    }
}
