//! The Query Facade: the single entry point embedding applications and the
//! `arc` CLI call through. Wraps the Trace/Impact engines, the store, and
//! result caching behind one object.

use std::path::PathBuf;
use std::time::Duration;

use arc_git::BlameResult;
use arc_model::edge::Edge;
use arc_model::node::Node;
use arc_store::Storage;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{BlameCache, CacheKey, ResultCache};
use crate::error::Result;
use crate::export::{self, ExportOptions, Snapshot};
use crate::impact::{self, ImpactResult, ImpactType};
use crate::trace::{self, TrailEntry};

const DEFAULT_CACHE_CAPACITY: usize = 256;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
const DEFAULT_BLAME_CACHE_CAPACITY: usize = 128;

/// Direction of [`QueryFacade::related`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedDirection {
    Outgoing,
    Incoming,
    Both,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedEdge {
    pub node_id: String,
    pub rel: String,
}

/// Single entry point over a store and a repository checkout.
pub struct QueryFacade<'a> {
    store: &'a dyn Storage,
    repo_path: PathBuf,
    search_cache: ResultCache<Vec<Node>>,
    blame_cache: BlameCache<BlameResult>,
}

impl<'a> QueryFacade<'a> {
    pub fn new(store: &'a dyn Storage, repo_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            repo_path: repo_path.into(),
            search_cache: ResultCache::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL),
            blame_cache: BlameCache::new(DEFAULT_BLAME_CACHE_CAPACITY),
        }
    }

    fn content_fingerprint(&self) -> Result<(i32, i64)> {
        let stats = self.store.stats()?;
        Ok((stats.schema_version, stats.node_count + stats.edge_count))
    }

    /// Full-text search over current node title/body. `use_cache: false`
    /// always recomputes, bypassing both the read and the write.
    pub fn query(&self, text: &str, limit: usize, use_cache: bool) -> Result<Vec<Node>> {
        let fingerprint = self.content_fingerprint()?;
        let key = CacheKey::new("query", (text, limit), fingerprint);

        if use_cache {
            if let Some(hit) = self.search_cache.get(&key) {
                return Ok(hit);
            }
        }
        let results = self.store.search_nodes(text, limit)?;
        if use_cache {
            self.search_cache.put(key, results.clone());
        }
        Ok(results)
    }

    /// Looks up one node's current row.
    pub fn entity(&self, id: &str) -> Result<Node> {
        Ok(self.store.get_node(id)?)
    }

    /// Every historical row for `id`, oldest first, with no current-row
    /// filter -- a full bi-temporal audit trail rather than a snapshot.
    pub fn history(&self, id: &str) -> Result<Vec<Node>> {
        Ok(self.store.get_node_history(id)?)
    }

    /// Current edges touching `id`, in the requested direction.
    pub fn related(&self, id: &str, direction: RelatedDirection, limit: usize) -> Result<Vec<RelatedEdge>> {
        let mut out = Vec::new();
        if matches!(direction, RelatedDirection::Outgoing | RelatedDirection::Both) {
            out.extend(
                self.store
                    .get_edges_by_src(id, None)?
                    .into_iter()
                    .map(|e| RelatedEdge { node_id: e.dst_id, rel: e.rel.as_str().to_string() }),
            );
        }
        if matches!(direction, RelatedDirection::Incoming | RelatedDirection::Both) {
            out.extend(
                self.store
                    .get_edges_by_dst(id, None)?
                    .into_iter()
                    .map(|e| RelatedEdge { node_id: e.src_id, rel: e.rel.as_str().to_string() }),
            );
        }
        out.truncate(limit);
        Ok(out)
    }

    /// Resolves the decision trail behind a source location.
    pub fn decision_trail(&self, file_path: &str, line_number: u32, max_results: usize, max_hops: u32) -> Result<Vec<TrailEntry>> {
        trace::decision_trail(self.store, &self.repo_path, &self.blame_cache, file_path, line_number, max_results, max_hops)
    }

    /// Finds what depends on, or might be broken by a change to, `component_id`.
    pub fn impact(&self, component_id: &str, max_depth: u32, impact_types: &[ImpactType]) -> Result<Vec<ImpactResult>> {
        impact::impact(self.store, component_id, max_depth, impact_types)
    }

    /// Upserts a batch of nodes and edges inside one transaction, nodes
    /// before edges.
    pub fn add_nodes_and_edges(&self, nodes: &[Node], edges: &[Edge]) -> Result<()> {
        let tx_time = Utc::now();
        self.store
            .run_in_transaction(&|tx| {
                for node in nodes {
                    tx.upsert_node(node, tx_time)?;
                }
                for edge in edges {
                    tx.upsert_edge(edge, tx_time)?;
                }
                Ok(())
            })
            .map_err(Into::into)
    }

    /// Builds a deterministic export snapshot. `generated_at` is supplied
    /// by the caller rather than sampled here, so two exports of the same
    /// store content are byte-identical.
    pub fn export(&self, options: ExportOptions, generated_at: DateTime<Utc>) -> Result<Snapshot> {
        export::export(self.store, options, generated_at)
    }
}
