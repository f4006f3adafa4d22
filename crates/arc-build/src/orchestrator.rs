//! Fans registered ingestors out over a thread per ingestor, applies each
//! one's nodes and edges inside its own store transaction, and optionally
//! runs post-processing passes over the result.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;
use std::thread;
use std::time::Instant;

use arc_ingest::{IngestError, IngestResult, Ingestor, Registry};
use arc_model::edge::EdgeBuilder;
use arc_model::enums::{EdgeRel, NodeType};
use arc_model::idgen::generate_hash_id;
use arc_store::Storage;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::error::{BuildError, Result};

/// Nodes and edges from one ingestor are flushed to the store in chunks of
/// this size, so a large initial ingest doesn't hold one giant transaction
/// open for its entire duration.
const FLUSH_BATCH_SIZE: usize = 2000;

/// How many of the most recently touched files the reasoning-path
/// precompute pass considers.
const RECENT_FILE_WINDOW: usize = 20;

/// How far the precompute pass's trail BFS walks from a seed commit.
const PRECOMPUTE_MAX_HOPS: u32 = 3;

/// Minimum shared title terms for the semantic enrichment pass to tag two
/// nodes `RELATED_TO` each other.
const SHARED_TERM_THRESHOLD: usize = 2;

/// Which ingestors to run and how to bound them.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Ingestor names to run. `None` runs every registered ingestor.
    pub includes: Option<Vec<String>>,
    /// Per-ingestor configuration blobs, keyed by ingestor name. Unused by
    /// the built-in ingestors today; threaded through for third-party ones.
    pub source_configs: BTreeMap<String, Value>,
    /// Resume each ingestor from its last watermark instead of a full
    /// re-ingest.
    pub incremental: bool,
    /// Run the semantic enrichment and reasoning-path precompute passes
    /// after ingestors apply.
    pub post_process: bool,
}

/// Outcome of running one ingestor.
#[derive(Debug, Clone, Serialize)]
pub struct IngestorSummary {
    pub name: String,
    pub success: bool,
    pub nodes_processed: usize,
    pub edges_processed: usize,
    pub error_message: Option<String>,
    pub processing_time_ms: u64,
}

/// Outcome of one post-processing pass.
#[derive(Debug, Clone, Serialize)]
pub struct PostProcessSummary {
    pub name: String,
    pub success: bool,
    pub detail: String,
}

impl PostProcessSummary {
    fn ok(name: &str, detail: impl Into<String>) -> Self {
        Self { name: name.to_string(), success: true, detail: detail.into() }
    }

    fn failed(name: &str, detail: impl Into<String>) -> Self {
        Self { name: name.to_string(), success: false, detail: detail.into() }
    }
}

/// Full report for one `build()` call.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub ingestors: Vec<IngestorSummary>,
    pub post_process: Vec<PostProcessSummary>,
}

impl BuildReport {
    /// `true` if every ingestor that ran succeeded. A partial failure still
    /// produces a usable report; callers decide whether that's acceptable.
    pub fn all_succeeded(&self) -> bool {
        self.ingestors.iter().all(|s| s.success)
    }
}

/// Runs ingestors against a repository and applies their output to a store.
pub struct BuildOrchestrator<'a> {
    store: &'a dyn Storage,
    registry: Registry,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(store: &'a dyn Storage, registry: Registry) -> Self {
        Self { store, registry }
    }

    /// Runs every selected ingestor, applies its results, and runs
    /// post-processing if requested. One ingestor's failure is recorded in
    /// its [`IngestorSummary`] and does not prevent the others from
    /// applying.
    #[instrument(skip(self, options), fields(repo = %repo_path.display()))]
    pub fn build(&self, repo_path: &Path, options: &BuildOptions) -> Result<BuildReport> {
        if !repo_path.exists() {
            return Err(BuildError::InvalidRepoPath(repo_path.display().to_string()));
        }

        let selected: Vec<&Box<dyn Ingestor>> = self
            .registry
            .iter()
            .filter(|i| options.includes.as_ref().is_none_or(|inc| inc.iter().any(|n| n == i.name())))
            .collect();

        let watermarks: Vec<Option<Value>> = selected
            .iter()
            .map(|i| {
                if options.incremental {
                    self.store.get_watermark(i.name()).unwrap_or(None)
                } else {
                    None
                }
            })
            .collect();

        info!(count = selected.len(), "starting build");

        let mut raw: Vec<(String, Instant, std::result::Result<IngestResult, IngestError>)> = Vec::new();
        thread::scope(|scope| {
            let handles: Vec<_> = selected
                .iter()
                .zip(watermarks.iter())
                .map(|(ingestor, watermark)| {
                    let name = ingestor.name().to_string();
                    scope.spawn(move || {
                        let started = Instant::now();
                        let result = ingestor.ingest(repo_path, watermark.as_ref());
                        (name, started, result)
                    })
                })
                .collect();
            for handle in handles {
                raw.push(handle.join().expect("ingestor thread panicked"));
            }
        });

        let mut summaries = Vec::with_capacity(raw.len());
        for (name, started, result) in raw {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match result {
                Ok(ingest_result) => {
                    let nodes_processed = ingest_result.nodes.len();
                    let edges_processed = ingest_result.edges.len();
                    match self.apply(&name, ingest_result) {
                        Ok(()) => summaries.push(IngestorSummary {
                            name,
                            success: true,
                            nodes_processed,
                            edges_processed,
                            error_message: None,
                            processing_time_ms: elapsed_ms,
                        }),
                        Err(e) => {
                            warn!(ingestor = %name, error = %e, "apply failed, rolled back");
                            summaries.push(IngestorSummary {
                                name,
                                success: false,
                                nodes_processed: 0,
                                edges_processed: 0,
                                error_message: Some(e.to_string()),
                                processing_time_ms: elapsed_ms,
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!(ingestor = %name, error = %e, "ingest failed");
                    summaries.push(IngestorSummary {
                        name,
                        success: false,
                        nodes_processed: 0,
                        edges_processed: 0,
                        error_message: Some(e.to_string()),
                        processing_time_ms: elapsed_ms,
                    });
                }
            }
        }

        let post_process = if options.post_process {
            vec![self.run_semantic_enrichment(), self.run_reasoning_path_precompute()]
        } else {
            Vec::new()
        };

        Ok(BuildReport { ingestors: summaries, post_process })
    }

    /// Applies one ingestor's nodes and edges inside a single store
    /// transaction: nodes before edges, then the watermark write, all
    /// sharing one `tx_time`. A failure partway through rolls the whole
    /// transaction back, so the prior watermark for `name` is left
    /// untouched rather than advanced past data that never landed.
    fn apply(&self, name: &str, result: IngestResult) -> Result<()> {
        let tx_time = Utc::now();
        self.store
            .run_in_transaction(&|tx| {
                for chunk in result.nodes.chunks(FLUSH_BATCH_SIZE) {
                    for node in chunk {
                        tx.upsert_node(node, tx_time)?;
                    }
                }
                for chunk in result.edges.chunks(FLUSH_BATCH_SIZE) {
                    for edge in chunk {
                        tx.upsert_edge(edge, tx_time)?;
                    }
                }
                if let Some(watermark) = &result.watermark {
                    tx.set_watermark(name, watermark)?;
                }
                Ok(())
            })
            .map_err(BuildError::from)
    }

    /// Shallow semantic enrichment: for each ADR/issue/PR node, searches
    /// full text for other nodes sharing title terms and tags them
    /// `RELATED_TO` above a fixed term-overlap threshold. Structurally
    /// complete but intentionally naive — no embeddings, no learned
    /// similarity.
    fn run_semantic_enrichment(&self) -> PostProcessSummary {
        let mut edges_added = 0usize;
        for node_type in [NodeType::Adr, NodeType::Issue, NodeType::Pr] {
            let nodes = match self.store.get_nodes_by_type(node_type.as_str()) {
                Ok(n) => n,
                Err(e) => return PostProcessSummary::failed("semantic_enrichment", e.to_string()),
            };
            for node in &nodes {
                let Some(title) = &node.title else { continue };
                let matches = match self.store.search_nodes(title, 5) {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                for other in matches {
                    if other.id == node.id {
                        continue;
                    }
                    let overlap = shared_term_count(title, other.title.as_deref().unwrap_or(""));
                    if overlap < SHARED_TERM_THRESHOLD {
                        continue;
                    }
                    let now = Utc::now();
                    let edge = EdgeBuilder::new(node.id.clone(), other.id.clone(), EdgeRel::RelatedTo, "semantic_enrichment")
                        .property("shared_terms", json!(overlap))
                        .build(now, now);
                    if matches!(self.store.upsert_edge(&edge), Ok(true)) {
                        edges_added += 1;
                    }
                }
            }
        }
        PostProcessSummary::ok("semantic_enrichment", format!("{edges_added} related_to edges added"))
    }

    /// Shallow reasoning-path precompute: for the most recently touched
    /// files, walks the trace-hop edges from each file's latest modifying
    /// commit and caches the resulting trail on a synthetic
    /// `reasoning_node`. Deliberately self-contained rather than calling
    /// into the query facade's own trace engine, so the ordering of
    /// operations a build exercises never depends on the query crate.
    fn run_reasoning_path_precompute(&self) -> PostProcessSummary {
        let mut commits = match self.store.get_nodes_by_type(NodeType::Commit.as_str()) {
            Ok(c) => c,
            Err(e) => return PostProcessSummary::failed("reasoning_path_precompute", e.to_string()),
        };
        commits.sort_by(|a, b| b.ts().cmp(&a.ts()));
        commits.truncate(RECENT_FILE_WINDOW);

        let mut cached = 0usize;
        for (nonce, commit) in commits.iter().enumerate() {
            let trail = bfs_trail(self.store, &commit.id, PRECOMPUTE_MAX_HOPS);
            if trail.is_empty() {
                continue;
            }
            let now = Utc::now();
            let id = generate_hash_id("reasoning_node", &commit.id, "precompute", "", now, 8, nonce as i32);
            let node = arc_model::node::NodeBuilder::new(id, NodeType::ReasoningNode, "reasoning_path_precompute")
                .extra("seed_commit", json!(commit.id))
                .extra("cached_trail", json!(trail))
                .build(now, now);
            if matches!(self.store.upsert_node(&node), Ok(true)) {
                cached += 1;
            }
        }
        PostProcessSummary::ok("reasoning_path_precompute", format!("{cached} reasoning nodes cached"))
    }
}

/// Breadth-first walk over [`EdgeRel::is_trace_hop`] edges from `seed_id`,
/// returning the ids visited in discovery order.
fn bfs_trail(store: &dyn Storage, seed_id: &str, max_hops: u32) -> Vec<String> {
    let mut visited: HashSet<String> = HashSet::from([seed_id.to_string()]);
    let mut queue: VecDeque<(String, u32)> = VecDeque::from([(seed_id.to_string(), 0)]);
    let mut trail = Vec::new();

    while let Some((id, hop)) = queue.pop_front() {
        if hop >= max_hops {
            continue;
        }
        let Ok(edges) = store.get_edges_by_src(&id, None) else { continue };
        for edge in edges {
            if !edge.rel.is_trace_hop() || !visited.insert(edge.dst_id.clone()) {
                continue;
            }
            trail.push(edge.dst_id.clone());
            queue.push_back((edge.dst_id.clone(), hop + 1));
        }
    }
    trail
}

/// Lowercased whitespace-token overlap between two titles.
fn shared_term_count(a: &str, b: &str) -> usize {
    let a_terms: HashSet<String> = a.split_whitespace().map(|t| t.to_lowercase()).collect();
    let b_terms: HashSet<String> = b.split_whitespace().map(|t| t.to_lowercase()).collect();
    a_terms.intersection(&b_terms).count()
}
