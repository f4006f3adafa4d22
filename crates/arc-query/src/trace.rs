//! Trace Engine: given a source location, finds the commit that last
//! touched it and walks forward through the decision trail of PRs,
//! issues, and ADRs that explain why.

use std::path::Path;

use arc_git::BlameResult;
use arc_model::enums::NodeType;
use arc_model::id::commit_id;
use arc_store::Storage;
use chrono::Utc;
use serde::Serialize;

use crate::cache::BlameCache;
use crate::error::Result;

/// Edge relations the trace engine follows forward from a commit
/// (`commit--MERGES-->pr`, `pr--MENTIONS-->issue`).
const FORWARD_TRACE_RELS: &[&str] = &["MERGES", "MENTIONS"];

/// Relation the trace engine follows backward into an adr
/// (`adr--DECIDES-->issue`, walked from the issue's incoming edges).
const BACKWARD_TRACE_REL: &str = "DECIDES";

/// Half-life, in days, for the trail's recency decay.
const RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

/// One node in a resolved decision trail, ranked by [`NodeType::trace_weight`],
/// recency, and hop depth from the seed commit.
#[derive(Debug, Clone, Serialize)]
pub struct TrailEntry {
    pub node_id: String,
    pub node_type: NodeType,
    pub title: Option<String>,
    pub hops: u32,
    pub score: f64,
    /// Hop distance from the seed commit (the seed itself is 0). Not the
    /// entry's index in the returned trail, which is ranked by score.
    pub trail_position: usize,
}

/// Resolves the decision trail for `file_path:line_number`: blames the
/// line to a commit (following renames), then walks `MERGES`/`MENTIONS`
/// forward and `DECIDES` backward up to `max_hops`, returning the
/// `max_results` highest-scoring nodes found, ranked newest/most-important
/// first rather than seed-first.
pub fn decision_trail(
    store: &dyn Storage,
    repo_path: &Path,
    blame_cache: &BlameCache<BlameResult>,
    file_path: &str,
    line_number: u32,
    max_results: usize,
    max_hops: u32,
) -> Result<Vec<TrailEntry>> {
    let head_sha = arc_git::git_command(&["rev-parse", "HEAD"], repo_path)?;

    let blame = match blame_cache.get(&head_sha, file_path) {
        Some(cached) => cached,
        None => {
            let resolved = arc_git::blame_line(repo_path, file_path, line_number, None)?;
            blame_cache.put(&head_sha, file_path, resolved.clone());
            resolved
        }
    };

    let seed_id = commit_id(&blame.commit_id);
    let seed_node = store.get_node(&seed_id)?;

    let now = Utc::now();
    let mut trail = vec![TrailEntry {
        node_id: seed_node.id.clone(),
        node_type: seed_node.node_type.clone(),
        title: seed_node.title.clone(),
        hops: 0,
        score: score(&seed_node.node_type, seed_node.ts(), 0, now),
        trail_position: 0,
    }];

    let mut visited = std::collections::HashSet::from([seed_id.clone()]);
    let mut frontier = vec![seed_id];

    for hop in 1..=max_hops {
        let mut next_frontier = Vec::new();
        for node_id in &frontier {
            for rel in FORWARD_TRACE_RELS {
                for edge in store.get_edges_by_src(node_id, Some(rel))? {
                    if visited.insert(edge.dst_id.clone()) {
                        next_frontier.push(edge.dst_id);
                    }
                }
            }
            for edge in store.get_edges_by_dst(node_id, Some(BACKWARD_TRACE_REL))? {
                if visited.insert(edge.src_id.clone()) {
                    next_frontier.push(edge.src_id);
                }
            }
        }

        for node_id in &next_frontier {
            let Ok(node) = store.get_node(node_id) else { continue };
            trail.push(TrailEntry {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
                title: node.title.clone(),
                hops: hop,
                score: score(&node.node_type, node.ts(), hop, now),
                trail_position: trail.len(),
            });
        }

        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
    }

    // Rank every entry -- seed included -- by score descending, ties broken
    // by hop then node id for determinism. trail_position is the hop
    // distance from the seed, not the entry's position in this array: the
    // seed (hops=0) typically sorts last, since decay and depth penalty
    // both favor whatever the trail led *to*.
    trail.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.hops.cmp(&a.hops))
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    trail.truncate(max_results);
    for entry in &mut trail {
        entry.trail_position = entry.hops as usize;
    }

    Ok(trail)
}

/// Per-hop decay applied to a trail entry's score. Gentle enough that a
/// node type with meaningfully higher `trace_weight` (e.g. an ADR over a
/// commit) still outranks a shallower, lower-weight node -- the trail
/// should read "here's the decision that explains this", not "here's
/// everything closest to the blamed line".
const DEPTH_DECAY: f64 = 0.85;

fn score(node_type: &NodeType, ts: chrono::DateTime<Utc>, hop: u32, now: chrono::DateTime<Utc>) -> f64 {
    let age_days = (now - ts).num_seconds() as f64 / 86_400.0;
    let recency_decay = (-age_days.max(0.0) / RECENCY_HALF_LIFE_DAYS).exp();
    let depth_penalty = DEPTH_DECAY.powi(hop as i32);
    node_type.trace_weight() * recency_decay * depth_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_model::edge::EdgeBuilder;
    use arc_model::enums::EdgeRel;
    use arc_model::node::NodeBuilder;
    use arc_store::SqliteStore;

    fn node(id: &str, node_type: NodeType, ts: chrono::DateTime<Utc>) -> arc_model::node::Node {
        NodeBuilder::new(id, node_type, "test").title(id).build(ts, ts)
    }

    #[test]
    fn score_ranks_adr_above_commit_at_equal_hop_and_recency() {
        let now = Utc::now();
        let adr_score = score(&NodeType::Adr, now, 1, now);
        let commit_score = score(&NodeType::Commit, now, 1, now);
        assert!(adr_score > commit_score);
    }

    #[test]
    fn score_decays_with_depth() {
        let now = Utc::now();
        let shallow = score(&NodeType::Pr, now, 1, now);
        let deep = score(&NodeType::Pr, now, 3, now);
        assert!(shallow > deep);
    }

    #[test]
    fn decision_trail_walks_commit_to_adr_chain() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();

        let commit = node("commit:aaaa", NodeType::Commit, now);
        let pr = node("pr:acme/widget#1", NodeType::Pr, now);
        let issue = node("issue:ABC-1", NodeType::Issue, now);
        let adr = node("adr:use-sqlite", NodeType::Adr, now);
        for n in [&commit, &pr, &issue, &adr] {
            store.upsert_node(n).unwrap();
        }

        store.upsert_edge(&EdgeBuilder::new("commit:aaaa", "pr:acme/widget#1", EdgeRel::Merges, "test").build(now, now)).unwrap();
        store.upsert_edge(&EdgeBuilder::new("pr:acme/widget#1", "issue:ABC-1", EdgeRel::Mentions, "test").build(now, now)).unwrap();
        store.upsert_edge(&EdgeBuilder::new("adr:use-sqlite", "issue:ABC-1", EdgeRel::Decides, "test").build(now, now)).unwrap();

        // Walk the graph directly rather than through git, since the trail
        // BFS itself is what's under test here.
        let mut visited = std::collections::HashSet::from(["commit:aaaa".to_string()]);
        let mut frontier = vec!["commit:aaaa".to_string()];
        let mut found = vec!["commit:aaaa".to_string()];
        for _ in 0..3 {
            let mut next = Vec::new();
            for id in &frontier {
                for rel in FORWARD_TRACE_RELS {
                    for edge in store.get_edges_by_src(id, Some(rel)).unwrap() {
                        if visited.insert(edge.dst_id.clone()) {
                            next.push(edge.dst_id);
                        }
                    }
                }
                for edge in store.get_edges_by_dst(id, Some(BACKWARD_TRACE_REL)).unwrap() {
                    if visited.insert(edge.src_id.clone()) {
                        next.push(edge.src_id);
                    }
                }
            }
            found.extend(next.iter().cloned());
            frontier = next;
        }

        assert!(found.contains(&"pr:acme/widget#1".to_string()));
        assert!(found.contains(&"issue:ABC-1".to_string()));
        assert!(found.contains(&"adr:use-sqlite".to_string()));
    }
}
