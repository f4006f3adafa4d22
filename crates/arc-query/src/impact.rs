//! Impact Engine: given a component, finds what depends on it (or what it
//! might break) by walking structural edges and recent co-change history.
//!
//! The BFS shape mirrors a dependency-tree walk: expand one hop at a time,
//! track the shortest hop count a node was reached at, and stop at
//! `max_depth`.

use std::collections::{HashMap, HashSet, VecDeque};

use arc_model::enums::EdgeRel;
use arc_store::Storage;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How recent a shared commit must be to count as a co-change for
/// `ImpactType::Potential`.
const CO_CHANGE_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactType {
    Direct,
    Indirect,
    Potential,
}

impl ImpactType {
    fn base_score(self) -> f64 {
        match self {
            Self::Direct => 1.0,
            Self::Indirect => 0.6,
            Self::Potential => 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactResult {
    pub node_id: String,
    pub title: Option<String>,
    pub impact_type: ImpactType,
    pub hops: u32,
    pub score: f64,
    /// Node ids from `component_id` to this result, inclusive of both ends.
    pub impact_path: Vec<String>,
}

/// Returns everything that might be affected by a change to `component_id`,
/// up to `max_depth` structural hops plus a `potential` pass over recent
/// co-change history.
///
/// `impact(id, 0, _)` always returns an empty result without touching the
/// store's edge tables: a BFS with no depth budget visits nothing.
/// Distinguish "no impact found" (`Ok(vec![])`) from "the component itself
/// doesn't exist" (`Err(ArcError::NotFound)`) by checking existence first.
pub fn impact(
    store: &dyn Storage,
    component_id: &str,
    max_depth: u32,
    impact_types: &[ImpactType],
) -> Result<Vec<ImpactResult>> {
    store.get_node(component_id)?;

    if max_depth == 0 {
        return Ok(Vec::new());
    }

    let mut hop_of: HashMap<String, u32> = HashMap::new();
    let mut parent: HashMap<String, String> = HashMap::new();
    let mut queue: VecDeque<(String, u32)> = VecDeque::from([(component_id.to_string(), 0)]);
    let mut visited: HashSet<String> = HashSet::from([component_id.to_string()]);
    let mut edge_weights: HashMap<String, Vec<f64>> = HashMap::new();

    while let Some((node_id, hop)) = queue.pop_front() {
        if hop >= max_depth {
            continue;
        }
        let outgoing = store.get_edges_by_src(&node_id, None)?;
        let incoming = store.get_edges_by_dst(&node_id, None)?;

        for edge in outgoing.iter().filter(|e| e.rel.is_structural()) {
            consider(&node_id, &edge.dst_id, hop + 1, 1.0, &mut hop_of, &mut parent, &mut visited, &mut queue, &mut edge_weights);
        }
        for edge in incoming.iter().filter(|e| e.rel.is_structural()) {
            consider(&node_id, &edge.src_id, hop + 1, 1.0, &mut hop_of, &mut parent, &mut visited, &mut queue, &mut edge_weights);
        }
    }

    let mut results = Vec::new();
    for (node_id, hop) in &hop_of {
        let impact_type = if *hop == 1 { ImpactType::Direct } else { ImpactType::Indirect };
        if !impact_types.contains(&impact_type) {
            continue;
        }
        let mean_weight = mean(edge_weights.get(node_id).map(Vec::as_slice).unwrap_or(&[1.0]));
        results.push(ImpactResult {
            node_id: node_id.clone(),
            title: title_of(store, node_id),
            impact_type,
            hops: *hop,
            score: score(impact_type, *hop, mean_weight),
            impact_path: reconstruct_path(node_id, component_id, &parent),
        });
    }

    if impact_types.contains(&ImpactType::Potential) {
        results.extend(potential_impact(store, component_id, &visited)?);
    }

    // Normalize scores into [0, 1] and tie-break by hop then id.
    let max_score = results.iter().map(|r| r.score).fold(0.0_f64, f64::max);
    if max_score > 0.0 {
        for r in &mut results {
            r.score /= max_score;
        }
    }
    results.sort_by(|a, b| a.hops.cmp(&b.hops).then_with(|| a.node_id.cmp(&b.node_id)));

    Ok(results)
}

fn consider(
    node_id: &str,
    neighbor: &str,
    hop: u32,
    weight: f64,
    hop_of: &mut HashMap<String, u32>,
    parent: &mut HashMap<String, String>,
    visited: &mut HashSet<String>,
    queue: &mut VecDeque<(String, u32)>,
    edge_weights: &mut HashMap<String, Vec<f64>>,
) {
    edge_weights.entry(neighbor.to_string()).or_default().push(weight);
    if visited.insert(neighbor.to_string()) {
        hop_of.insert(neighbor.to_string(), hop);
        parent.insert(neighbor.to_string(), node_id.to_string());
        queue.push_back((neighbor.to_string(), hop));
    }
}

/// Walks `parent` back from `node_id` to `component_id` and returns the
/// chain in root-to-leaf order, inclusive of both ends.
fn reconstruct_path(node_id: &str, component_id: &str, parent: &HashMap<String, String>) -> Vec<String> {
    let mut path = vec![node_id.to_string()];
    let mut current = node_id;
    while current != component_id {
        match parent.get(current) {
            Some(prev) => {
                path.push(prev.clone());
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

fn title_of(store: &dyn Storage, node_id: &str) -> Option<String> {
    store.get_node(node_id).ok().and_then(|n| n.title)
}

/// Components that recently shared a `MODIFIES` commit with `component_id`
/// but have no direct structural edge to it -- a co-change signal rather
/// than a declared dependency.
fn potential_impact(store: &dyn Storage, component_id: &str, already_found: &HashSet<String>) -> Result<Vec<ImpactResult>> {
    let cutoff = Utc::now() - Duration::days(CO_CHANGE_WINDOW_DAYS);
    let modifying_commits = store.get_edges_by_dst(component_id, Some(EdgeRel::Modifies.as_str()))?;

    // sibling -> (co-change frequency, one shared commit id to report as the path's pivot)
    let mut co_changed: HashMap<String, (u32, String)> = HashMap::new();
    for commit_edge in &modifying_commits {
        let Ok(commit) = store.get_node(&commit_edge.src_id) else { continue };
        if commit.ts() < cutoff {
            continue;
        }
        for sibling_edge in store.get_edges_by_src(&commit_edge.src_id, Some(EdgeRel::Modifies.as_str()))? {
            if sibling_edge.dst_id == component_id || already_found.contains(&sibling_edge.dst_id) {
                continue;
            }
            let entry = co_changed
                .entry(sibling_edge.dst_id)
                .or_insert((0, commit_edge.src_id.clone()));
            entry.0 += 1;
        }
    }

    Ok(co_changed
        .into_iter()
        .map(|(node_id, (frequency, via_commit))| ImpactResult {
            title: title_of(store, &node_id),
            score: score(ImpactType::Potential, 1, frequency as f64),
            impact_path: vec![component_id.to_string(), via_commit, node_id.clone()],
            node_id,
            impact_type: ImpactType::Potential,
            hops: 1,
        })
        .collect())
}

fn score(impact_type: ImpactType, hop: u32, edge_weight_mean: f64) -> f64 {
    let decay = 0.7_f64.powi(hop.saturating_sub(1) as i32);
    impact_type.base_score() * decay * edge_weight_mean
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_model::edge::EdgeBuilder;
    use arc_model::enums::NodeType;
    use arc_model::node::NodeBuilder;
    use arc_store::SqliteStore;

    fn node(id: &str, node_type: NodeType) -> arc_model::node::Node {
        let now = Utc::now();
        NodeBuilder::new(id, node_type, "test").build(now, now)
    }

    #[test]
    fn impact_zero_depth_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_node(&node("component:auth", NodeType::Component)).unwrap();
        let result = impact(&store, "component:auth", 0, &[ImpactType::Direct]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn impact_missing_component_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = impact(&store, "component:missing", 2, &[ImpactType::Direct]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn impact_classifies_direct_and_indirect_hops() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        for id in ["component:a", "component:b", "component:c"] {
            store.upsert_node(&node(id, NodeType::Component)).unwrap();
        }
        store
            .upsert_edge(&EdgeBuilder::new("component:a", "component:b", EdgeRel::DependsOn, "test").build(now, now))
            .unwrap();
        store
            .upsert_edge(&EdgeBuilder::new("component:b", "component:c", EdgeRel::DependsOn, "test").build(now, now))
            .unwrap();

        let result = impact(&store, "component:a", 3, &[ImpactType::Direct, ImpactType::Indirect]).unwrap();
        let b = result.iter().find(|r| r.node_id == "component:b").unwrap();
        let c = result.iter().find(|r| r.node_id == "component:c").unwrap();
        assert_eq!(b.impact_type, ImpactType::Direct);
        assert_eq!(c.impact_type, ImpactType::Indirect);
        assert!(b.score >= c.score);
        assert_eq!(b.impact_path, vec!["component:a", "component:b"]);
        assert_eq!(c.impact_path, vec!["component:a", "component:b", "component:c"]);
    }
}
