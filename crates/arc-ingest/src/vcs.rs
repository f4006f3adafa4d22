//! VCS ingestor: walks `git log` and emits `commit`/`file` nodes and
//! `commit --MODIFIES--> file` edges.

use std::path::Path;

use arc_git::{self, LogBounds};
use arc_model::edge::EdgeBuilder;
use arc_model::enums::{EdgeRel, NodeType};
use arc_model::id::{commit_id, file_id};
use arc_model::node::NodeBuilder;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::Result;
use crate::registry::{IngestResult, Ingestor};

const NODE_TYPES: &[NodeType] = &[NodeType::Commit, NodeType::File];
const EDGE_TYPES: &[EdgeRel] = &[EdgeRel::Modifies];

/// Walks commit history into `commit`/`file` nodes and `MODIFIES` edges.
///
/// Honors shallow clones: if `git rev-parse --is-shallow-repository`
/// reports `true`, the emitted watermark sets `"shallow": true` so the
/// orchestrator and build report can surface the incomplete history
/// rather than silently treating a truncated clone as the full one.
pub struct VcsIngestor {
    max_commits: Option<usize>,
    days: Option<u32>,
}

impl Default for VcsIngestor {
    fn default() -> Self {
        Self { max_commits: None, days: None }
    }
}

impl VcsIngestor {
    /// Builds a VCS ingestor bounded by at most `max_commits` commits
    /// and/or commits no older than `days` days.
    pub fn new(max_commits: Option<usize>, days: Option<u32>) -> Self {
        Self { max_commits, days }
    }
}

impl Ingestor for VcsIngestor {
    fn name(&self) -> &str {
        "vcs"
    }

    fn node_types(&self) -> &[NodeType] {
        NODE_TYPES
    }

    fn edge_types(&self) -> &[EdgeRel] {
        EDGE_TYPES
    }

    fn ingest(&self, repo_path: &Path, last_watermark: Option<&Value>) -> Result<IngestResult> {
        let last_sha = last_watermark
            .and_then(|w| w.get("last_sha"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let rev = last_sha.as_ref().map(|sha| format!("{sha}..HEAD"));
        let since = self.days.map(|d| Utc::now() - chrono::Duration::days(d as i64));

        let bounds = LogBounds { max_commits: self.max_commits, since, rev };
        debug!(?bounds, "walking commit log");
        let commits = arc_git::walk_log(repo_path, bounds)?;
        info!(count = commits.len(), "vcs ingestor walked commits");

        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for commit in &commits {
            let id = commit_id(&commit.sha);
            let node = NodeBuilder::new(id.clone(), NodeType::Commit, self.name())
                .title(commit.summary.clone())
                .extra("author_name", json!(commit.author_name))
                .extra("author_email", json!(commit.author_email))
                .build(commit.timestamp, commit.timestamp);
            nodes.push(node);

            for file_path in &commit.files_changed {
                let fid = file_id(file_path);
                let file_node = NodeBuilder::new(fid.clone(), NodeType::File, self.name())
                    .title(file_path.clone())
                    .build(commit.timestamp, commit.timestamp);
                nodes.push(file_node);

                let edge = EdgeBuilder::new(id.clone(), fid, EdgeRel::Modifies, self.name())
                    .build(commit.timestamp, commit.timestamp);
                edges.push(edge);
            }
        }

        // `walk_log` returns newest-first; the first commit seen this run
        // (if any) becomes the new high-water mark. No new commits leaves
        // the prior watermark's `last_sha` untouched.
        let newest_sha = commits.first().map(|c| c.sha.clone()).or(last_sha);
        let shallow = arc_git::is_shallow_repository(repo_path).unwrap_or(false);
        let watermark = newest_sha.map(|sha| json!({ "last_sha": sha, "shallow": shallow }));

        Ok(IngestResult { nodes, edges, watermark })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn init_repo(dir: &Path) {
        let run = |args: &[&str]| {
            let status = Command::new("git").args(args).current_dir(dir).status().unwrap();
            assert!(status.success(), "git {args:?} failed");
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "Test"]);
        std::fs::write(dir.join("a.txt"), "hello").unwrap();
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "initial commit"]);
    }

    #[test]
    fn ingest_fresh_repo_emits_commit_and_file_nodes() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let ingestor = VcsIngestor::default();
        let result = ingestor.ingest(dir.path(), None).unwrap();

        assert_eq!(result.nodes.iter().filter(|n| n.node_type == NodeType::Commit).count(), 1);
        assert_eq!(result.nodes.iter().filter(|n| n.node_type == NodeType::File).count(), 1);
        assert_eq!(result.edges.len(), 1);
        assert!(result.watermark.is_some());
        assert_eq!(result.watermark.unwrap()["shallow"], json!(false));
    }

    #[test]
    fn ingest_incremental_uses_watermark_range() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let ingestor = VcsIngestor::default();
        let first = ingestor.ingest(dir.path(), None).unwrap();
        let watermark = first.watermark.unwrap();

        // No new commits since the watermark: nothing new should surface.
        let second = ingestor.ingest(dir.path(), Some(&watermark)).unwrap();
        assert!(second.nodes.is_empty());
        assert!(second.edges.is_empty());
    }
}
