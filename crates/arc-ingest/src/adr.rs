//! Decision record ingestor: parses Markdown files with YAML front matter
//! into `adr` nodes and `adr --DECIDES--> {commit|file|component}` edges.

use std::path::{Path, PathBuf};

use arc_model::edge::EdgeBuilder;
use arc_model::enums::{EdgeRel, NodeType};
use arc_model::id::{adr_id, find_id_references};
use arc_model::node::NodeBuilder;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::registry::{IngestResult, Ingestor};

const NODE_TYPES: &[NodeType] = &[NodeType::Adr];
const EDGE_TYPES: &[EdgeRel] = &[EdgeRel::Decides];

const DECIDES_PREFIXES: &[&str] = &["commit", "file", "component"];

/// Front matter fields recognized on a decision record.
#[derive(Debug, Deserialize, Default)]
struct AdrFrontMatter {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(rename = "decision-makers", default)]
    decision_makers: Option<String>,
}

/// Scans `docs/adr/*.md` and `docs/decisions/*.md` (by default) for
/// decision records.
pub struct AdrIngestor {
    globs: Vec<String>,
}

impl Default for AdrIngestor {
    fn default() -> Self {
        Self { globs: vec!["docs/adr".to_string(), "docs/decisions".to_string()] }
    }
}

impl AdrIngestor {
    /// Builds an ADR ingestor scanning the given directories (relative to
    /// the repository root) for `*.md` files, instead of the defaults.
    pub fn with_dirs(dirs: Vec<String>) -> Self {
        Self { globs: dirs }
    }

    fn candidate_files(&self, repo_path: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in &self.globs {
            let full_dir = repo_path.join(dir);
            let Ok(entries) = std::fs::read_dir(&full_dir) else { continue };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("md") {
                    files.push(path);
                }
            }
        }
        files.sort();
        files
    }
}

impl Ingestor for AdrIngestor {
    fn name(&self) -> &str {
        "adr"
    }

    fn node_types(&self) -> &[NodeType] {
        NODE_TYPES
    }

    fn edge_types(&self) -> &[EdgeRel] {
        EDGE_TYPES
    }

    fn ingest(&self, repo_path: &Path, _last_watermark: Option<&serde_json::Value>) -> Result<IngestResult> {
        let files = self.candidate_files(repo_path);
        debug!(count = files.len(), "adr ingestor scanning decision records");

        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for path in files {
            let slug = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            let content = std::fs::read_to_string(&path)?;

            let (front_matter, body) = split_front_matter(&content);
            let parsed: AdrFrontMatter = match front_matter {
                Some(yaml) => serde_yaml::from_str(yaml).map_err(|e| IngestError::ParseError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?,
                None => AdrFrontMatter::default(),
            };

            let timestamp = parsed
                .date
                .as_deref()
                .and_then(parse_adr_date)
                .unwrap_or_else(Utc::now);

            let id = adr_id(&slug);
            let mut node = NodeBuilder::new(id.clone(), NodeType::Adr, self.name())
                .title(slug.clone())
                .body(body.to_string());
            if let Some(status) = &parsed.status {
                node = node.extra("status", json!(status));
            }
            if let Some(makers) = &parsed.decision_makers {
                node = node.extra("decision_makers", json!(makers));
            }
            nodes.push(node.build(timestamp, timestamp));

            let refs = find_id_references(body, DECIDES_PREFIXES);
            if refs.is_empty() {
                warn!(path = %path.display(), "decision record references no known id");
            }
            for target in refs {
                edges.push(
                    EdgeBuilder::new(id.clone(), target, EdgeRel::Decides, self.name())
                        .build(timestamp, timestamp),
                );
            }
        }

        Ok(IngestResult { nodes, edges, watermark: None })
    }
}

/// Splits `---\n<yaml>\n---\n<body>` front matter from a Markdown file.
/// Returns `(None, content)` if the file has no front matter block.
fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content.strip_prefix("---\n") else { return (None, content) };
    let Some(end) = rest.find("\n---") else { return (None, content) };
    let yaml = &rest[..end];
    let after = &rest[end + 4..];
    let body = after.strip_prefix('\n').unwrap_or(after);
    (Some(yaml), body)
}

fn parse_adr_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
