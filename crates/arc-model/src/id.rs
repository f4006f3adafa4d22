//! The `<type>:<scope>` identifier scheme.
//!
//! Every node id looks like `commit:<hex>`, `file:<path>`,
//! `pr:<owner>/<repo>#<n>`, `issue:<key>`, `adr:<slug>`, or
//! `function:<path>#<name>`. The type prefix is informational only —
//! it is never authoritative over the node's actual [`NodeType`]
//! (two plugins could reuse a prefix) — but constructing ids through
//! this module keeps the convention consistent across every ingestor.

use crate::enums::NodeType;
use thiserror::Error;

/// Errors returned while parsing a structured node id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("id must be of the form <type>:<scope>, got {0:?}")]
    MissingSeparator(String),

    #[error("id scope must not be empty, got {0:?}")]
    EmptyScope(String),
}

/// The `<type>:<scope>` split of a node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    pub prefix: String,
    pub scope: String,
}

/// Splits `id` into its `<type>` prefix and `<scope>` remainder at the
/// first `:`.
///
/// # Errors
///
/// Returns [`IdError::MissingSeparator`] if there is no `:`, or
/// [`IdError::EmptyScope`] if the scope after `:` is empty.
pub fn parse_id(id: &str) -> Result<ParsedId, IdError> {
    let Some((prefix, scope)) = id.split_once(':') else {
        return Err(IdError::MissingSeparator(id.to_owned()));
    };
    if scope.is_empty() {
        return Err(IdError::EmptyScope(id.to_owned()));
    }
    Ok(ParsedId {
        prefix: prefix.to_owned(),
        scope: scope.to_owned(),
    })
}

/// Builds `commit:<sha>`.
pub fn commit_id(sha: &str) -> String {
    format!("commit:{sha}")
}

/// Builds `file:<path>`. `path` should already be repo-relative and use `/`.
pub fn file_id(path: &str) -> String {
    format!("file:{path}")
}

/// Builds `function:<path>#<name>`.
pub fn function_id(path: &str, name: &str) -> String {
    format!("function:{path}#{name}")
}

/// Builds `pr:<owner>/<repo>#<n>`.
pub fn pr_id(owner: &str, repo: &str, number: u64) -> String {
    format!("pr:{owner}/{repo}#{number}")
}

/// Builds `issue:<key>`.
pub fn issue_id(key: &str) -> String {
    format!("issue:{key}")
}

/// Builds `adr:<slug>`.
pub fn adr_id(slug: &str) -> String {
    format!("adr:{slug}")
}

/// Builds `component:<name>`.
pub fn component_id(name: &str) -> String {
    format!("component:{name}")
}

/// Scans free-form text for id-shaped tokens of the given node types.
///
/// Used by the decision-record ingestor to find `commit:<hex>`,
/// `file:<path>`, and `component:<name>` references inside an ADR body.
/// A token is considered id-shaped if it matches `<prefix>:<non-space>+`
/// for one of the recognized prefixes.
pub fn find_id_references(text: &str, prefixes: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for word in text.split_whitespace() {
        let trimmed = word.trim_matches(|c: char| matches!(c, ',' | '.' | ')' | '(' | '`'));
        if let Ok(parsed) = parse_id(trimmed) {
            if prefixes.contains(&parsed.prefix.as_str()) {
                found.push(format!("{}:{}", parsed.prefix, parsed.scope));
            }
        }
    }
    found
}

/// Maps a [`ParsedId`] prefix to its conventional [`NodeType`], where one
/// exists. Returns `None` for prefixes with no 1:1 mapping (e.g. `concept`,
/// which plugins mint freely).
pub fn node_type_for_prefix(prefix: &str) -> Option<NodeType> {
    match prefix {
        "commit" => Some(NodeType::Commit),
        "file" => Some(NodeType::File),
        "function" => Some(NodeType::Function),
        "class" => Some(NodeType::Class),
        "module" => Some(NodeType::Module),
        "component" => Some(NodeType::Component),
        "service" => Some(NodeType::Service),
        "pr" => Some(NodeType::Pr),
        "issue" => Some(NodeType::Issue),
        "adr" => Some(NodeType::Adr),
        "document" => Some(NodeType::Document),
        _ => None,
    }
}
