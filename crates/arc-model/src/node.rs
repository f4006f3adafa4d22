//! The [`Node`] type: a single versioned vertex in the knowledge graph.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::NodeType;
use crate::temporal::Bitemporal;

/// A single bi-temporal row describing one vertex.
///
/// `extra` is an open-ended JSON-serializable map: ingestors attach
/// whatever type-specific properties they have (a commit's author
/// email, a PR's merge state, an ADR's status) without requiring a
/// schema change here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub title: Option<String>,
    pub body: Option<String>,
    pub repo_id: Option<String>,
    pub source: String,
    pub extra: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub temporal: Bitemporal,
}

impl Node {
    /// `ts` per the data model is an alias for `valid_from`.
    pub fn ts(&self) -> DateTime<Utc> {
        self.temporal.valid_from
    }

    pub fn is_current(&self) -> bool {
        self.temporal.is_current()
    }
}

/// Builder for constructing [`Node`]s with a readable call site; mirrors
/// the construction ergonomics ingestors need without a full derive-builder
/// dependency.
pub struct NodeBuilder {
    id: String,
    node_type: NodeType,
    title: Option<String>,
    body: Option<String>,
    repo_id: Option<String>,
    source: String,
    extra: BTreeMap<String, Value>,
}

impl NodeBuilder {
    pub fn new(id: impl Into<String>, node_type: NodeType, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            title: None,
            body: None,
            repo_id: None,
            source: source.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn repo_id(mut self, repo_id: impl Into<String>) -> Self {
        self.repo_id = Some(repo_id.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn build(self, valid_from: DateTime<Utc>, tx_from: DateTime<Utc>) -> Node {
        Node {
            id: self.id,
            node_type: self.node_type,
            title: self.title,
            body: self.body,
            repo_id: self.repo_id,
            source: self.source,
            extra: self.extra,
            temporal: Bitemporal::open(valid_from, tx_from),
        }
    }
}
