//! The [`Edge`] type: a directed, labeled, versioned relationship.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::EdgeRel;
use crate::temporal::Bitemporal;

/// A single bi-temporal row describing one directed relationship.
///
/// `(src_id, dst_id, rel)` is unique among currently-valid rows; the
/// store enforces this with a partial unique index rather than this
/// type, since the constraint is over "current" rows only. Edges do
/// not carry `repo_id` — only nodes do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub src_id: String,
    pub dst_id: String,
    pub rel: EdgeRel,
    pub properties: BTreeMap<String, Value>,
    pub source: String,
    #[serde(flatten)]
    pub temporal: Bitemporal,
}

impl Edge {
    pub fn is_current(&self) -> bool {
        self.temporal.is_current()
    }

    /// The key used for "currently-valid uniqueness" and for dedup
    /// decisions at ingest time.
    pub fn identity_key(&self) -> (&str, &str, &str) {
        (&self.src_id, &self.dst_id, self.rel.as_str())
    }
}

pub struct EdgeBuilder {
    src_id: String,
    dst_id: String,
    rel: EdgeRel,
    properties: BTreeMap<String, Value>,
    source: String,
}

impl EdgeBuilder {
    pub fn new(
        src_id: impl Into<String>,
        dst_id: impl Into<String>,
        rel: EdgeRel,
        source: impl Into<String>,
    ) -> Self {
        Self {
            src_id: src_id.into(),
            dst_id: dst_id.into(),
            rel,
            properties: BTreeMap::new(),
            source: source.into(),
        }
    }

    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn build(self, valid_from: DateTime<Utc>, tx_from: DateTime<Utc>) -> Edge {
        Edge {
            src_id: self.src_id,
            dst_id: self.dst_id,
            rel: self.rel,
            properties: self.properties,
            source: self.source,
            temporal: Bitemporal::open(valid_from, tx_from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn identity_key_ignores_properties_and_time() {
        let a = EdgeBuilder::new("commit:a", "file:x.rs", EdgeRel::Modifies, "vcs").build(ts(1), ts(1));
        let b = EdgeBuilder::new("commit:a", "file:x.rs", EdgeRel::Modifies, "vcs")
            .property("lines_changed", Value::from(12))
            .build(ts(2), ts(2));
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn distinct_rel_gives_distinct_identity() {
        let modifies = EdgeBuilder::new("commit:a", "file:x.rs", EdgeRel::Modifies, "vcs").build(ts(1), ts(1));
        let mentions = EdgeBuilder::new("commit:a", "file:x.rs", EdgeRel::Mentions, "vcs").build(ts(1), ts(1));
        assert_ne!(modifies.identity_key(), mentions.identity_key());
    }

    #[test]
    fn serde_roundtrip() {
        let edge = EdgeBuilder::new("pr:a/b#1", "issue:ABC-1", EdgeRel::Mentions, "remote").build(ts(1), ts(1));
        let json = serde_json::to_string(&edge).unwrap();
        let back: Edge = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edge);
    }
}
