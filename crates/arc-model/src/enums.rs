//! Closed-but-extensible enums for node and edge kinds.
//!
//! Both [`NodeType`] and [`EdgeRel`] are "closed set, extensible by
//! plugins" per the data model: every built-in variant is a known Rust
//! enum case, but an ingestor may tag a node or edge with any other
//! string and it round-trips through [`NodeType::Custom`] /
//! [`EdgeRel::Custom`] without requiring a change to this crate.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + a Custom(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Returns the canonical string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` for any of the built-in (non-custom) variants.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }

            /// Returns `true` for a built-in variant or any non-empty custom tag.
            pub fn is_valid(&self) -> bool {
                match self {
                    Self::$custom_variant(s) => !s.is_empty(),
                    _ => true,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

// ===========================================================================
// NodeType
// ===========================================================================

define_enum! {
    /// Kind of artifact, decision, or concept represented by a node.
    NodeType, custom_variant = Custom,
    variants: [
        (Commit, "commit"),
        (File, "file"),
        (Function, "function"),
        (Class, "class"),
        (Module, "module"),
        (Component, "component"),
        (Service, "service"),
        (Pr, "pr"),
        (Issue, "issue"),
        (Adr, "adr"),
        (Document, "document"),
        (Concept, "concept"),
        (Requirement, "requirement"),
        (ChangePattern, "change_pattern"),
        (Refactoring, "refactoring"),
        (ReasoningNode, "reasoning_node"),
    ]
}

impl NodeType {
    /// Ranking weight used by the trace engine's recency/relevance score.
    /// Higher means "more authoritative as a decision trail endpoint".
    pub fn trace_weight(&self) -> f64 {
        match self {
            Self::Adr => 1.0,
            Self::Issue => 0.8,
            Self::Pr => 0.6,
            Self::Commit => 0.4,
            _ => 0.2,
        }
    }
}

// ===========================================================================
// EdgeRel
// ===========================================================================

define_enum! {
    /// Directed, labeled relationship type between two nodes.
    EdgeRel, custom_variant = Custom,
    variants: [
        (Modifies, "MODIFIES"),
        (Merges, "MERGES"),
        (Mentions, "MENTIONS"),
        (Decides, "DECIDES"),
        (DependsOn, "DEPENDS_ON"),
        (Contains, "CONTAINS"),
        (Calls, "CALLS"),
        (Imports, "IMPORTS"),
        (InheritsFrom, "INHERITS_FROM"),
        (Implements, "IMPLEMENTS"),
        (PartOf, "PART_OF"),
        (Describes, "DESCRIBES"),
        (References, "REFERENCES"),
        (Follows, "FOLLOWS"),
        (Precedes, "PRECEDES"),
        (CorrelatesWith, "CORRELATES_WITH"),
        (RelatedTo, "RELATED_TO"),
    ]
}

impl EdgeRel {
    /// Structural edges the impact engine walks for direct/indirect impact.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DependsOn | Self::Calls | Self::Imports | Self::InheritsFrom | Self::Implements
        )
    }

    /// Edges the trace engine follows outward from a seed commit.
    pub fn is_trace_hop(&self) -> bool {
        matches!(self, Self::Merges | Self::Mentions | Self::Decides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_roundtrip() {
        assert_eq!(NodeType::from("commit"), NodeType::Commit);
        assert_eq!(NodeType::Commit.as_str(), "commit");
        let custom = NodeType::from("widget");
        assert_eq!(custom, NodeType::Custom("widget".into()));
        assert!(custom.is_valid());
        assert!(!custom.is_builtin());
    }

    #[test]
    fn node_type_serde() {
        let json = serde_json::to_string(&NodeType::Adr).unwrap();
        assert_eq!(json, "\"adr\"");
        let back: NodeType = serde_json::from_str("\"pr\"").unwrap();
        assert_eq!(back, NodeType::Pr);
    }

    #[test]
    fn node_type_trace_weight_orders_adr_highest() {
        assert!(NodeType::Adr.trace_weight() > NodeType::Issue.trace_weight());
        assert!(NodeType::Issue.trace_weight() > NodeType::Pr.trace_weight());
        assert!(NodeType::Pr.trace_weight() > NodeType::Commit.trace_weight());
    }

    #[test]
    fn edge_rel_roundtrip() {
        assert_eq!(EdgeRel::from("MODIFIES"), EdgeRel::Modifies);
        assert_eq!(EdgeRel::Modifies.as_str(), "MODIFIES");
        assert_eq!(EdgeRel::from("SOMETHING_ELSE").as_str(), "SOMETHING_ELSE");
    }

    #[test]
    fn edge_rel_classification() {
        assert!(EdgeRel::DependsOn.is_structural());
        assert!(!EdgeRel::Mentions.is_structural());
        assert!(EdgeRel::Merges.is_trace_hop());
        assert!(!EdgeRel::Modifies.is_trace_hop());
    }
}
