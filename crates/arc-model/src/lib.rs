//! Core graph types shared by every other crate in the workspace:
//! ids, bi-temporal fields, nodes, edges, and content hashing.

pub mod content_hash;
pub mod edge;
pub mod enums;
pub mod id;
pub mod idgen;
pub mod node;
pub mod temporal;

pub use edge::{Edge, EdgeBuilder};
pub use enums::{EdgeRel, NodeType};
pub use node::{Node, NodeBuilder};
pub use temporal::Bitemporal;
