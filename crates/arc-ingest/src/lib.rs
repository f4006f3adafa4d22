//! Ingestor trait, Registry, and the VCS/remote-issue/decision-record
//! built-ins that turn external sources into graph nodes and edges.

pub mod adr;
pub mod error;
pub mod registry;
pub mod remote;
pub mod vcs;

pub use adr::AdrIngestor;
pub use error::IngestError;
pub use registry::{IngestResult, Ingestor, Registry};
pub use remote::{NoToken, RemoteIngestor, TokenSource};
pub use vcs::VcsIngestor;
