//! Build orchestrator: runs registered ingestors against a repository,
//! applies their output to a store transactionally, and runs optional
//! post-processing passes.

pub mod error;
pub mod orchestrator;

pub use error::BuildError;
pub use orchestrator::{BuildOptions, BuildOrchestrator, BuildReport, IngestorSummary, PostProcessSummary};
