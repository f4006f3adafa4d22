//! Orchestrator-level error type.
//!
//! Per-ingestor failures are captured in [`crate::orchestrator::IngestorSummary`]
//! and never abort the build; `BuildError` covers failures that make the
//! build itself impossible (the store is unreachable, the repo path is bad).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("store error: {0}")]
    Store(#[from] arc_store::StoreError),

    #[error("repository path does not exist: {0}")]
    InvalidRepoPath(String),
}

pub type Result<T> = std::result::Result<T, BuildError>;
