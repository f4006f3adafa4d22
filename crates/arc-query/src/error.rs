//! The closed top-level error taxonomy every other crate's error
//! converges into.
//!
//! Every operation the query facade exposes returns `Result<T, ArcError>`.
//! Sub-crate errors (`StoreError`, `GitError`, `IngestError`, `BuildError`,
//! `ConfigError`) are flattened into the matching `ArcError` variant rather
//! than wrapped, so a caller never has to match on a nested enum to ask
//! "was this not-found" or "should I retry".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArcError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("authentication failed: {0}")]
    AuthError(String),

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("store locked by another process: {0}")]
    StoreLocked(String),

    #[error("store corrupt: {0}")]
    StoreCorrupt(String),

    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: i32, found: i32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation timed out: {operation}")]
    Timeout { operation: String },

    #[error("ingestor {name} failed: {message}")]
    IngestorError { name: String, message: String, retryable: bool },

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ArcError>;

impl ArcError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreLocked(_) | Self::RateLimited { .. } | Self::Timeout { .. } => true,
            Self::IngestorError { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<arc_store::StoreError> for ArcError {
    fn from(e: arc_store::StoreError) -> Self {
        use arc_store::StoreError as S;
        match e {
            S::NotFound { entity, id } => Self::NotFound { entity, id },
            S::StoreLocked(msg) => Self::StoreLocked(msg),
            S::Migration { name, reason } => Self::StoreCorrupt(format!("migration {name} failed: {reason}")),
            S::Compression(msg) => Self::StoreCorrupt(msg),
            S::NotInitialized { reason } => Self::StoreCorrupt(reason),
            S::Validation { message } => Self::InvalidInput(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<arc_git::GitError> for ArcError {
    fn from(e: arc_git::GitError) -> Self {
        use arc_git::GitError as G;
        match e {
            G::NotARepo => Self::InvalidInput("not a git repository".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<arc_ingest::IngestError> for ArcError {
    fn from(e: arc_ingest::IngestError) -> Self {
        use arc_ingest::IngestError as I;
        match e {
            I::AuthError(msg) => Self::AuthError(msg),
            I::RateLimited { attempts } => Self::RateLimited { attempts },
            other => Self::IngestorError { name: "ingest".to_string(), message: other.to_string(), retryable: false },
        }
    }
}

impl From<arc_build::BuildError> for ArcError {
    fn from(e: arc_build::BuildError) -> Self {
        use arc_build::BuildError as B;
        match e {
            B::Store(store_err) => store_err.into(),
            B::InvalidRepoPath(path) => Self::InvalidInput(format!("repository path does not exist: {path}")),
        }
    }
}

impl From<arc_config::ConfigError> for ArcError {
    fn from(e: arc_config::ConfigError) -> Self {
        use arc_config::ConfigError as C;
        match e {
            C::ArcDirNotFound => Self::NotFound { entity: "config".to_string(), id: ".arc".to_string() },
            C::InvalidValue { key, reason } => Self::InvalidInput(format!("{key}: {reason}")),
            other => Self::Internal(other.to_string()),
        }
    }
}
