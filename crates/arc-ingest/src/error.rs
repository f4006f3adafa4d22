//! Error types for ingestors.

use thiserror::Error;

/// Errors an [`crate::registry::Ingestor`] can surface from `ingest()`.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The underlying `git` subprocess failed.
    #[error("git error: {0}")]
    Git(#[from] arc_git::GitError),

    /// A remote HTTP call failed.
    #[error("remote request failed: {0}")]
    Http(String),

    /// The remote API reported HTTP 429 more times than the retry budget
    /// allows.
    #[error("rate limited after {attempts} attempts")]
    RateLimited {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Credentials were missing or the remote rejected them. The ingestor
    /// does not interpret the token itself; it only reports that auth
    /// failed.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// A decision record's front matter or body could not be parsed.
    #[error("failed to parse {path}: {reason}")]
    ParseError {
        /// The file that failed to parse.
        path: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Filesystem access failed (e.g. scanning ADR globs).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored watermark JSON could not be interpreted.
    #[error("invalid watermark: {0}")]
    InvalidWatermark(String),
}

/// A specialized `Result` type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
