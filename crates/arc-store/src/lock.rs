//! Advisory cross-process write lock.
//!
//! SQLite's own locking handles concurrent access within a WAL-mode
//! database, but it blocks rather than failing fast, and it can't tell a
//! stalled writer from a slow one. A sidecar `.lock` file held with
//! `fs2`'s advisory exclusive lock gives a second writer an immediate,
//! readable error instead of hanging on SQLite's busy timeout.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Result, StoreError};

/// Holds the advisory lock for the lifetime of an open store. Dropping
/// it releases the lock (also released automatically if the process
/// exits uncleanly, since the OS reclaims file locks on process exit).
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquires the exclusive advisory lock at `<db_path>.lock`, failing
    /// immediately (no blocking) if another process already holds it.
    pub fn acquire(db_path: &Path) -> Result<Self> {
        let path = lock_path(db_path);
        let file = OpenOptions::new().create(true).write(true).open(&path)?;
        file.try_lock_exclusive().map_err(|_| {
            StoreError::StoreLocked(format!("another process holds the lock at {}", path.display()))
        })?;
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(db_path: &Path) -> PathBuf {
    let mut os = db_path.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_acquire_fails_fast() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("graph.db");
        let first = StoreLock::acquire(&db_path).unwrap();
        let second = StoreLock::acquire(&db_path);
        assert!(matches!(second, Err(StoreError::StoreLocked(_))));
        drop(first);
        assert!(StoreLock::acquire(&db_path).is_ok());
    }
}
