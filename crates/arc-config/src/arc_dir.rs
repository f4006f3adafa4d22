//! Discovery and management of the `.arc/` directory.
//!
//! The `.arc/` directory is the root of a project's configuration and
//! store metadata. This module provides functions to find it by walking
//! up the directory tree, and to create it when initializing a project.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// The name of the configuration directory.
const ARC_DIR_NAME: &str = ".arc";

/// The name of the environment variable that can override the config
/// directory directly, skipping directory-tree discovery.
const ARC_CONFIG_DIR_ENV: &str = "ARC_CONFIG_DIR";

/// Walk up the directory tree from `start` looking for a `.arc/`
/// directory.
///
/// Returns the path to the `.arc/` directory if found, or `None` if the
/// filesystem root is reached without finding one. The `ARC_CONFIG_DIR`
/// environment variable is checked first (highest priority).
///
/// # Examples
///
/// ```no_run
/// use arc_config::arc_dir::find_arc_dir;
/// use std::path::Path;
///
/// if let Some(dir) = find_arc_dir(Path::new(".")) {
///     println!("Found config dir at {}", dir.display());
/// }
/// ```
pub fn find_arc_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(ARC_CONFIG_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = match start.canonicalize() {
        Ok(p) => p,
        Err(_) => return None,
    };

    let mut current = start.as_path();
    loop {
        let candidate = current.join(ARC_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent;
            }
            _ => break,
        }
    }

    None
}

/// Walk up the directory tree looking for `.arc/`, returning an error if
/// not found.
///
/// # Errors
///
/// Returns [`ConfigError::ArcDirNotFound`] if no `.arc/` directory is
/// found.
pub fn discover_config_root(start: &Path) -> Result<PathBuf, ConfigError> {
    find_arc_dir(start).ok_or(ConfigError::ArcDirNotFound)
}

/// Ensure a `.arc/` directory exists at the given path.
///
/// If `path` itself is not called `.arc`, a `.arc/` subdirectory is
/// created under it. Parent directories are created as needed.
///
/// Returns the path to the `.arc/` directory.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if directory creation fails.
pub fn ensure_arc_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let arc_dir = if path.ends_with(ARC_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(ARC_DIR_NAME)
    };

    std::fs::create_dir_all(&arc_dir)?;
    Ok(arc_dir)
}
