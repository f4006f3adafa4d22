//! Runtime context for command execution.
//!
//! [`RuntimeContext`] resolves the `.arc/` config root, loads
//! `config.json`, and opens the store. Built once in `main` after CLI
//! parsing, then handed to each command handler.

use std::path::{Path, PathBuf};

use arc_config::{discover_config_root, ensure_arc_dir, ArcConfig};
use arc_store::SqliteStore;

use crate::cli::GlobalArgs;

pub struct RuntimeContext {
    pub config_root: PathBuf,
    pub config: ArcConfig,
    pub db_path: PathBuf,
    pub json: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl RuntimeContext {
    /// Resolves the config root relative to `repo_path`, loads config.json,
    /// and computes the store path. Does not open the store; commands open
    /// it themselves so `doctor`/`build` can report distinct failure modes
    /// for "no store yet" vs. "store is corrupt".
    pub fn resolve(global: &GlobalArgs, repo_path: &Path) -> anyhow::Result<Self> {
        let config_root = match &global.config_dir {
            Some(dir) => {
                let path = PathBuf::from(dir);
                ensure_arc_dir(&path)?
            }
            None => match discover_config_root(repo_path) {
                Ok(root) => root,
                Err(_) => ensure_arc_dir(repo_path)?,
            },
        };

        let mut config = arc_config::config::load_config(&config_root)?;
        if let Some(level) = std::env::var("ARC_LOG_LEVEL").ok() {
            config.log_level = level;
        }

        let db_path = match &global.db {
            Some(explicit) => PathBuf::from(explicit),
            None => match &config.store.db_path {
                Some(configured) => PathBuf::from(configured),
                None => config_root.join("graph.db"),
            },
        };

        Ok(Self { config_root, config, db_path, json: global.json, verbose: global.verbose, quiet: global.quiet })
    }

    pub fn open_store(&self) -> arc_store::error::Result<SqliteStore> {
        SqliteStore::open(&self.db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_creates_arc_dir_when_none_found() {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalArgs { db: None, config_dir: None, json: false, verbose: false, quiet: false };
        let ctx = RuntimeContext::resolve(&global, dir.path()).unwrap();
        assert!(ctx.config_root.ends_with(".arc"));
        assert_eq!(ctx.db_path, ctx.config_root.join("graph.db"));
    }

    #[test]
    fn resolve_honors_explicit_db_override() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("custom.db");
        let global =
            GlobalArgs { db: Some(db.to_string_lossy().into_owned()), config_dir: None, json: false, verbose: false, quiet: false };
        let ctx = RuntimeContext::resolve(&global, dir.path()).unwrap();
        assert_eq!(ctx.db_path, db);
    }
}
