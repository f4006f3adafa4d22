//! Configuration management for the knowledge graph core.
//!
//! This crate handles loading and saving `<config_root>/config.json`
//! files, discovering `.arc/` directories in the filesystem, and
//! providing typed access to configuration values.

pub mod arc_dir;
pub mod config;

pub use arc_dir::{discover_config_root, ensure_arc_dir, find_arc_dir};
pub use config::{ArcConfig, ConfigError, Result};
