//! Configuration types and loading for the knowledge graph core.
//!
//! The main entry point is [`ArcConfig`], which represents the contents of
//! `<config_root>/config.json`. Configuration is loaded with
//! [`load_config`] and saved with [`save_config`].

use figment::providers::{Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration file contained invalid JSON, or layering failed.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] figment::Error),

    /// Serializing the config back to JSON failed.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// No `.arc/` directory was found.
    #[error("no .arc directory found (run 'arc build' to create one)")]
    ArcDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Telemetry opt-in. Always round-tripped; never acted on by the core.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TelemetryConfig {
    /// Whether the embedding application should emit telemetry.
    #[serde(default)]
    pub enabled: bool,
}

/// Store-owned configuration: on-disk path and compression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Overrides the store path. Defaults to `<config_root>/graph.db`.
    #[serde(default)]
    pub db_path: Option<String>,

    /// Whether the store file is kept as a `.zst` envelope between runs.
    #[serde(default)]
    pub compress: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { db_path: None, compress: false }
    }
}

/// Ingest-owned configuration: per-source bounds and settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IngestConfig {
    /// Opaque per-source configuration, keyed by ingestor name. Each
    /// ingestor interprets its own entry; the core never inspects it.
    #[serde(default)]
    pub source_configs: BTreeMap<String, Value>,

    /// Maximum number of commits the VCS ingestor will walk.
    #[serde(default)]
    pub max_commits: Option<usize>,

    /// Maximum age in days of commits the VCS ingestor will walk.
    #[serde(default)]
    pub days: Option<u32>,
}

/// Trace Engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceConfig {
    /// Default maximum BFS hop count.
    #[serde(default = "default_trace_max_hops")]
    pub max_hops: u32,

    /// Default maximum number of trail entries returned.
    #[serde(default = "default_trace_max_results")]
    pub max_results: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self { max_hops: default_trace_max_hops(), max_results: default_trace_max_results() }
    }
}

fn default_trace_max_hops() -> u32 {
    3
}

fn default_trace_max_results() -> usize {
    5
}

/// Impact Engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactConfig {
    /// Default maximum BFS hop count.
    #[serde(default = "default_impact_max_hops")]
    pub max_hops: u32,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self { max_hops: default_impact_max_hops() }
    }
}

fn default_impact_max_hops() -> u32 {
    2
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full configuration, corresponding to `<config_root>/config.json`.
///
/// All fields use `serde` defaults so that a partially-specified JSON file
/// deserializes correctly with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ArcConfig {
    /// Telemetry opt-in, owned by the embedding application.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Stable installation identifier, set once and never regenerated.
    #[serde(default)]
    pub installation_id: Option<String>,

    /// Opaque API key map, consumed by ingestor collaborators, never
    /// interpreted by the core.
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,

    /// Opaque settings owned by a simulation collaborator.
    #[serde(default)]
    pub sim: BTreeMap<String, Value>,

    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Ingest configuration.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Trace Engine defaults.
    #[serde(default)]
    pub trace: TraceConfig,

    /// Impact Engine defaults.
    #[serde(default)]
    pub impact: ImpactConfig,

    /// Log verbosity, e.g. `"info"`, `"debug"`. Overridden by `ARC_LOG_LEVEL`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Loads configuration from `<config_root>/config.json`, layering
/// defaults, the on-disk file, and a small set of environment variable
/// overrides recognized directly by the core (`ARC_DB_PATH`,
/// `ARC_LOG_LEVEL`). If the file does not exist, defaults apply.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] if the file contains invalid JSON.
pub fn load_config(config_root: &Path) -> Result<ArcConfig> {
    let config_path = config_root.join("config.json");

    let figment = Figment::from(Serialized::defaults(ArcConfig::default()))
        .merge(Json::file(&config_path));
    let mut config: ArcConfig = figment.extract()?;

    if let Ok(db_path) = std::env::var("ARC_DB_PATH") {
        config.store.db_path = Some(db_path);
    }
    if let Ok(log_level) = std::env::var("ARC_LOG_LEVEL") {
        config.log_level = log_level;
    }

    Ok(config)
}

/// Saves configuration to `<config_root>/config.json`. The directory is
/// created if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] on I/O failure or
/// [`ConfigError::SerializeError`] if serialization fails.
pub fn save_config(config_root: &Path, config: &ArcConfig) -> Result<()> {
    std::fs::create_dir_all(config_root)?;

    let config_path = config_root.join("config.json");
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(config_path, json)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let cfg = ArcConfig::default();
        assert!(cfg.installation_id.is_none());
        assert!(!cfg.telemetry.enabled);
        assert_eq!(cfg.trace.max_hops, 3);
        assert_eq!(cfg.trace.max_results, 5);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let dir = PathBuf::from("/nonexistent/path/.arc");
        let cfg = load_config(&dir).unwrap();
        assert_eq!(cfg, ArcConfig::default());
    }

    #[test]
    fn test_roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let arc_dir = dir.path().join(".arc");

        let mut cfg = ArcConfig::default();
        cfg.installation_id = Some("inst-123".to_string());
        cfg.ingest.max_commits = Some(500);

        save_config(&arc_dir, &cfg).unwrap();
        let loaded = load_config(&arc_dir).unwrap();

        assert_eq!(loaded.installation_id.as_deref(), Some("inst-123"));
        assert_eq!(loaded.ingest.max_commits, Some(500));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let arc_dir = dir.path().join(".arc");
        std::fs::create_dir_all(&arc_dir).unwrap();
        std::fs::write(arc_dir.join("config.json"), r#"{"log_level": "debug"}"#).unwrap();

        let cfg = load_config(&arc_dir).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.trace.max_hops, 3);
    }

    #[test]
    fn test_db_path_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let arc_dir = dir.path().join(".arc");
        unsafe {
            std::env::set_var("ARC_DB_PATH", "/tmp/override.db");
        }
        let cfg = load_config(&arc_dir).unwrap();
        unsafe {
            std::env::remove_var("ARC_DB_PATH");
        }
        assert_eq!(cfg.store.db_path.as_deref(), Some("/tmp/override.db"));
    }
}
