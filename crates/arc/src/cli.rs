//! Command-line argument parsing for `arc`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Build, refresh, and query a bi-temporal knowledge graph over a repository.
#[derive(Debug, Parser)]
#[command(name = "arc", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Parser)]
pub struct GlobalArgs {
    /// Overrides the store path. Defaults to `<config_root>/graph.db`.
    #[arg(long, global = true, env = "ARC_DB_PATH")]
    pub db: Option<String>,

    /// Overrides `.arc/` directory discovery.
    #[arg(long, global = true, env = "ARC_CONFIG_DIR")]
    pub config_dir: Option<String>,

    /// Emit machine-readable JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Runs every registered ingestor against a repository and commits the result.
    Build {
        /// Repository to build from. Defaults to the current directory.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Restrict the run to these ingestor names (repeatable).
        #[arg(long = "include")]
        include: Vec<String>,

        /// Skip the semantic-enrichment and reasoning-path-precompute passes.
        #[arg(long)]
        no_post_process: bool,
    },

    /// Incremental build: resumes every ingestor from its last watermark.
    Refresh {
        #[arg(default_value = ".")]
        repo: PathBuf,

        #[arg(long = "include")]
        include: Vec<String>,
    },

    /// Resolves the decision trail behind a source location.
    Trace {
        #[command(subcommand)]
        target: TraceTarget,
    },

    /// Full-text search over current node titles and bodies.
    Why {
        #[command(subcommand)]
        target: WhyTarget,
    },

    /// Lists nodes related to `id`, in both directions.
    Relate {
        id: String,

        #[arg(long, default_value = "both", value_enum)]
        direction: Direction,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Writes a deterministic snapshot of the graph as of a commit.
    Export {
        /// Commit SHA the export window is frozen at.
        sha: String,

        /// Output file path.
        out: PathBuf,

        /// Compress the output with zstd.
        #[arg(long)]
        compress: bool,

        /// HMAC-SHA256 sign the output; writes `<out>.sig` alongside it.
        /// Reads the signing key from `ARC_EXPORT_SIGNING_KEY`.
        #[arg(long)]
        sign: bool,
    },

    /// Reports store health: schema version, counts, watermarks.
    Doctor {
        #[arg(default_value = ".")]
        repo: PathBuf,
    },

    /// Records a credential for a remote ingestor provider.
    Auth {
        /// One of `github`, `linear`, `notion`, `jira`.
        provider: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TraceTarget {
    /// `arc trace file <path> <line>`
    File {
        path: String,
        line: u32,

        #[arg(default_value = ".")]
        repo: PathBuf,

        #[arg(long, default_value_t = 5)]
        max_results: usize,

        #[arg(long, default_value_t = 3)]
        max_hops: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum WhyTarget {
    /// `arc why query <text>`
    Query {
        text: String,

        #[arg(default_value_t = 10)]
        limit: usize,

        /// Bypass the result cache.
        #[arg(long)]
        no_cache: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

impl From<Direction> for arc_query::RelatedDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Outgoing => arc_query::RelatedDirection::Outgoing,
            Direction::Incoming => arc_query::RelatedDirection::Incoming,
            Direction::Both => arc_query::RelatedDirection::Both,
        }
    }
}
