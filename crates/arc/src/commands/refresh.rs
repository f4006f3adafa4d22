use std::path::Path;

use arc_build::{BuildOptions, BuildOrchestrator};
use arc_ingest::Registry;
use tracing::info;

use crate::context::RuntimeContext;

/// Incremental build: every ingestor resumes from its last watermark
/// instead of re-walking from scratch.
pub fn run(ctx: &RuntimeContext, repo: &Path, include: Vec<String>) -> anyhow::Result<()> {
    info!(repo = %repo.display(), "starting incremental refresh");
    let store = ctx.open_store()?;
    let orchestrator = BuildOrchestrator::new(&store, Registry::with_builtins());

    let options = BuildOptions {
        includes: if include.is_empty() { None } else { Some(include) },
        source_configs: ctx.config.ingest.source_configs.clone(),
        incremental: true,
        post_process: true,
    };

    let report = orchestrator.build(repo, &options).map_err(arc_query::ArcError::from)?;

    if ctx.json {
        crate::output::print_json(&report)?;
    } else if !ctx.quiet {
        for summary in &report.ingestors {
            let status = if summary.success { "ok" } else { "failed" };
            println!("{:<10} {:<6} nodes={:<5} edges={:<5}", summary.name, status, summary.nodes_processed, summary.edges_processed);
        }
    }

    if !report.all_succeeded() {
        anyhow::bail!(arc_query::ArcError::IngestorError {
            name: "refresh".to_string(),
            message: "one or more ingestors failed; see report for detail".to_string(),
            retryable: true,
        });
    }
    Ok(())
}
