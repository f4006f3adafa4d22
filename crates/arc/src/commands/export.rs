use std::path::Path;

use arc_query::{ExportOptions, QueryFacade};
use chrono::Utc;

use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, sha: &str, out: &Path, compress: bool, sign: bool) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let facade = QueryFacade::new(&store, ".");

    let options = ExportOptions { pr_sha: Some(sha.to_string()), ..Default::default() };
    let snapshot = facade.export(options, Utc::now())?;

    let bytes = arc_query::export::serialize_canonical(&snapshot)?;
    let bytes = if compress { arc_query::export::compress(&bytes)? } else { bytes };
    std::fs::write(out, &bytes)?;

    if sign {
        let key = std::env::var("ARC_EXPORT_SIGNING_KEY")
            .map_err(|_| anyhow::anyhow!("ARC_EXPORT_SIGNING_KEY must be set to sign an export"))?;
        let signature = arc_query::export::sign(&bytes, key.as_bytes());
        let sig_path = format!("{}.sig", out.display());
        std::fs::write(sig_path, signature)?;
    }

    if !ctx.quiet {
        println!("wrote {} entities, {} relationships to {}", snapshot.entities.len(), snapshot.relationships.len(), out.display());
    }
    Ok(())
}
