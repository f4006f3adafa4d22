use std::path::Path;

use arc_store::Storage;
use serde::Serialize;

use crate::context::RuntimeContext;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config_root: String,
    db_path: String,
    schema_version: i32,
    node_count: i64,
    edge_count: i64,
    nodes_by_type: Vec<(String, i64)>,
    watermarks: Vec<(String, serde_json::Value)>,
}

pub fn run(ctx: &RuntimeContext, _repo: &Path) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let stats = store.stats().map_err(arc_query::ArcError::from)?;

    let report = DoctorReport {
        config_root: ctx.config_root.display().to_string(),
        db_path: ctx.db_path.display().to_string(),
        schema_version: stats.schema_version,
        node_count: stats.node_count,
        edge_count: stats.edge_count,
        nodes_by_type: stats.nodes_by_type,
        watermarks: stats.watermarks,
    };

    if ctx.json {
        crate::output::print_json(&report)?;
    } else {
        println!("config root:   {}", report.config_root);
        println!("store:         {}", report.db_path);
        println!("schema:        v{}", report.schema_version);
        println!("nodes:         {}", report.node_count);
        println!("edges:         {}", report.edge_count);
        for (node_type, count) in &report.nodes_by_type {
            println!("  {node_type:<16} {count}");
        }
        println!("watermarks:");
        for (source, value) in &report.watermarks {
            println!("  {source:<12} {value}");
        }
    }
    Ok(())
}
