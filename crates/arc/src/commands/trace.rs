use arc_query::QueryFacade;

use crate::cli::TraceTarget;
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, target: TraceTarget) -> anyhow::Result<()> {
    let TraceTarget::File { path, line, repo, max_results, max_hops } = target;

    let store = ctx.open_store()?;
    let facade = QueryFacade::new(&store, &repo);
    let trail = facade.decision_trail(&path, line, max_results, max_hops)?;

    if ctx.json {
        crate::output::print_json(&trail)?;
    } else {
        for entry in &trail {
            let title = entry.title.as_deref().unwrap_or("");
            println!("{:>2}  {:<28}  score={:.3}  {}", entry.trail_position, entry.node_id, entry.score, title);
        }
    }
    Ok(())
}
