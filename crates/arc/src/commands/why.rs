use arc_query::QueryFacade;

use crate::cli::WhyTarget;
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, target: WhyTarget) -> anyhow::Result<()> {
    let WhyTarget::Query { text, limit, no_cache } = target;

    let store = ctx.open_store()?;
    let facade = QueryFacade::new(&store, ".");
    let nodes = facade.query(&text, limit, !no_cache)?;

    if ctx.json {
        crate::output::print_json(&nodes)?;
    } else {
        for node in &nodes {
            let title = node.title.as_deref().unwrap_or("");
            println!("{:<28}  {:<12}  {}", node.id, node.node_type.as_str(), title);
        }
    }
    Ok(())
}
