use arc_query::{QueryFacade, RelatedDirection};

use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, id: &str, direction: RelatedDirection, limit: usize) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let facade = QueryFacade::new(&store, ".");
    let related = facade.related(id, direction, limit)?;

    if ctx.json {
        crate::output::print_json(&related)?;
    } else {
        for edge in &related {
            println!("{:<12}  {}", edge.rel, edge.node_id);
        }
    }
    Ok(())
}
