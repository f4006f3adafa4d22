//! Trace/Impact engines, the Query Facade, result caching, and
//! deterministic export -- the read and write surface embedding
//! applications and the `arc` CLI call through.

pub mod cache;
pub mod error;
pub mod export;
pub mod facade;
pub mod impact;
pub mod trace;

pub use error::{ArcError, Result};
pub use export::{ExportOptions, Snapshot};
pub use facade::{QueryFacade, RelatedDirection, RelatedEdge};
pub use impact::{ImpactResult, ImpactType};
pub use trace::TrailEntry;
