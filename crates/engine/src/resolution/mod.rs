//! Graph resolution: the per-request context plus reference and aggregation
//! resolvers built on it.

mod aggregations;
mod context;
mod references;

pub use aggregations::{add_aggs_to_item, remove_aggs_from_item, resolve_aggregations};
pub use context::{InProgressGuard, ResolutionContext};
pub use references::{resolve_key, resolve_references, strip_reference_items};
