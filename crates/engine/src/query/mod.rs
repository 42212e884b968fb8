//! Query compilation and result metadata.

mod compiler;
mod native;

pub use compiler::{QueryCompiler, DELETED_AT_FIELD};
pub use native::{CompositeOp, NativeFilter, NativeOrder, NativeQuery, QueryScope};

use docgraph_domain::DomainItem;
use serde::Serialize;

/// Pagination summary for one executed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    pub total: u64,
    pub returned: u64,
    pub limit: Option<u32>,
    pub offset: u32,
    pub has_more: bool,
}

impl QueryMetadata {
    pub fn new(total: u64, returned: u64, limit: Option<u32>, offset: Option<u32>) -> Self {
        let offset = offset.unwrap_or(0);
        Self {
            total,
            returned,
            limit,
            offset,
            has_more: u64::from(offset) + returned < total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FindResult {
    pub items: Vec<DomainItem>,
    pub metadata: QueryMetadata,
}
