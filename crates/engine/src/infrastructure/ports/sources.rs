//! Data source and registry ports used by the graph resolver.

use std::sync::Arc;

use async_trait::async_trait;
use docgraph_domain::{CompositeKey, DomainItem, ItemQuery, LocKey};

use crate::error::EngineError;
use crate::resolution::ResolutionContext;

/// Fetches materialized items of one entity type.
///
/// The resolution context is threaded through so nested materialization
/// shares the caller's cache and cycle tracking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_one(
        &self,
        key: &CompositeKey,
        context: &ResolutionContext,
    ) -> Result<DomainItem, EngineError>;

    async fn fetch_many(
        &self,
        query: &ItemQuery,
        location: &[LocKey],
        context: &ResolutionContext,
    ) -> Result<Vec<DomainItem>, EngineError>;
}

/// Maps a type chain to the data source serving it.
pub trait Registry: Send + Sync {
    fn resolve(&self, type_chain: &[String]) -> Option<Arc<dyn DataSource>>;
}
