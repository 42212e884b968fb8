//! Document store port.
//!
//! The narrow slice of the backing store the engine relies on: path-based
//! reads plus native query execution and counting.

use async_trait::async_trait;
use docgraph_domain::StoredDocument;

use super::error::RepoError;
use crate::query::NativeQuery;

/// Optional native features of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Native composite OR filters.
    pub composite_or: bool,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self { composite_or: true }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn capabilities(&self) -> BackendCapabilities;

    /// Read the document at `path`; `None` when it does not exist.
    async fn get(&self, path: &[String]) -> Result<Option<StoredDocument>, RepoError>;

    /// Execute a native query, honouring its ordering and pagination.
    async fn query(&self, query: &NativeQuery) -> Result<Vec<StoredDocument>, RepoError>;

    /// Count matches of the query's filters, ignoring offset and limit.
    async fn count(&self, query: &NativeQuery) -> Result<u64, RepoError>;
}
