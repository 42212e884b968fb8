//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Document storage (could swap the in-memory store for a hosted backend)
//! - Data sources and their registry (injected into the resolver, never global)

mod error;
mod sources;
mod store;

pub use error::RepoError;
pub use sources::{DataSource, Registry};
pub use store::{BackendCapabilities, DocumentStore};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use sources::MockDataSource;
#[cfg(test)]
pub use store::MockDocumentStore;
