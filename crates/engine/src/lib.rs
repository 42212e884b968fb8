//! docgraph engine library.
//!
//! Materializes documents from a hierarchical document store into domain
//! items, resolving references across entity types and compiling structured
//! queries into the store's native form.
//!
//! ## Structure
//!
//! - `codec` - Composite keys to and from document paths
//! - `query/` - Query compilation and result metadata
//! - `resolution/` - Resolution context, references and aggregations
//! - `materialize` - The per-document pipeline
//! - `data_source` - Store-backed data sources
//! - `infrastructure/` - Ports and adapters
//! - `app` - Application composition

pub mod app;
pub mod codec;
pub mod data_source;
pub mod error;
pub mod infrastructure;
pub mod materialize;
pub mod query;
pub mod resolution;

pub use app::App;
pub use data_source::StoreDataSource;
pub use error::EngineError;
pub use materialize::{materialize, materialize_all, prepare_for_write};
pub use query::{FindResult, QueryCompiler, QueryMetadata};
pub use resolution::ResolutionContext;
