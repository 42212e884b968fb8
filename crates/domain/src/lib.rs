//! docgraph domain model.
//!
//! Pure data types shared by the engine: composite keys, stored documents,
//! materialized items, abstract queries and entity schema definitions. No I/O.

pub mod definition;
pub mod document;
pub mod error;
pub mod item;
pub mod key;
pub mod query;
pub mod time;

pub use definition::{AggregationDefinition, Cardinality, EntityDefinition, ReferenceDefinition};
pub use document::StoredDocument;
pub use error::DomainError;
pub use item::{DomainItem, EventEntry, Events, RefEntry};
pub use key::{CompositeKey, LocKey};
pub use query::{
    BoolType, CompoundCondition, Condition, ConditionNode, Direction, EventQuery, ItemQuery,
    Operator, OrderBy,
};
pub use time::{EventTime, NativeTimestamp};
