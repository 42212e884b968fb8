//! In-memory document store for development, fixtures and testing.
//!
//! Documents are kept in path order. Native queries are evaluated directly
//! against the stored JSON; nothing is persisted.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use docgraph_domain::{Direction, NativeTimestamp, Operator, StoredDocument};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::ports::{BackendCapabilities, DocumentStore, RepoError};
use crate::query::{CompositeOp, NativeFilter, NativeOrder, NativeQuery, QueryScope};

pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<BTreeMap<Vec<String>, Map<String, Value>>>>,
    capabilities: BackendCapabilities,
}

impl InMemoryDocumentStore {
    pub fn new(capabilities: BackendCapabilities) -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            capabilities,
        }
    }

    /// Write `data` at `path`, replacing whatever was there.
    ///
    /// Document paths alternate collection and id, so they have even length.
    pub async fn insert(
        &self,
        path: Vec<String>,
        data: Map<String, Value>,
    ) -> Result<(), RepoError> {
        if path.is_empty() || path.len() % 2 != 0 {
            return Err(RepoError::Validation(format!(
                "document path {:?} must alternate collection and id",
                path
            )));
        }
        self.documents.write().await.insert(path, data);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    async fn matching(&self, query: &NativeQuery) -> Result<Vec<StoredDocument>, RepoError> {
        if !self.capabilities.composite_or && query.filters.iter().any(contains_or) {
            return Err(RepoError::from_backend_code(
                "UNIMPLEMENTED",
                "query",
                "composite OR filters are not supported",
            ));
        }
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|(path, _)| in_scope(path, &query.scope))
            .filter(|(_, data)| query.filters.iter().all(|f| matches_filter(data, f)))
            .map(|(path, data)| StoredDocument::new(path.clone(), Some(data.clone())))
            .collect())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    async fn get(&self, path: &[String]) -> Result<Option<StoredDocument>, RepoError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(path)
            .map(|data| StoredDocument::new(path.to_vec(), Some(data.clone()))))
    }

    async fn query(&self, query: &NativeQuery) -> Result<Vec<StoredDocument>, RepoError> {
        let mut docs = self.matching(query).await?;
        if !query.order_by.is_empty() {
            // stable: ties keep path order
            docs.sort_by(|a, b| compare_documents(a, b, &query.order_by));
        }
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(docs.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, query: &NativeQuery) -> Result<u64, RepoError> {
        Ok(self.matching(query).await?.len() as u64)
    }
}

fn contains_or(filter: &NativeFilter) -> bool {
    match filter {
        NativeFilter::Field { .. } => false,
        NativeFilter::Composite { op, filters } => {
            *op == CompositeOp::Or || filters.iter().any(contains_or)
        }
    }
}

fn in_scope(path: &[String], scope: &QueryScope) -> bool {
    match scope {
        QueryScope::Collection(collection) => {
            path.len() == collection.len() + 1 && path.starts_with(collection)
        }
        QueryScope::CollectionGroup(name) => path.len() >= 2 && path[path.len() - 2] == *name,
    }
}

/// Walk a dotted field path; numeric segments index into arrays.
fn lookup<'a>(data: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    let mut segments = field.split('.');
    let mut current = data.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn matches_filter(data: &Map<String, Value>, filter: &NativeFilter) -> bool {
    match filter {
        NativeFilter::Composite { op, filters } => match op {
            CompositeOp::And => filters.iter().all(|f| matches_filter(data, f)),
            CompositeOp::Or => filters.iter().any(|f| matches_filter(data, f)),
        },
        NativeFilter::Field { field, op, value } => {
            let actual = lookup(data, field);
            matches_field(actual, *op, value)
        }
    }
}

fn matches_field(actual: Option<&Value>, op: Operator, expected: &Value) -> bool {
    // A missing field only equals null.
    let null = Value::Null;
    match op {
        Operator::Eq => compare_values(actual.unwrap_or(&null), expected) == Some(Ordering::Equal),
        Operator::NotEq => {
            compare_values(actual.unwrap_or(&null), expected) != Some(Ordering::Equal)
        }
        Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
            let Some(ordering) = actual.and_then(|a| compare_values(a, expected)) else {
                return false;
            };
            match op {
                Operator::Lt => ordering == Ordering::Less,
                Operator::Lte => ordering != Ordering::Greater,
                Operator::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }
        }
        Operator::In => {
            let actual = actual.unwrap_or(&null);
            expected
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c)))
        }
        Operator::NotIn => {
            let Some(actual) = actual else {
                return false;
            };
            expected
                .as_array()
                .is_some_and(|candidates| !candidates.iter().any(|c| values_equal(actual, c)))
        }
        Operator::ArrayContains => actual
            .and_then(Value::as_array)
            .is_some_and(|items| items.iter().any(|i| values_equal(i, expected))),
        Operator::ArrayContainsAny => {
            let (Some(items), Some(candidates)) =
                (actual.and_then(Value::as_array), expected.as_array())
            else {
                return false;
            };
            items
                .iter()
                .any(|i| candidates.iter().any(|c| values_equal(i, c)))
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal)
}

/// Order two values of the same kind; `None` when they are not comparable.
///
/// Timestamps compare by instant whether stored natively or as RFC3339 text.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if is_timestamp_like(a) || is_timestamp_like(b) {
        if let (Some(x), Some(y)) = (NativeTimestamp::from_value(a), NativeTimestamp::from_value(b))
        {
            return Some(x.cmp(&y));
        }
    }
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            (a == b).then_some(Ordering::Equal)
        }
        _ => None,
    }
}

fn is_timestamp_like(value: &Value) -> bool {
    value.is_object() && NativeTimestamp::from_value(value).is_some()
}

/// Rank for values of different kinds, so sorting is total.
fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare_documents(a: &StoredDocument, b: &StoredDocument, order_by: &[NativeOrder]) -> Ordering {
    let empty = Map::new();
    let a_data = a.data.as_ref().unwrap_or(&empty);
    let b_data = b.data.as_ref().unwrap_or(&empty);
    for order in order_by {
        let x = lookup(a_data, &order.field);
        let y = lookup(b_data, &order.field);
        let ordering = match (x, y) {
            (Some(x), Some(y)) => compare_values(x, y),
            _ => None,
        }
        .unwrap_or_else(|| kind_rank(x).cmp(&kind_rank(y)));
        let ordering = match order.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
