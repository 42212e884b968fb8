//! The backing store's native query form.

use docgraph_domain::{Direction, Operator};
use serde::Serialize;
use serde_json::Value;

/// Where a native query looks for documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QueryScope {
    /// One concrete collection, addressed by its full segment path.
    Collection(Vec<String>),
    /// Every collection with this name, at any depth.
    CollectionGroup(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompositeOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NativeFilter {
    Field {
        field: String,
        op: Operator,
        value: Value,
    },
    Composite {
        op: CompositeOp,
        filters: Vec<NativeFilter>,
    },
}

impl NativeFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Field {
            field: field.into(),
            op: Operator::Eq,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeOrder {
    pub field: String,
    pub direction: Direction,
}

/// A compiled query. `filters` form an implicit conjunction; `offset` is
/// applied before `limit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeQuery {
    pub scope: QueryScope,
    pub filters: Vec<NativeFilter>,
    pub order_by: Vec<NativeOrder>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl NativeQuery {
    pub fn new(scope: QueryScope) -> Self {
        Self {
            scope,
            filters: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    /// Same filters without ordering or pagination, for counting.
    pub fn unpaginated(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            filters: self.filters.clone(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}
