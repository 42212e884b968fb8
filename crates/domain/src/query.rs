//! Abstract item queries.
//!
//! These describe *what* to find; the engine's compiler turns them into the
//! backing store's native filter/sort/paginate form.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::key::CompositeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in")]
    NotIn,
    #[serde(rename = "array-contains")]
    ArrayContains,
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolType {
    And,
    Or,
}

/// A leaf predicate.
///
/// `field` is `None` whenever the input carried no usable string; the compiler
/// rejects such conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "field_path")]
    pub field: Option<String>,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: Some(field.into()),
            operator,
            value: value.into(),
        }
    }
}

fn field_path<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundCondition {
    pub bool_type: BoolType,
    pub conditions: Vec<ConditionNode>,
}

impl CompoundCondition {
    pub fn and(conditions: Vec<ConditionNode>) -> Self {
        Self {
            bool_type: BoolType::And,
            conditions,
        }
    }

    pub fn or(conditions: Vec<ConditionNode>) -> Self {
        Self {
            bool_type: BoolType::Or,
            conditions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Compound(CompoundCondition),
    Condition(Condition),
}

impl From<Condition> for ConditionNode {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

impl From<CompoundCondition> for ConditionNode {
    fn from(compound: CompoundCondition) -> Self {
        Self::Compound(compound)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

/// Time window and optional actor for one named event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventQuery {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub by: Option<CompositeKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuery {
    #[serde(default, rename = "refs")]
    pub reference_filters: BTreeMap<String, CompositeKey>,
    #[serde(default, rename = "events")]
    pub event_filters: BTreeMap<String, EventQuery>,
    #[serde(default)]
    pub compound_condition: Option<ConditionNode>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(mut self, name: impl Into<String>, key: CompositeKey) -> Self {
        self.reference_filters.insert(name.into(), key);
        self
    }

    pub fn with_event(mut self, name: impl Into<String>, window: EventQuery) -> Self {
        self.event_filters.insert(name.into(), window);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<ConditionNode>) -> Self {
        self.compound_condition = Some(condition.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}
