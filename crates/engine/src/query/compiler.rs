//! Compiles abstract item queries into native store queries.

use docgraph_domain::{
    BoolType, CompositeKey, Condition, ConditionNode, EventQuery, ItemQuery, NativeTimestamp,
    Operator,
};
use serde_json::Value;

use super::native::{CompositeOp, NativeFilter, NativeOrder, NativeQuery, QueryScope};
use crate::error::EngineError;
use crate::infrastructure::ports::BackendCapabilities;

/// Soft-deleted documents carry a timestamp here; live ones hold null.
pub const DELETED_AT_FIELD: &str = "events.deleted.at";

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler {
    capabilities: BackendCapabilities,
}

impl QueryCompiler {
    pub fn new(capabilities: BackendCapabilities) -> Self {
        Self { capabilities }
    }

    /// Translate `query` into a native query over `scope`.
    ///
    /// The condition tree is checked in full before any predicate is built.
    pub fn compile(&self, query: &ItemQuery, scope: QueryScope) -> Result<NativeQuery, EngineError> {
        if let Some(node) = &query.compound_condition {
            self.check_node(node)?;
        }
        for order in &query.order_by {
            if order.field.trim().is_empty() {
                return Err(EngineError::validation("orderBy field must not be blank"));
            }
        }

        let mut native = NativeQuery::new(scope);
        native.filters.push(NativeFilter::eq(DELETED_AT_FIELD, Value::Null));

        for (name, key) in &query.reference_filters {
            push_key_predicates(&format!("refs.{}.key", name), key, &mut native.filters);
        }
        for (name, window) in &query.event_filters {
            push_event_predicates(name, window, &mut native.filters);
        }
        if let Some(node) = &query.compound_condition {
            flatten_into(node, &mut native.filters);
        }

        native.order_by = query
            .order_by
            .iter()
            .map(|order| NativeOrder {
                field: order.field.clone(),
                direction: order.direction,
            })
            .collect();
        native.offset = query.offset;
        native.limit = query.limit;

        tracing::debug!(
            filters = native.filters.len(),
            orders = native.order_by.len(),
            offset = ?native.offset,
            limit = ?native.limit,
            "Compiled item query"
        );
        Ok(native)
    }

    fn check_node(&self, node: &ConditionNode) -> Result<(), EngineError> {
        match node {
            ConditionNode::Condition(condition) => check_field(condition),
            ConditionNode::Compound(compound) => {
                if compound.bool_type == BoolType::Or {
                    if !self.capabilities.composite_or {
                        return Err(EngineError::unsupported(
                            "OR conditions require native composite-OR support, which this backend lacks",
                        ));
                    }
                    if compound.conditions.is_empty() {
                        return Err(EngineError::validation(
                            "OR condition must have at least one child",
                        ));
                    }
                }
                compound
                    .conditions
                    .iter()
                    .try_for_each(|child| self.check_node(child))
            }
        }
    }
}

fn check_field(condition: &Condition) -> Result<(), EngineError> {
    match condition.field.as_deref() {
        Some(field) if !field.trim().is_empty() => Ok(()),
        Some(_) => Err(EngineError::validation("condition field must not be blank")),
        None => Err(EngineError::validation(
            "condition field must be a non-empty string",
        )),
    }
}

fn field_filter(condition: &Condition) -> NativeFilter {
    NativeFilter::Field {
        field: condition.field.clone().unwrap_or_default(),
        op: condition.operator,
        value: condition.value.clone(),
    }
}

/// AND nodes merge into `out`; anything else becomes one filter.
fn flatten_into(node: &ConditionNode, out: &mut Vec<NativeFilter>) {
    match node {
        ConditionNode::Compound(compound) if compound.bool_type == BoolType::And => {
            for child in &compound.conditions {
                flatten_into(child, out);
            }
        }
        other => out.push(branch(other)),
    }
}

fn branch(node: &ConditionNode) -> NativeFilter {
    match node {
        ConditionNode::Condition(condition) => field_filter(condition),
        ConditionNode::Compound(compound) => match compound.bool_type {
            BoolType::And => {
                let mut filters = Vec::new();
                flatten_into(node, &mut filters);
                if filters.len() == 1 {
                    filters.remove(0)
                } else {
                    NativeFilter::Composite {
                        op: CompositeOp::And,
                        filters,
                    }
                }
            }
            BoolType::Or => NativeFilter::Composite {
                op: CompositeOp::Or,
                filters: compound.conditions.iter().map(branch).collect(),
            },
        },
    }
}

/// Equality on every component of `key` below `prefix`.
///
/// Absent location values do not constrain the match.
fn push_key_predicates(prefix: &str, key: &CompositeKey, out: &mut Vec<NativeFilter>) {
    out.push(NativeFilter::eq(format!("{}.type", prefix), key.key_type.clone()));
    out.push(NativeFilter::eq(
        format!("{}.primaryValue", prefix),
        key.primary_value.clone(),
    ));
    for (i, loc) in key.location.iter().enumerate() {
        out.push(NativeFilter::eq(
            format!("{}.location.{}.type", prefix, i),
            loc.key_type.clone(),
        ));
        if let Some(value) = &loc.value {
            out.push(NativeFilter::eq(
                format!("{}.location.{}.value", prefix, i),
                value.clone(),
            ));
        }
    }
}

fn push_event_predicates(name: &str, window: &EventQuery, out: &mut Vec<NativeFilter>) {
    let at = format!("events.{}.at", name);
    if let Some(start) = window.start {
        out.push(NativeFilter::Field {
            field: at.clone(),
            op: Operator::Gte,
            value: NativeTimestamp::from_datetime(start).to_value(),
        });
    }
    if let Some(end) = window.end {
        out.push(NativeFilter::Field {
            field: at,
            op: Operator::Lt,
            value: NativeTimestamp::from_datetime(end).to_value(),
        });
    }
    if let Some(by) = &window.by {
        push_key_predicates(&format!("events.{}.by", name), by, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use docgraph_domain::{CompoundCondition, Direction, LocKey};
    use serde_json::json;

    fn scope() -> QueryScope {
        QueryScope::Collection(vec!["customer".to_string()])
    }

    fn compiler(composite_or: bool) -> QueryCompiler {
        QueryCompiler::new(BackendCapabilities { composite_or })
    }

    fn not_deleted() -> NativeFilter {
        NativeFilter::eq(DELETED_AT_FIELD, Value::Null)
    }

    #[test]
    fn test_paginated_ordered_query() {
        let query = ItemQuery::new()
            .with_limit(10)
            .with_offset(5)
            .order_by("name", Direction::Asc);

        let native = compiler(true).compile(&query, scope()).unwrap();

        assert_eq!(native.filters, vec![not_deleted()]);
        assert_eq!(
            native.order_by,
            vec![NativeOrder {
                field: "name".to_string(),
                direction: Direction::Asc
            }]
        );
        assert_eq!(native.offset, Some(5));
        assert_eq!(native.limit, Some(10));
    }

    #[test]
    fn test_unpaginated_keeps_filters_only() {
        let query = ItemQuery::new()
            .with_limit(10)
            .with_offset(5)
            .with_condition(Condition::new("status", Operator::Eq, "open"));

        let native = compiler(true).compile(&query, scope()).unwrap();
        let count = native.unpaginated();

        assert_eq!(count.filters, native.filters);
        assert!(!count.is_paginated());
        assert!(count.order_by.is_empty());
    }

    #[test]
    fn test_order_by_is_kept_verbatim() {
        let query = ItemQuery::new()
            .order_by("b", Direction::Desc)
            .order_by("a", Direction::Asc)
            .order_by("b", Direction::Asc);
        let native = compiler(true).compile(&query, scope()).unwrap();
        let fields: Vec<_> = native.order_by.iter().map(|o| o.field.as_str()).collect();
        assert_eq!(fields, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_or_without_native_support_is_rejected() {
        let query = ItemQuery::new().with_condition(CompoundCondition::or(vec![
            Condition::new("a", Operator::Eq, 1).into(),
            Condition::new("b", Operator::Eq, 2).into(),
        ]));

        let err = compiler(false).compile(&query, scope()).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_nested_or_without_native_support_is_rejected() {
        let query = ItemQuery::new().with_condition(CompoundCondition::and(vec![
            Condition::new("a", Operator::Eq, 1).into(),
            CompoundCondition::or(vec![Condition::new("b", Operator::Eq, 2).into()]).into(),
        ]));
        let err = compiler(false).compile(&query, scope()).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_and_nodes_flatten_recursively() {
        let query = ItemQuery::new().with_condition(CompoundCondition::and(vec![
            Condition::new("a", Operator::Eq, 1).into(),
            CompoundCondition::and(vec![
                Condition::new("b", Operator::Gt, 2).into(),
                CompoundCondition::and(vec![Condition::new("c", Operator::Lt, 3).into()]).into(),
            ])
            .into(),
        ]));

        let native = compiler(false).compile(&query, scope()).unwrap();

        assert_eq!(
            native.filters,
            vec![
                not_deleted(),
                NativeFilter::eq("a", 1),
                NativeFilter::Field {
                    field: "b".into(),
                    op: Operator::Gt,
                    value: json!(2)
                },
                NativeFilter::Field {
                    field: "c".into(),
                    op: Operator::Lt,
                    value: json!(3)
                },
            ]
        );
    }

    #[test]
    fn test_or_inside_and_becomes_one_composite() {
        let query = ItemQuery::new().with_condition(CompoundCondition::and(vec![
            Condition::new("status", Operator::Eq, "open").into(),
            CompoundCondition::or(vec![
                Condition::new("priority", Operator::Eq, "high").into(),
                CompoundCondition::and(vec![
                    Condition::new("priority", Operator::Eq, "low").into(),
                    Condition::new("escalated", Operator::Eq, true).into(),
                ])
                .into(),
            ])
            .into(),
        ]));

        let native = compiler(true).compile(&query, scope()).unwrap();

        assert_eq!(
            native.filters,
            vec![
                not_deleted(),
                NativeFilter::eq("status", "open"),
                NativeFilter::Composite {
                    op: CompositeOp::Or,
                    filters: vec![
                        NativeFilter::eq("priority", "high"),
                        NativeFilter::Composite {
                            op: CompositeOp::And,
                            filters: vec![
                                NativeFilter::eq("priority", "low"),
                                NativeFilter::eq("escalated", true),
                            ],
                        },
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_missing_or_blank_field_is_validation_error() {
        for field in [None, Some("".to_string()), Some("   ".to_string())] {
            let condition = Condition {
                field,
                operator: Operator::Eq,
                value: json!(1),
            };
            let query = ItemQuery::new().with_condition(condition);
            let err = compiler(true).compile(&query, scope()).unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
    }

    #[test]
    fn test_non_string_field_from_json_is_validation_error() {
        let query: ItemQuery = serde_json::from_value(json!({
            "compoundCondition": {"field": 12, "operator": "==", "value": 1}
        }))
        .unwrap();
        let err = compiler(true).compile(&query, scope()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_reference_filter_expands_key_components() {
        let key = CompositeKey::new("order", "o1").with_location(vec![LocKey::new("customer", "c1")]);
        let query = ItemQuery::new().with_reference("order", key);

        let native = compiler(true).compile(&query, scope()).unwrap();

        assert_eq!(
            native.filters,
            vec![
                not_deleted(),
                NativeFilter::eq("refs.order.key.type", "order"),
                NativeFilter::eq("refs.order.key.primaryValue", "o1"),
                NativeFilter::eq("refs.order.key.location.0.type", "customer"),
                NativeFilter::eq("refs.order.key.location.0.value", "c1"),
            ]
        );
    }

    #[test]
    fn test_event_filter_emits_range_and_actor() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let query = ItemQuery::new().with_event(
            "created",
            EventQuery {
                start: Some(start),
                end: Some(end),
                by: Some(CompositeKey::new("user", "u1")),
            },
        );

        let native = compiler(true).compile(&query, scope()).unwrap();

        assert_eq!(
            native.filters,
            vec![
                not_deleted(),
                NativeFilter::Field {
                    field: "events.created.at".into(),
                    op: Operator::Gte,
                    value: NativeTimestamp::from_datetime(start).to_value(),
                },
                NativeFilter::Field {
                    field: "events.created.at".into(),
                    op: Operator::Lt,
                    value: NativeTimestamp::from_datetime(end).to_value(),
                },
                NativeFilter::eq("events.created.by.type", "user"),
                NativeFilter::eq("events.created.by.primaryValue", "u1"),
            ]
        );
    }
}
