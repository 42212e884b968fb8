//! Aggregations: derived values moved out of an item's direct fields into
//! `aggs`, and back again before a write.

use std::collections::BTreeMap;

use docgraph_domain::{AggregationDefinition, Cardinality, DomainItem};

use crate::error::EngineError;
use crate::infrastructure::ports::Registry;

/// Check each aggregation's target binding, then move its raw value into `aggs`.
pub fn resolve_aggregations(
    item: &mut DomainItem,
    definitions: &[AggregationDefinition],
    registry: &dyn Registry,
) -> Result<(), EngineError> {
    for definition in definitions {
        if let Some(type_chain) = &definition.target_type_chain {
            if registry.resolve(type_chain).is_none() {
                return Err(EngineError::configuration(format!(
                    "no data source registered for aggregation '{}' (type chain {:?})",
                    definition.name, type_chain
                )));
            }
        }
    }
    add_aggs_to_item(item, definitions);
    Ok(())
}

/// Move each declared source field into `aggs[name]`.
///
/// Missing fields are skipped; `aggs` is only created when something moved.
pub fn add_aggs_to_item(item: &mut DomainItem, definitions: &[AggregationDefinition]) {
    for definition in definitions {
        let Some(value) = item.fields.remove(definition.source_field()) else {
            continue;
        };
        if definition.cardinality == Cardinality::Many && !(value.is_array() || value.is_null()) {
            tracing::debug!(
                aggregation = %definition.name,
                "Aggregation declared as many holds a single value"
            );
        }
        item.aggs
            .get_or_insert_with(BTreeMap::new)
            .insert(definition.name.clone(), value);
    }
}

/// Exact inverse of [`add_aggs_to_item`]: restore flat fields and drop `aggs`.
pub fn remove_aggs_from_item(item: &mut DomainItem, definitions: &[AggregationDefinition]) {
    let Some(mut aggs) = item.aggs.take() else {
        return;
    };
    for definition in definitions.iter().rev() {
        if let Some(value) = aggs.remove(&definition.name) {
            item.fields
                .insert(definition.source_field().to_string(), value);
        }
    }
    if !aggs.is_empty() {
        tracing::debug!(
            undeclared = aggs.len(),
            "Dropping aggregations without a definition"
        );
    }
}
