//! Materialization pipeline: one stored document in, one finished item out.
//!
//! Decodes the key from the path, normalizes event timestamps, resolves
//! references then aggregations, and caches the result in the context.

use docgraph_domain::{DomainItem, EntityDefinition, Events, StoredDocument};
use serde_json::{Map, Value};

use crate::codec::{decode_key, strip_key};
use crate::error::EngineError;
use crate::infrastructure::ports::Registry;
use crate::resolution::{
    remove_aggs_from_item, resolve_aggregations, resolve_references, strip_reference_items,
    ResolutionContext,
};

/// Materialize one document.
///
/// Without a caller-supplied context a fresh one is used for this call only.
pub async fn materialize(
    doc: StoredDocument,
    definition: &EntityDefinition,
    registry: &dyn Registry,
    context: Option<&ResolutionContext>,
) -> Result<DomainItem, EngineError> {
    let StoredDocument { path, id, data } = doc;
    let Some(data) = data else {
        return Err(EngineError::data_integrity(format!(
            "document '{}' has no data",
            id
        )));
    };

    let local;
    let context = match context {
        Some(context) => context,
        None => {
            local = ResolutionContext::new();
            &local
        }
    };

    let key = decode_key(
        &StoredDocument {
            path,
            id: id.clone(),
            data: None,
        },
        &definition.type_chain,
    )?;

    let mut item = DomainItem::from_payload(data).map_err(|e| EngineError::from_domain(&id, e))?;
    item.key = Some(key.clone());
    normalize_event_times(&mut item.events).map_err(|e| EngineError::from_domain(&id, e))?;

    let _guard = context.enter(&key);

    resolve_references(&mut item, &definition.references, registry, context).await?;
    resolve_aggregations(&mut item, &definition.aggregations, registry)?;

    context.set_cached(&key, item.clone());
    tracing::debug!(key = %key, "Materialized document");
    Ok(item)
}

/// Materialize a batch with one shared context.
///
/// A failure aborts only the offending document.
pub async fn materialize_all(
    docs: Vec<StoredDocument>,
    definition: &EntityDefinition,
    registry: &dyn Registry,
    context: &ResolutionContext,
) -> Vec<Result<DomainItem, EngineError>> {
    let mut results = Vec::with_capacity(docs.len());
    for doc in docs {
        let id = doc.id.clone();
        let result = materialize(doc, definition, registry, Some(context)).await;
        if let Err(e) = &result {
            tracing::warn!(document_id = %id, error = %e, "Failed to materialize document");
        }
        results.push(result);
    }
    results
}

/// Convert native event timestamps to dates in place. Null `at` values stay null.
pub fn normalize_event_times(events: &mut Events) -> Result<(), docgraph_domain::DomainError> {
    for entry in events.entries_mut() {
        if let Some(at) = entry.at.as_mut().filter(|at| at.is_native()) {
            *at = at.normalized()?;
        }
    }
    Ok(())
}

/// Persisted payload for `item`: no key, key-only references, no `aggs`.
pub fn prepare_for_write(
    item: &DomainItem,
    definition: &EntityDefinition,
) -> Result<Map<String, Value>, EngineError> {
    let mut item = item.clone();
    strip_key(&mut item);
    strip_reference_items(&mut item);
    remove_aggs_from_item(&mut item, &definition.aggregations);
    Ok(item.to_payload()?)
}
