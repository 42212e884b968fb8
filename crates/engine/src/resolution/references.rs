//! Reference resolution.
//!
//! Populates `refs[name].item` for every declared reference, using the
//! resolution context to memoize fetches and to cut cycles with placeholders.

use docgraph_domain::{CompositeKey, DomainItem, RefEntry, ReferenceDefinition};

use super::context::ResolutionContext;
use crate::error::EngineError;
use crate::infrastructure::ports::{DataSource, Registry};

/// Resolve each declared reference in order. Absent references are skipped.
pub async fn resolve_references(
    item: &mut DomainItem,
    definitions: &[ReferenceDefinition],
    registry: &dyn Registry,
    context: &ResolutionContext,
) -> Result<(), EngineError> {
    for definition in definitions {
        let Some(entry) = item.refs.get(&definition.name) else {
            continue;
        };
        let key = entry.key.clone();

        let type_chain = definition
            .target_type_chain
            .clone()
            .unwrap_or_else(|| key.type_chain());
        if type_chain.is_empty() || type_chain.iter().any(|t| t.trim().is_empty()) {
            return Err(EngineError::configuration(format!(
                "reference '{}' has no usable target type chain",
                definition.name
            )));
        }
        let source = registry.resolve(&type_chain).ok_or_else(|| {
            EngineError::configuration(format!(
                "no data source registered for reference '{}' (type chain {:?})",
                definition.name, type_chain
            ))
        })?;

        let resolved = resolve_key(&key, source.as_ref(), context).await?;
        item.refs.insert(
            definition.name.clone(),
            RefEntry {
                key,
                item: Some(Box::new(resolved)),
            },
        );
    }
    Ok(())
}

/// Cached item, cycle placeholder, or a fresh fetch, in that order.
pub async fn resolve_key(
    key: &CompositeKey,
    source: &dyn DataSource,
    context: &ResolutionContext,
) -> Result<DomainItem, EngineError> {
    if let Some(cached) = context.get_cached(key) {
        tracing::debug!(key = %key, "Reference served from resolution cache");
        return Ok(cached);
    }

    let Some(_guard) = context.try_enter(key) else {
        tracing::debug!(key = %key, "Reference already in progress, using placeholder");
        return Ok(DomainItem::placeholder(key.clone()));
    };

    let item = source.fetch_one(key, context).await?;
    context.set_cached(key, item.clone());
    Ok(item)
}

/// Reduce every reference back to `{key}` before a write.
pub fn strip_reference_items(item: &mut DomainItem) {
    for entry in item.refs.values_mut() {
        entry.item = None;
    }
}
