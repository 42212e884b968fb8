//! Key codec: composite keys to and from hierarchical document paths.
//!
//! A document path alternates collection and document segments, root first.
//! Each ancestor level therefore sits two segments above the level below it.

use docgraph_domain::{CompositeKey, DomainItem, LocKey, StoredDocument};

use crate::error::EngineError;
use crate::query::QueryScope;

/// Rebuild a document's composite key from its path.
///
/// Location `i` is the id found `2 * (i + 1)` segments above the document.
/// Paths too shallow for the declared chain leave trailing values absent.
pub fn decode_key(doc: &StoredDocument, type_chain: &[String]) -> Result<CompositeKey, EngineError> {
    let (primary_type, location_types) = type_chain
        .split_first()
        .ok_or_else(|| EngineError::configuration("cannot decode a key with an empty type chain"))?;

    let location = location_types
        .iter()
        .enumerate()
        .map(|(i, key_type)| LocKey {
            key_type: key_type.clone(),
            value: doc.ancestor(2 * (i + 1)).map(str::to_string),
        })
        .collect::<Vec<_>>();

    if location.iter().any(|loc| loc.value.is_none()) {
        tracing::debug!(
            document_id = %doc.id,
            depth = doc.path.len(),
            expected_levels = location_types.len(),
            "Document path is shallower than its type chain"
        );
    }

    Ok(CompositeKey::new(primary_type.clone(), doc.id.clone()).with_location(location))
}

/// Remove the path-derived key before a write.
pub fn strip_key(item: &mut DomainItem) -> Option<CompositeKey> {
    item.key.take()
}

/// Segment path addressing the document a key identifies.
///
/// Collection segments use the type tags; the outermost location comes first.
pub fn encode_path(key: &CompositeKey) -> Result<Vec<String>, EngineError> {
    let mut path = location_segments(&key.location).map_err(|missing| {
        EngineError::data_integrity(format!(
            "key {} has no value for location '{}'",
            key, missing
        ))
    })?;
    path.push(key.key_type.clone());
    path.push(key.primary_value.clone());
    Ok(path)
}

/// Scope for querying items of `type_chain`.
///
/// With a location the scope is the concrete parent collection; without one,
/// nested types are searched across all parents.
pub fn collection_scope(type_chain: &[String], location: &[LocKey]) -> Result<QueryScope, EngineError> {
    let (primary_type, location_types) = type_chain
        .split_first()
        .ok_or_else(|| EngineError::configuration("cannot query with an empty type chain"))?;

    if location.is_empty() {
        return Ok(if location_types.is_empty() {
            QueryScope::Collection(vec![primary_type.clone()])
        } else {
            QueryScope::CollectionGroup(primary_type.clone())
        });
    }

    if location.len() != location_types.len() {
        return Err(EngineError::validation(format!(
            "location has {} levels but type chain {:?} needs {}",
            location.len(),
            type_chain,
            location_types.len()
        )));
    }
    for (loc, expected) in location.iter().zip(location_types) {
        if &loc.key_type != expected {
            return Err(EngineError::validation(format!(
                "location type '{}' does not match type chain entry '{}'",
                loc.key_type, expected
            )));
        }
    }

    let mut path = location_segments(location).map_err(|missing| {
        EngineError::validation(format!("location '{}' has no value", missing))
    })?;
    path.push(primary_type.clone());
    Ok(QueryScope::Collection(path))
}

/// Outermost-first `[type, value, ...]` pairs; `Err` names the first absent level.
fn location_segments(location: &[LocKey]) -> Result<Vec<String>, String> {
    let mut path = Vec::with_capacity(location.len() * 2 + 2);
    for loc in location.iter().rev() {
        let value = loc.value.as_ref().ok_or_else(|| loc.key_type.clone())?;
        path.push(loc.key_type.clone());
        path.push(value.clone());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(types: &[&str]) -> Vec<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    fn doc(path: &[&str]) -> StoredDocument {
        StoredDocument::new(path.iter().map(|s| s.to_string()).collect(), None)
    }

    #[test]
    fn test_decodes_primary_only_key() {
        let key = decode_key(&doc(&["customer", "c1"]), &chain(&["customer"])).unwrap();
        assert_eq!(key, CompositeKey::new("customer", "c1"));
    }

    #[test]
    fn test_decodes_locations_at_expected_depths() {
        let key = decode_key(
            &doc(&["region", "r1", "customer", "c1", "order", "o1"]),
            &chain(&["order", "customer", "region"]),
        )
        .unwrap();

        assert_eq!(key.primary_value, "o1");
        assert_eq!(
            key.location,
            vec![LocKey::new("customer", "c1"), LocKey::new("region", "r1")]
        );
    }

    #[test]
    fn test_decodes_arbitrarily_deep_chains() {
        let depth = 7;
        let mut segments = Vec::new();
        for level in (0..depth).rev() {
            segments.push(format!("t{}", level));
            segments.push(format!("id{}", level));
        }
        let types: Vec<String> = (0..depth).map(|level| format!("t{}", level)).collect();
        let document = StoredDocument::new(segments, None);

        let key = decode_key(&document, &types).unwrap();

        assert_eq!(key.primary_value, "id0");
        assert_eq!(key.location.len(), depth - 1);
        for (i, loc) in key.location.iter().enumerate() {
            assert_eq!(loc.key_type, format!("t{}", i + 1));
            assert_eq!(loc.value.as_deref(), Some(format!("id{}", i + 1).as_str()));
        }
    }

    #[test]
    fn test_shallow_path_leaves_trailing_locations_absent() {
        let key = decode_key(
            &doc(&["customer", "c1", "order", "o1"]),
            &chain(&["order", "customer", "region"]),
        )
        .unwrap();

        assert_eq!(
            key.location,
            vec![LocKey::new("customer", "c1"), LocKey::absent("region")]
        );
    }

    #[test]
    fn test_empty_type_chain_is_configuration_error() {
        let err = decode_key(&doc(&["a", "1"]), &[]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_encode_path_inverts_decode() {
        let document = doc(&["region", "r1", "customer", "c1", "order", "o1"]);
        let key = decode_key(&document, &chain(&["order", "customer", "region"])).unwrap();
        assert_eq!(encode_path(&key).unwrap(), document.path);
    }

    #[test]
    fn test_encode_path_rejects_absent_location() {
        let key = CompositeKey::new("order", "o1").with_location(vec![LocKey::absent("customer")]);
        assert!(matches!(encode_path(&key), Err(EngineError::DataIntegrity(_))));
    }

    #[test]
    fn test_strip_key_removes_key() {
        let mut item = DomainItem::placeholder(CompositeKey::new("order", "o1"));
        assert!(strip_key(&mut item).is_some());
        assert!(item.key.is_none());
    }

    #[test]
    fn test_scope_without_location() {
        assert_eq!(
            collection_scope(&chain(&["customer"]), &[]).unwrap(),
            QueryScope::Collection(chain(&["customer"]))
        );
        assert_eq!(
            collection_scope(&chain(&["order", "customer"]), &[]).unwrap(),
            QueryScope::CollectionGroup("order".to_string())
        );
    }

    #[test]
    fn test_scope_with_location() {
        let scope = collection_scope(
            &chain(&["order", "customer", "region"]),
            &[LocKey::new("customer", "c1"), LocKey::new("region", "r1")],
        )
        .unwrap();
        assert_eq!(
            scope,
            QueryScope::Collection(chain(&["region", "r1", "customer", "c1", "order"]))
        );
    }

    #[test]
    fn test_scope_rejects_mismatched_location() {
        let err = collection_scope(
            &chain(&["order", "customer"]),
            &[LocKey::new("vendor", "v1")],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
