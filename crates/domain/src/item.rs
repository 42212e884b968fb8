//! Materialized domain items and their persisted payload shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::key::CompositeKey;
use crate::time::EventTime;

pub const KEY_FIELD: &str = "key";
pub const EVENTS_FIELD: &str = "events";
pub const REFS_FIELD: &str = "refs";
pub const AGGS_FIELD: &str = "aggs";

/// A single lifecycle event.
///
/// `at` is null on an event slot that has not happened yet; live documents
/// store `deleted: {at: null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    #[serde(default)]
    pub at: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<CompositeKey>,
}

impl EventEntry {
    pub fn at(at: impl Into<EventTime>) -> Self {
        Self {
            at: Some(at.into()),
            by: None,
        }
    }

    pub fn has_occurred(&self) -> bool {
        self.at.is_some()
    }
}

/// Lifecycle events. A soft delete is a `deleted` entry with a non-null `at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Events {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<EventEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<EventEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<EventEntry>,
}

impl Events {
    pub fn is_empty(&self) -> bool {
        self.created.is_none() && self.updated.is_none() && self.deleted.is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.as_ref().is_some_and(EventEntry::has_occurred)
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut EventEntry> {
        [&mut self.created, &mut self.updated, &mut self.deleted]
            .into_iter()
            .flatten()
    }
}

/// A reference to another item, optionally carrying the resolved item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRef")]
pub struct RefEntry {
    pub key: CompositeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Box<DomainItem>>,
}

impl RefEntry {
    pub fn key_only(key: CompositeKey) -> Self {
        Self { key, item: None }
    }
}

/// The two stored reference shapes: `{key: ...}` or a bare key.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRef {
    Enveloped {
        key: CompositeKey,
        #[serde(default)]
        item: Option<Box<DomainItem>>,
    },
    Bare(CompositeKey),
}

impl From<RawRef> for RefEntry {
    fn from(raw: RawRef) -> Self {
        match raw {
            RawRef::Enveloped { key, item } => Self { key, item },
            RawRef::Bare(key) => Self { key, item: None },
        }
    }
}

/// A materialized domain entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<CompositeKey>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Events::is_empty")]
    pub events: Events,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: BTreeMap<String, RefEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggs: Option<BTreeMap<String, Value>>,
}

impl DomainItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Minimal stand-in for an item whose expansion would close a cycle.
    pub fn placeholder(key: CompositeKey) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.key.is_some()
            && self.fields.is_empty()
            && self.events.is_empty()
            && self.refs.is_empty()
            && self.aggs.is_none()
    }

    /// Split a stored payload into direct fields, events and key-only references.
    ///
    /// Null references are dropped. Any stored `key` or `aggs` entry is
    /// discarded; both are always derived on read.
    pub fn from_payload(mut data: Map<String, Value>) -> Result<Self, DomainError> {
        data.remove(KEY_FIELD);
        data.remove(AGGS_FIELD);

        let events = match data.remove(EVENTS_FIELD) {
            None | Some(Value::Null) => Events::default(),
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| DomainError::parse(format!("events: {}", e)))?,
        };

        let refs = match data.remove(REFS_FIELD) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(raw)) => parse_refs(raw)?,
            Some(other) => {
                return Err(DomainError::parse(format!(
                    "refs must be an object, found {}",
                    other
                )))
            }
        };

        Ok(Self {
            key: None,
            fields: data,
            events,
            refs,
            aggs: None,
        })
    }

    /// Serialize to the flat payload shape.
    pub fn to_payload(&self) -> Result<Map<String, Value>, DomainError> {
        match serde_json::to_value(self).map_err(|e| DomainError::parse(e.to_string()))? {
            Value::Object(map) => Ok(map),
            other => Err(DomainError::parse(format!(
                "item serialized to a non-object: {}",
                other
            ))),
        }
    }
}

fn parse_refs(raw: Map<String, Value>) -> Result<BTreeMap<String, RefEntry>, DomainError> {
    let mut refs = BTreeMap::new();
    for (name, value) in raw {
        if value.is_null() {
            continue;
        }
        let entry: RefEntry = serde_json::from_value(value)
            .map_err(|e| DomainError::malformed_reference(name.clone(), e))?;
        if entry.key.key_type.trim().is_empty() {
            return Err(DomainError::malformed_reference(name, "key type is blank"));
        }
        // Stored references never carry an expanded item.
        refs.insert(name, RefEntry::key_only(entry.key));
    }
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    #[test]
    fn test_from_payload_accepts_bare_and_enveloped_refs() {
        let item = DomainItem::from_payload(payload(json!({
            "title": "Dune",
            "refs": {
                "author": {"type": "author", "primaryValue": "a1"},
                "publisher": {"key": {"type": "publisher", "primaryValue": "p1"}},
                "editor": null
            }
        })))
        .unwrap();

        assert_eq!(item.fields.get("title"), Some(&json!("Dune")));
        assert_eq!(item.refs["author"].key, CompositeKey::new("author", "a1"));
        assert_eq!(item.refs["publisher"].key, CompositeKey::new("publisher", "p1"));
        assert!(!item.refs.contains_key("editor"));
        assert!(item.refs.values().all(|r| r.item.is_none()));
    }

    #[test]
    fn test_from_payload_rejects_malformed_reference() {
        let err = DomainItem::from_payload(payload(json!({
            "refs": {"author": 42}
        })))
        .unwrap_err();
        assert!(matches!(err, DomainError::MalformedReference { ref name, .. } if name == "author"));
    }

    #[test]
    fn test_from_payload_drops_stored_aggs_and_key() {
        let item = DomainItem::from_payload(payload(json!({
            "key": {"type": "x", "primaryValue": "1"},
            "aggs": {"lines": []},
            "name": "n"
        })))
        .unwrap();
        assert!(item.key.is_none());
        assert!(item.aggs.is_none());
        assert_eq!(item.fields.len(), 1);
    }

    #[test]
    fn test_payload_round_trip_keeps_flat_fields() {
        let data = payload(json!({
            "name": "Ann",
            "events": {"created": {"at": "2024-01-15T10:30:00Z"}},
            "refs": {"team": {"key": {"type": "team", "primaryValue": "t1", "location": []}}}
        }));
        let item = DomainItem::from_payload(data.clone()).unwrap();
        assert_eq!(item.to_payload().unwrap(), data);
    }

    #[test]
    fn test_null_deleted_marker_is_live_and_round_trips() {
        let data = payload(json!({
            "name": "Ann",
            "events": {
                "created": {"at": {"seconds": 1, "nanoseconds": 0}},
                "deleted": {"at": null}
            }
        }));
        let item = DomainItem::from_payload(data.clone()).unwrap();

        assert!(!item.events.is_deleted());
        assert_eq!(item.events.deleted.as_ref().unwrap().at, None);
        assert!(item.events.created.as_ref().unwrap().has_occurred());
        assert_eq!(item.to_payload().unwrap(), data);
    }

    #[test]
    fn test_deleted_with_timestamp_is_soft_delete() {
        let item = DomainItem::from_payload(payload(json!({
            "events": {"deleted": {"at": "2024-02-01T00:00:00Z"}}
        })))
        .unwrap();
        assert!(item.events.is_deleted());
    }

    #[test]
    fn test_placeholder_carries_only_key() {
        let placeholder = DomainItem::placeholder(CompositeKey::new("author", "a1"));
        assert!(placeholder.is_placeholder());
        assert_eq!(
            serde_json::to_value(&placeholder).unwrap(),
            json!({"key": {"type": "author", "primaryValue": "a1", "location": []}})
        );
    }
}
