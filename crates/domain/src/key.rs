//! Composite keys identifying an item's position in the document hierarchy.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// One ancestor level of a composite key.
///
/// `value` is absent when the stored path was too shallow to supply it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocKey {
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl LocKey {
    pub fn new(key_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key_type: key_type.into(),
            value: Some(value.into()),
        }
    }

    pub fn absent(key_type: impl Into<String>) -> Self {
        Self {
            key_type: key_type.into(),
            value: None,
        }
    }
}

/// Primary type/value plus the ordered location chain, most specific first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub primary_value: String,
    #[serde(default)]
    pub location: Vec<LocKey>,
}

impl CompositeKey {
    pub fn new(key_type: impl Into<String>, primary_value: impl Into<String>) -> Self {
        Self {
            key_type: key_type.into(),
            primary_value: primary_value.into(),
            location: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: Vec<LocKey>) -> Self {
        self.location = location;
        self
    }

    /// Whether the key carries ancestor levels.
    pub fn is_composite(&self) -> bool {
        !self.location.is_empty()
    }

    /// The type chain implied by the key's own tags: primary type first,
    /// then each location type in order.
    pub fn type_chain(&self) -> Vec<String> {
        std::iter::once(self.key_type.clone())
            .chain(self.location.iter().map(|loc| loc.key_type.clone()))
            .collect()
    }

    /// Canonical identity string used for caching and cycle tracking.
    ///
    /// Absent location values render as a bare type tag so they never collide
    /// with an empty-string value.
    pub fn fingerprint(&self) -> String {
        let mut out = format!("{}:{}", self.key_type, self.primary_value);
        for loc in &self.location {
            out.push('|');
            out.push_str(&loc.key_type);
            if let Some(value) = &loc.value {
                out.push(':');
                out.push_str(value);
            }
        }
        out
    }

    /// Parse a key from its wire shape.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        let key: Self = serde_json::from_value(value.clone())
            .map_err(|e| DomainError::invalid_key(e.to_string()))?;
        if key.key_type.trim().is_empty() {
            return Err(DomainError::invalid_key("key type must not be blank"));
        }
        Ok(key)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_key() -> CompositeKey {
        CompositeKey::new("order", "o1").with_location(vec![
            LocKey::new("customer", "c1"),
            LocKey::new("region", "r1"),
        ])
    }

    #[test]
    fn test_fingerprint_includes_every_level() {
        assert_eq!(order_key().fingerprint(), "order:o1|customer:c1|region:r1");
        assert_eq!(CompositeKey::new("user", "u1").fingerprint(), "user:u1");
    }

    #[test]
    fn test_fingerprint_distinguishes_absent_from_empty() {
        let absent = CompositeKey::new("order", "o1").with_location(vec![LocKey::absent("customer")]);
        let empty = CompositeKey::new("order", "o1").with_location(vec![LocKey::new("customer", "")]);
        assert_ne!(absent.fingerprint(), empty.fingerprint());
    }

    #[test]
    fn test_serializes_to_wire_shape() {
        let value = serde_json::to_value(order_key()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "order",
                "primaryValue": "o1",
                "location": [
                    {"type": "customer", "value": "c1"},
                    {"type": "region", "value": "r1"}
                ]
            })
        );
    }

    #[test]
    fn test_type_chain_follows_location_order() {
        assert_eq!(order_key().type_chain(), vec!["order", "customer", "region"]);
    }

    #[test]
    fn test_from_value_rejects_blank_type() {
        let err = CompositeKey::from_value(&json!({"type": " ", "primaryValue": "x"})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidKey(_)));
    }

    #[test]
    fn test_from_value_defaults_missing_location() {
        let key = CompositeKey::from_value(&json!({"type": "user", "primaryValue": "u1"})).unwrap();
        assert!(!key.is_composite());
    }
}
