//! Declarative entity schema: type chain, references and aggregations.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDefinition {
    pub name: String,
    /// Falls back to the referenced key's own type tags when unset.
    #[serde(default)]
    pub target_type_chain: Option<Vec<String>>,
}

impl ReferenceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type_chain: None,
        }
    }

    pub fn with_target(mut self, type_chain: Vec<String>) -> Self {
        self.target_type_chain = Some(type_chain);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationDefinition {
    pub name: String,
    /// Raw field the aggregated value is read from; defaults to `name`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target_type_chain: Option<Vec<String>>,
    pub cardinality: Cardinality,
}

impl AggregationDefinition {
    pub fn new(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            source: None,
            target_type_chain: None,
            cardinality,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, type_chain: Vec<String>) -> Self {
        self.target_type_chain = Some(type_chain);
        self
    }

    pub fn source_field(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

/// Everything the materialization pipeline needs to know about one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefinition {
    /// Most specific type first.
    pub type_chain: Vec<String>,
    #[serde(default)]
    pub references: Vec<ReferenceDefinition>,
    #[serde(default)]
    pub aggregations: Vec<AggregationDefinition>,
}

impl EntityDefinition {
    pub fn new(type_chain: Vec<String>) -> Self {
        Self {
            type_chain,
            references: Vec::new(),
            aggregations: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: ReferenceDefinition) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationDefinition) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.type_chain.first().map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.type_chain.is_empty() {
            return Err(DomainError::validation("type chain must not be empty"));
        }
        if self.type_chain.iter().any(|t| t.trim().is_empty()) {
            return Err(DomainError::validation(format!(
                "type chain contains a blank type: {:?}",
                self.type_chain
            )));
        }
        let mut names = std::collections::HashSet::new();
        for aggregation in &self.aggregations {
            if !names.insert(aggregation.name.as_str()) {
                return Err(DomainError::validation(format!(
                    "aggregation '{}' is declared more than once",
                    aggregation.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_field_defaults_to_name() {
        let agg = AggregationDefinition::new("lines", Cardinality::Many);
        assert_eq!(agg.source_field(), "lines");
        assert_eq!(agg.with_source("orderLines").source_field(), "orderLines");
    }

    #[test]
    fn test_deserializes_definition() {
        let def: EntityDefinition = serde_json::from_value(json!({
            "typeChain": ["order", "customer"],
            "references": [{"name": "salesRep", "targetTypeChain": ["employee"]}],
            "aggregations": [{"name": "lines", "cardinality": "many"}]
        }))
        .unwrap();
        assert_eq!(def.primary_type(), Some("order"));
        assert_eq!(def.references[0].target_type_chain, Some(vec!["employee".to_string()]));
        assert_eq!(def.aggregations[0].cardinality, Cardinality::Many);
    }

    #[test]
    fn test_validate_rejects_empty_chain() {
        assert!(EntityDefinition::new(vec![]).validate().is_err());
        assert!(EntityDefinition::new(vec!["a".into(), " ".into()]).validate().is_err());
        assert!(EntityDefinition::new(vec!["a".into()]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_aggregation_names() {
        let def = EntityDefinition::new(vec!["order".into()])
            .with_aggregation(AggregationDefinition::new("lines", Cardinality::Many))
            .with_aggregation(
                AggregationDefinition::new("lines", Cardinality::Many).with_source("oldLines"),
            );

        let err = def.validate().unwrap_err();

        assert!(matches!(err, DomainError::Validation(ref msg) if msg.contains("lines")));
    }
}
