//! Type-chain keyed registry of data sources.

use std::sync::Arc;

use dashmap::DashMap;

use super::ports::{DataSource, Registry};

#[derive(Default)]
pub struct DataSourceRegistry {
    sources: DashMap<Vec<String>, Arc<dyn DataSource>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `source` to `type_chain`, replacing any earlier binding.
    pub fn register(&self, type_chain: Vec<String>, source: Arc<dyn DataSource>) {
        if self.sources.insert(type_chain.clone(), source).is_some() {
            tracing::warn!(?type_chain, "Replacing data source binding");
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Registry for DataSourceRegistry {
    fn resolve(&self, type_chain: &[String]) -> Option<Arc<dyn DataSource>> {
        self.sources
            .get(type_chain)
            .map(|entry| Arc::clone(entry.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockDataSource;

    fn chain(types: &[&str]) -> Vec<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_resolves_exact_chain_only() {
        let registry = DataSourceRegistry::new();
        registry.register(chain(&["order", "customer"]), Arc::new(MockDataSource::new()));

        assert!(registry.resolve(&chain(&["order", "customer"])).is_some());
        assert!(registry.resolve(&chain(&["order"])).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_replaces_binding() {
        let registry = DataSourceRegistry::new();
        registry.register(chain(&["order"]), Arc::new(MockDataSource::new()));
        registry.register(chain(&["order"]), Arc::new(MockDataSource::new()));
        assert_eq!(registry.len(), 1);
    }
}
