//! Application composition.

use std::sync::Arc;

use docgraph_domain::EntityDefinition;

use crate::data_source::StoreDataSource;
use crate::error::EngineError;
use crate::infrastructure::ports::{DocumentStore, Registry};
use crate::infrastructure::registry::DataSourceRegistry;

/// Wires one store-backed data source per entity definition into a shared
/// registry.
///
/// The registry owns the sources; sources reach back to it weakly, so the
/// `App` must stay alive while items are being materialized.
pub struct App {
    registry: Arc<DataSourceRegistry>,
    sources: Vec<Arc<StoreDataSource>>,
}

impl App {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        definitions: Vec<EntityDefinition>,
    ) -> Result<Self, EngineError> {
        let registry = Arc::new(DataSourceRegistry::new());
        let registry_dyn: Arc<dyn Registry> = registry.clone();

        let mut sources = Vec::with_capacity(definitions.len());
        for definition in definitions {
            definition
                .validate()
                .map_err(|e| EngineError::configuration(e.to_string()))?;
            let type_chain = definition.type_chain.clone();
            let source = Arc::new(StoreDataSource::new(
                store.clone(),
                definition,
                Arc::downgrade(&registry_dyn),
            ));
            registry.register(type_chain, source.clone());
            sources.push(source);
        }

        tracing::info!(sources = sources.len(), "Data sources registered");
        Ok(Self { registry, sources })
    }

    pub fn registry(&self) -> Arc<dyn Registry> {
        self.registry.clone()
    }

    /// Source for the exact type chain.
    pub fn source(&self, type_chain: &[String]) -> Option<Arc<StoreDataSource>> {
        self.sources
            .iter()
            .find(|s| s.definition().type_chain == type_chain)
            .cloned()
    }

    /// First source whose primary type is `primary_type`.
    pub fn source_for_type(&self, primary_type: &str) -> Option<Arc<StoreDataSource>> {
        self.sources
            .iter()
            .find(|s| s.definition().primary_type() == Some(primary_type))
            .cloned()
    }

    pub fn sources(&self) -> &[Arc<StoreDataSource>] {
        &self.sources
    }
}
