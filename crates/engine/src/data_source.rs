//! Store-backed data source for one entity type.
//!
//! Reads documents through the [`DocumentStore`] port, compiles queries with
//! the [`QueryCompiler`], and hands every document to the materialization
//! pipeline with the caller's resolution context.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use docgraph_domain::{CompositeKey, DomainItem, EntityDefinition, ItemQuery, LocKey};

use crate::codec::{collection_scope, encode_path};
use crate::error::EngineError;
use crate::infrastructure::ports::{DataSource, DocumentStore, RepoError, Registry};
use crate::materialize::materialize;
use crate::query::{FindResult, QueryCompiler, QueryMetadata};
use crate::resolution::ResolutionContext;

pub struct StoreDataSource {
    store: Arc<dyn DocumentStore>,
    definition: EntityDefinition,
    compiler: QueryCompiler,
    registry: Weak<dyn Registry>,
}

impl StoreDataSource {
    /// The registry is held weakly; it normally owns this source.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        definition: EntityDefinition,
        registry: Weak<dyn Registry>,
    ) -> Self {
        let compiler = QueryCompiler::new(store.capabilities());
        Self {
            store,
            definition,
            compiler,
            registry,
        }
    }

    pub fn definition(&self) -> &EntityDefinition {
        &self.definition
    }

    fn registry(&self) -> Result<Arc<dyn Registry>, EngineError> {
        self.registry.upgrade().ok_or_else(|| {
            EngineError::configuration(format!(
                "registry for {:?} has been dropped",
                self.definition.type_chain
            ))
        })
    }

    /// Fetch and materialize the item at `key`; `None` if no document exists.
    pub async fn get(
        &self,
        key: &CompositeKey,
        context: &ResolutionContext,
    ) -> Result<Option<DomainItem>, EngineError> {
        if self.definition.primary_type() != Some(key.key_type.as_str()) {
            return Err(EngineError::validation(format!(
                "key {} does not belong to type chain {:?}",
                key, self.definition.type_chain
            )));
        }
        let path = encode_path(key)?;
        let Some(doc) = self.store.get(&path).await? else {
            return Ok(None);
        };
        let registry = self.registry()?;
        materialize(doc, &self.definition, registry.as_ref(), Some(context))
            .await
            .map(Some)
    }

    /// Run `query` under `location` and report pagination metadata.
    ///
    /// The total is counted over the unpaginated filters before slicing.
    pub async fn find(
        &self,
        query: &ItemQuery,
        location: &[LocKey],
        context: &ResolutionContext,
    ) -> Result<FindResult, EngineError> {
        let scope = collection_scope(&self.definition.type_chain, location)?;
        let native = self.compiler.compile(query, scope)?;

        let total = self.store.count(&native.unpaginated()).await?;
        let docs = self.store.query(&native).await?;

        let registry = self.registry()?;
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            items.push(materialize(doc, &self.definition, registry.as_ref(), Some(context)).await?);
        }

        let metadata = QueryMetadata::new(total, items.len() as u64, query.limit, query.offset);
        tracing::debug!(
            type_chain = ?self.definition.type_chain,
            total = metadata.total,
            returned = metadata.returned,
            "Executed find"
        );
        Ok(FindResult { items, metadata })
    }
}

#[async_trait]
impl DataSource for StoreDataSource {
    async fn fetch_one(
        &self,
        key: &CompositeKey,
        context: &ResolutionContext,
    ) -> Result<DomainItem, EngineError> {
        self.get(key, context)
            .await?
            .ok_or_else(|| RepoError::not_found(&key.key_type, key).into())
    }

    async fn fetch_many(
        &self,
        query: &ItemQuery,
        location: &[LocKey],
        context: &ResolutionContext,
    ) -> Result<Vec<DomainItem>, EngineError> {
        Ok(self.find(query, location, context).await?.items)
    }
}
