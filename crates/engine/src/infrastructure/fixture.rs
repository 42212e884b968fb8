//! JSON fixtures: entity definitions plus seed documents.

use std::path::Path;

use docgraph_domain::EntityDefinition;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::memory_store::InMemoryDocumentStore;
use super::ports::RepoError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub definitions: Vec<EntityDefinition>,
    #[serde(default)]
    pub documents: Vec<FixtureDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDocument {
    /// Full segment path, root first, ending in the document id.
    pub path: Vec<String>,
    pub data: Map<String, Value>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing fixture {}", path.display()))
    }

    /// Insert every document into `store`.
    pub async fn seed(&self, store: &InMemoryDocumentStore) -> Result<usize, RepoError> {
        for document in &self.documents {
            store
                .insert(document.path.clone(), document.data.clone())
                .await?;
        }
        tracing::info!(documents = self.documents.len(), "Seeded fixture documents");
        Ok(self.documents.len())
    }
}
