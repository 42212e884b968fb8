//! docgraph engine - fixture runner.
//!
//! Loads a JSON fixture into the in-memory store, runs an unfiltered `find`
//! for one entity type and prints the materialized result as JSON.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docgraph_domain::ItemQuery;
use docgraph_engine::infrastructure::{
    config::{EngineConfig, FIXTURE_VAR},
    fixture::Fixture,
    memory_store::InMemoryDocumentStore,
    ports::BackendCapabilities,
};
use docgraph_engine::{App, ResolutionContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Taskfile-style runs start in `crates/engine`, so look for .env at the repo root.
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docgraph_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::from_env()?;
    let fixture_path = config
        .fixture_path
        .clone()
        .with_context(|| format!("{} is not set", FIXTURE_VAR))?;
    tracing::info!(path = %fixture_path.display(), "Loading fixture");
    let fixture = Fixture::load(&fixture_path).await?;

    let store = Arc::new(InMemoryDocumentStore::new(BackendCapabilities {
        composite_or: config.composite_or,
    }));
    fixture.seed(&store).await?;

    let definitions = fixture.definitions;
    let app = App::new(store, definitions)?;

    let source = match &config.entity_type {
        Some(entity_type) => app
            .source_for_type(entity_type)
            .with_context(|| format!("no definition for type '{}'", entity_type))?,
        None => app
            .sources()
            .first()
            .cloned()
            .context("fixture declares no definitions")?,
    };

    let context = ResolutionContext::new();
    let result = tokio::time::timeout(
        config.fetch_timeout,
        source.find(&ItemQuery::new(), &[], &context),
    )
    .await
    .with_context(|| format!("find timed out after {:?}", config.fetch_timeout))??;

    tracing::info!(
        returned = result.metadata.returned,
        total = result.metadata.total,
        cached = context.cached_len(),
        "Find complete"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
