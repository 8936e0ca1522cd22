//! MindMap API server
//!
//! Wires the in-memory backends, the REST surface and the generation
//! consumer into one process. State lives in memory, so this binary is
//! meant for development and integration testing.
//!
//! # Environment
//!
//! - `MINDMAP_PORT` - listen port (default 3001)
//! - `MINDMAP_GEN_ENDPOINT` - generation backend invoke URL
//! - `MINDMAP_GEN_MODEL_ID` - model identifier sent to the backend
//! - `MINDMAP_GEN_MODEL_FAMILY` - wire dialect: claude, titan, nova, generic
//! - `RUST_LOG` - tracing filter (default `info`)

use mindmap_core::api::{create_router, AppState};
use mindmap_core::services::{
    ContentGenerator, ContentGeneratorConfig, NodeService, NodeServiceConfig, SpaceService,
};
use mindmap_core::store::{
    BlobStore, BroadcastEventBus, EventPublisher, MemoryBlobStore, MemoryRecordStore, RecordStore,
};
use mindmap_gen_engine::{GenerationConfig, GenerationParams, HttpTextGenerator, TextGenerator};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn generation_config_from_env() -> anyhow::Result<GenerationConfig> {
    let mut config = GenerationConfig::default();

    if let Ok(endpoint) = std::env::var("MINDMAP_GEN_ENDPOINT") {
        config.endpoint = endpoint;
    }
    if let Ok(model_id) = std::env::var("MINDMAP_GEN_MODEL_ID") {
        config.model_id = model_id;
    }
    if let Ok(family) = std::env::var("MINDMAP_GEN_MODEL_FAMILY") {
        config.family = family
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("MINDMAP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let bus = Arc::new(BroadcastEventBus::default());
    let publisher: Arc<dyn EventPublisher> = bus.clone();

    let gen_config = generation_config_from_env()?;
    info!(
        "Generation backend: {} ({:?}) at {}",
        gen_config.model_id, gen_config.family, gen_config.endpoint
    );
    let generator_config = ContentGeneratorConfig {
        params: GenerationParams::from(&gen_config),
        generation_timeout: gen_config.request_timeout(),
        ..ContentGeneratorConfig::default()
    };
    let backend: Arc<dyn TextGenerator> = Arc::new(HttpTextGenerator::new(gen_config)?);

    let generator = Arc::new(ContentGenerator::new(
        records.clone(),
        blobs.clone(),
        publisher.clone(),
        backend,
        generator_config,
    ));
    tokio::spawn(generator.run(bus.subscribe()));

    let state = AppState {
        spaces: Arc::new(SpaceService::new(
            records.clone(),
            blobs.clone(),
            NodeServiceConfig::default().op_timeout,
        )),
        nodes: Arc::new(NodeService::new(
            records,
            blobs,
            publisher,
            NodeServiceConfig::default(),
        )),
    };

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("MindMap API server listening on port {port}");

    axum::serve(listener, router).await?;
    Ok(())
}
