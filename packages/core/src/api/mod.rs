//! HTTP API
//!
//! REST surface over the service layer, one module per resource. Routers
//! are merged per module so endpoints can grow independently.

use crate::services::{NodeService, SpaceService};
use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

mod http_error;
mod nodes;
mod spaces;

pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub spaces: Arc<SpaceService>,
    pub nodes: Arc<NodeService>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create the main application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(spaces::routes(state.clone()))
        .merge(nodes::routes(state))
        .layer(TraceLayer::new_for_http())
}
