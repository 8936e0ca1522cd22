//! Node Endpoints
//!
//! - `POST /api/spaces/:space_id/nodes` - create a node
//! - `GET /api/spaces/:space_id/nodes/:node_id` - fetch a node with content
//! - `PATCH /api/spaces/:space_id/nodes/:node_id` - update a node (`PUT` accepted too)
//! - `DELETE /api/spaces/:space_id/nodes/:node_id` - delete a subtree
//! - `GET /api/spaces/:space_id/tree` - assembled hierarchy of a space
//! - `POST /api/spaces/:space_id/nodes/reorder` - bulk sibling reorder
//!
//! Reorder returns `207 Multi-Status` when only part of the batch could
//! be applied; the body reports the failures per node.

use crate::api::{AppState, HttpError};
use crate::models::Node;
use crate::services::{
    CreateNodeParams, NodeView, ReorderEntry, ReorderReport, SpaceTree, UpdateNodeParams,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

async fn create_node(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    Json(params): Json<CreateNodeParams>,
) -> Result<(StatusCode, Json<Node>), HttpError> {
    let node = state.nodes.create_node(&space_id, params).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

async fn get_node(
    State(state): State<AppState>,
    Path((space_id, node_id)): Path<(String, String)>,
) -> Result<Json<NodeView>, HttpError> {
    let view = state.nodes.get_node(&space_id, &node_id).await?;
    Ok(Json(view))
}

async fn update_node(
    State(state): State<AppState>,
    Path((space_id, node_id)): Path<(String, String)>,
    Json(params): Json<UpdateNodeParams>,
) -> Result<Json<Node>, HttpError> {
    let node = state.nodes.update_node(&space_id, &node_id, params).await?;
    Ok(Json(node))
}

async fn delete_node(
    State(state): State<AppState>,
    Path((space_id, node_id)): Path<(String, String)>,
) -> Result<StatusCode, HttpError> {
    state.nodes.delete_node(&space_id, &node_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn space_tree(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> Result<Json<SpaceTree>, HttpError> {
    let tree = state.nodes.space_tree(&space_id).await?;
    Ok(Json(tree))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub nodes: Vec<ReorderEntry>,
}

async fn reorder_nodes(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Result<(StatusCode, Json<ReorderReport>), HttpError> {
    let report = state.nodes.reorder_nodes(&space_id, request.nodes).await?;

    let status = if report.is_partial() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/spaces/:space_id/nodes", post(create_node))
        .route("/api/spaces/:space_id/nodes/reorder", post(reorder_nodes))
        .route(
            "/api/spaces/:space_id/nodes/:node_id",
            get(get_node)
                .patch(update_node)
                .put(update_node)
                .delete(delete_node),
        )
        .route("/api/spaces/:space_id/tree", get(space_tree))
        .with_state(state)
}
