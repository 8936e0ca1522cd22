//! Space Endpoints
//!
//! - `POST /api/spaces` - create a space
//! - `GET /api/spaces` - list spaces by owner
//! - `GET /api/spaces/:space_id` - fetch a space
//! - `PATCH /api/spaces/:space_id` - update name/description (`PUT` accepted too)
//! - `DELETE /api/spaces/:space_id` - delete a space and its contents

use crate::api::{AppState, HttpError};
use crate::models::{Space, SpaceUpdate};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use crate::services::CreateSpaceParams;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSpacesQuery {
    owner_id: Option<String>,
}

async fn create_space(
    State(state): State<AppState>,
    Json(params): Json<CreateSpaceParams>,
) -> Result<(StatusCode, Json<Space>), HttpError> {
    let space = state.spaces.create_space(params).await?;
    Ok((StatusCode::CREATED, Json(space)))
}

async fn list_spaces(
    State(state): State<AppState>,
    Query(query): Query<ListSpacesQuery>,
) -> Result<Json<Vec<Space>>, HttpError> {
    let spaces = state.spaces.list_spaces(query.owner_id.as_deref()).await?;
    Ok(Json(spaces))
}

async fn get_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> Result<Json<Space>, HttpError> {
    let space = state.spaces.get_space(&space_id).await?;
    Ok(Json(space))
}

async fn update_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    Json(update): Json<SpaceUpdate>,
) -> Result<Json<Space>, HttpError> {
    let space = state.spaces.update_space(&space_id, update).await?;
    Ok(Json(space))
}

async fn delete_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.spaces.delete_space(&space_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/spaces", post(create_space).get(list_spaces))
        .route(
            "/api/spaces/:space_id",
            get(get_space)
                .patch(update_space)
                .put(update_space)
                .delete(delete_space),
        )
        .with_state(state)
}
