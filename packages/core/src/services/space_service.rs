//! Space Service
//!
//! CRUD for spaces. Deleting a space cascades through its nodes and their
//! blobs before the space record itself is removed.

use crate::models::{Space, SpaceUpdate, ANONYMOUS_OWNER};
use crate::services::cascade_deleter::{CascadeDeleteReport, CascadeDeleter};
use crate::services::error::{Result, ServiceError};
use crate::services::timed;
use crate::store::{BlobStore, RecordStore};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Request payload for creating a space
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpaceParams {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Space CRUD over the record store
pub struct SpaceService {
    records: Arc<dyn RecordStore>,
    deleter: CascadeDeleter,
    op_timeout: Duration,
}

impl SpaceService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            deleter: CascadeDeleter::new(records.clone(), blobs, op_timeout),
            records,
            op_timeout,
        }
    }

    pub async fn create_space(&self, params: CreateSpaceParams) -> Result<Space> {
        let space = Space::new(params.name, params.description, params.owner_id);
        space.validate()?;

        let stored = timed(
            "put_space",
            self.op_timeout,
            self.records.put_space(space),
        )
        .await?;

        info!("Created space '{}' ({})", stored.name, stored.space_id);
        Ok(stored)
    }

    pub async fn get_space(&self, space_id: &str) -> Result<Space> {
        timed(
            "get_space",
            self.op_timeout,
            self.records.get_space(space_id),
        )
        .await?
        .ok_or_else(|| ServiceError::space_not_found(space_id))
    }

    /// Spaces owned by the given identity, or the anonymous owner when no
    /// identity is supplied
    pub async fn list_spaces(&self, owner_id: Option<&str>) -> Result<Vec<Space>> {
        let owner = owner_id.unwrap_or(ANONYMOUS_OWNER);
        timed(
            "list_spaces_by_owner",
            self.op_timeout,
            self.records.list_spaces_by_owner(owner),
        )
        .await
    }

    pub async fn update_space(&self, space_id: &str, update: SpaceUpdate) -> Result<Space> {
        if update.is_empty() {
            return Err(ServiceError::invalid_update(
                "update must change at least one field",
            ));
        }

        timed(
            "update_space",
            self.op_timeout,
            self.records.update_space(space_id, update),
        )
        .await
    }

    /// Delete a space and everything in it.
    ///
    /// Idempotent: deleting an absent space yields an empty report.
    pub async fn delete_space(&self, space_id: &str) -> Result<CascadeDeleteReport> {
        let report = self.deleter.delete_space_contents(space_id).await?;

        timed(
            "delete_space",
            self.op_timeout,
            self.records.delete_space(space_id),
        )
        .await?;

        info!(
            "Deleted space '{space_id}' with {} records and {} blobs",
            report.records_deleted, report.blobs_deleted
        );
        Ok(report)
    }
}
