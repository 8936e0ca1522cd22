//! Service Error Types

use crate::models::ValidationError;
use crate::store::StoreError;
use mindmap_gen_engine::GenerationError;
use thiserror::Error;

/// Errors surfaced by the service layer
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conditional update failed: {0}")]
    ConditionFailed(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Content generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl ServiceError {
    pub fn space_not_found(space_id: &str) -> Self {
        ServiceError::NotFound(format!("space '{space_id}'"))
    }

    pub fn node_not_found(space_id: &str, node_id: &str) -> Self {
        ServiceError::NotFound(format!("node '{node_id}' in space '{space_id}'"))
    }

    pub fn invalid_update(reason: impl Into<String>) -> Self {
        ServiceError::InvalidUpdate(reason.into())
    }

    pub fn storage_unavailable(reason: impl Into<String>) -> Self {
        ServiceError::StorageUnavailable(reason.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::ConditionFailed { space_id, node_id } => ServiceError::ConditionFailed(
                format!("node '{node_id}' in space '{space_id}'"),
            ),
            StoreError::Unavailable(reason) => ServiceError::StorageUnavailable(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
