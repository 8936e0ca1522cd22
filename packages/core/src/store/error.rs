//! Storage Error Types

use thiserror::Error;

/// Errors surfaced by record, blob and event-bus backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conditional update failed for node '{node_id}' in space '{space_id}'")]
    ConditionFailed { space_id: String, node_id: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }

    pub fn condition_failed(space_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        StoreError::ConditionFailed {
            space_id: space_id.into(),
            node_id: node_id.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::Unavailable(reason.into())
    }

    /// Whether this error means "the guarded write lost a race", as opposed
    /// to the backend being broken
    pub fn is_condition_failure(&self) -> bool {
        matches!(self, StoreError::ConditionFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
