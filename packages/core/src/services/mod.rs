//! Service Layer
//!
//! Business logic over the storage traits:
//!
//! - [`SpaceService`] / [`NodeService`] - CRUD, validation, and event
//!   publication for spaces and nodes
//! - [`tree_assembler`] - flat records to ordered forest
//! - [`CascadeDeleter`] - subtree and space-content removal
//! - [`ContentGenerator`] - notification-driven AI content pipeline

pub mod cascade_deleter;
pub mod content_generator;
pub mod error;
pub mod node_service;
pub mod space_service;
pub mod tree_assembler;

pub use cascade_deleter::{CascadeDeleteReport, CascadeDeleter};
pub use content_generator::{ContentGenerator, ContentGeneratorConfig, GenerationOutcome};
pub use error::ServiceError;
pub use node_service::{
    CreateNodeParams, NodeService, NodeServiceConfig, NodeView, ReorderEntry, ReorderReport,
    SpaceTree, UpdateNodeParams,
};
pub use space_service::{CreateSpaceParams, SpaceService};
pub use tree_assembler::assemble_forest;

use crate::services::error::Result;
use std::future::Future;
use std::time::Duration;

/// Run a storage operation with a deadline, mapping both backend errors
/// and timeouts into service errors
pub(crate) async fn timed<T, F>(op: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = crate::store::error::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(ServiceError::storage_unavailable(format!(
            "{op} timed out after {limit:?}"
        ))),
    }
}
