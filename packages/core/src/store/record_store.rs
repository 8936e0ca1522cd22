//! Record Store Trait
//!
//! Keyed persistence for `Node` and `Space` records. Every node operation
//! is keyed by the composite `(space_id, node_id)` pair; implementations
//! must never index by `node_id` alone.

use crate::models::{Node, NodeKey, NodeUpdate, Space, SpaceUpdate};
use crate::store::error::Result;
use async_trait::async_trait;

/// Guard evaluated atomically with a conditional node update.
///
/// Conditions are the store-level primitive behind the content-generation
/// pipeline's at-most-once and never-overwrite guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCondition {
    /// The record must exist
    Exists,

    /// The record must exist and carry no content pointer
    ContentAbsent,

    /// The record must exist, carry no content pointer, and not already be
    /// in the `Generating` state. Used to claim a node for generation; at
    /// most one concurrent claimant can succeed.
    AwaitingGeneration,
}

/// Persistence interface for node and space records.
///
/// Implementations must apply conditional updates atomically: the condition
/// check and the write are a single indivisible step with respect to other
/// callers of the same store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a single node, `None` if absent
    async fn get_node(&self, space_id: &str, node_id: &str) -> Result<Option<Node>>;

    /// Insert or replace a node record
    async fn put_node(&self, node: Node) -> Result<Node>;

    /// Apply a sparse update, optionally guarded by a condition.
    ///
    /// Returns the updated record. Fails with `StoreError::NotFound` if the
    /// record is absent and `StoreError::ConditionFailed` if the guard does
    /// not hold.
    async fn update_node(
        &self,
        space_id: &str,
        node_id: &str,
        update: NodeUpdate,
        condition: Option<UpdateCondition>,
    ) -> Result<Node>;

    /// Delete a single node. Returns whether a record existed.
    async fn delete_node(&self, space_id: &str, node_id: &str) -> Result<bool>;

    /// Delete a batch of nodes, skipping absent keys. Returns the number of
    /// records actually removed.
    async fn delete_nodes(&self, keys: &[NodeKey]) -> Result<usize>;

    /// All nodes belonging to a space, in a stable scan order
    async fn query_by_space(&self, space_id: &str) -> Result<Vec<Node>>;

    /// Direct children of a node within a space, in a stable scan order
    async fn query_by_parent(&self, space_id: &str, parent_node_id: &str) -> Result<Vec<Node>>;

    /// Fetch a single space, `None` if absent
    async fn get_space(&self, space_id: &str) -> Result<Option<Space>>;

    /// Insert or replace a space record
    async fn put_space(&self, space: Space) -> Result<Space>;

    /// Apply a sparse space update. Fails with `StoreError::NotFound` if the
    /// space is absent.
    async fn update_space(&self, space_id: &str, update: SpaceUpdate) -> Result<Space>;

    /// Delete a space record. Returns whether a record existed. Does not
    /// touch the space's nodes; cascading is a service concern.
    async fn delete_space(&self, space_id: &str) -> Result<bool>;

    /// All spaces owned by the given identity, oldest first
    async fn list_spaces_by_owner(&self, owner_id: &str) -> Result<Vec<Space>>;
}
