//! In-Memory Record Store
//!
//! `HashMap`-backed `RecordStore` used by the dev server and tests.
//! Conditional updates hold the write lock across check-and-write, so the
//! atomicity contract of the trait holds for concurrent tasks.

use crate::models::{GenerationState, Node, NodeKey, NodeUpdate, Space, SpaceUpdate};
use crate::store::error::{Result, StoreError};
use crate::store::record_store::{RecordStore, UpdateCondition};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory `RecordStore` keyed by the composite `(space_id, node_id)` pair
#[derive(Default)]
pub struct MemoryRecordStore {
    nodes: RwLock<HashMap<(String, String), Node>>,
    spaces: RwLock<HashMap<String, Space>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of node records held, across all spaces
    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    fn check_condition(node: &Node, condition: UpdateCondition) -> bool {
        match condition {
            UpdateCondition::Exists => true,
            UpdateCondition::ContentAbsent => node.content.is_none(),
            UpdateCondition::AwaitingGeneration => {
                node.content.is_none() && node.generation_state != GenerationState::Generating
            }
        }
    }

    fn apply_update(node: &mut Node, update: NodeUpdate) {
        if let Some(title) = update.title {
            node.title = title;
        }

        if let Some(parent) = update.parent_node_id {
            node.parent_node_id = parent;
        }

        if let Some(order_index) = update.order_index {
            node.order_index = order_index;
        }

        if let Some(content) = update.content {
            node.content = content;
        }

        if let Some(state) = update.generation_state {
            node.generation_state = state;
        }

        node.updated_at = Utc::now();
    }

    /// Sort scan results oldest-first so queries are deterministic despite
    /// HashMap iteration order
    fn in_scan_order(mut nodes: Vec<Node>) -> Vec<Node> {
        nodes.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        nodes
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_node(&self, space_id: &str, node_id: &str) -> Result<Option<Node>> {
        let nodes = self.nodes.read().await;
        Ok(nodes
            .get(&(space_id.to_string(), node_id.to_string()))
            .cloned())
    }

    async fn put_node(&self, node: Node) -> Result<Node> {
        let mut nodes = self.nodes.write().await;
        nodes.insert(
            (node.space_id.clone(), node.node_id.clone()),
            node.clone(),
        );
        Ok(node)
    }

    async fn update_node(
        &self,
        space_id: &str,
        node_id: &str,
        update: NodeUpdate,
        condition: Option<UpdateCondition>,
    ) -> Result<Node> {
        let mut nodes = self.nodes.write().await;

        let node = nodes
            .get_mut(&(space_id.to_string(), node_id.to_string()))
            .ok_or_else(|| StoreError::not_found(format!("node '{node_id}'")))?;

        if let Some(condition) = condition {
            if !Self::check_condition(node, condition) {
                return Err(StoreError::condition_failed(space_id, node_id));
            }
        }

        Self::apply_update(node, update);
        Ok(node.clone())
    }

    async fn delete_node(&self, space_id: &str, node_id: &str) -> Result<bool> {
        let mut nodes = self.nodes.write().await;
        Ok(nodes
            .remove(&(space_id.to_string(), node_id.to_string()))
            .is_some())
    }

    async fn delete_nodes(&self, keys: &[NodeKey]) -> Result<usize> {
        let mut nodes = self.nodes.write().await;
        let mut deleted = 0;

        for key in keys {
            if nodes
                .remove(&(key.space_id.clone(), key.node_id.clone()))
                .is_some()
            {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn query_by_space(&self, space_id: &str) -> Result<Vec<Node>> {
        let nodes = self.nodes.read().await;
        let matched = nodes
            .values()
            .filter(|n| n.space_id == space_id)
            .cloned()
            .collect();
        Ok(Self::in_scan_order(matched))
    }

    async fn query_by_parent(&self, space_id: &str, parent_node_id: &str) -> Result<Vec<Node>> {
        let nodes = self.nodes.read().await;
        let matched = nodes
            .values()
            .filter(|n| {
                n.space_id == space_id && n.parent_node_id.as_deref() == Some(parent_node_id)
            })
            .cloned()
            .collect();
        Ok(Self::in_scan_order(matched))
    }

    async fn get_space(&self, space_id: &str) -> Result<Option<Space>> {
        let spaces = self.spaces.read().await;
        Ok(spaces.get(space_id).cloned())
    }

    async fn put_space(&self, space: Space) -> Result<Space> {
        let mut spaces = self.spaces.write().await;
        spaces.insert(space.space_id.clone(), space.clone());
        Ok(space)
    }

    async fn update_space(&self, space_id: &str, update: SpaceUpdate) -> Result<Space> {
        let mut spaces = self.spaces.write().await;

        let space = spaces
            .get_mut(space_id)
            .ok_or_else(|| StoreError::not_found(format!("space '{space_id}'")))?;

        if let Some(name) = update.name {
            space.name = name;
        }

        if let Some(description) = update.description {
            space.description = description;
        }

        space.updated_at = Utc::now();
        Ok(space.clone())
    }

    async fn delete_space(&self, space_id: &str) -> Result<bool> {
        let mut spaces = self.spaces.write().await;
        Ok(spaces.remove(space_id).is_some())
    }

    async fn list_spaces_by_owner(&self, owner_id: &str) -> Result<Vec<Space>> {
        let spaces = self.spaces.read().await;
        let mut matched: Vec<Space> = spaces
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.space_id.cmp(&b.space_id))
        });
        Ok(matched)
    }
}
