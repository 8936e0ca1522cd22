//! Derived Tree Structure
//!
//! `TreeNode` is the transient, read-only hierarchy built per read by the
//! tree assembler. It is never persisted; the flat `Node` records remain
//! the source of truth.

use crate::models::Node;
use serde::{Deserialize, Serialize};

/// One node in the assembled hierarchy, with ordered children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub node_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
    pub order_index: i64,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Build a leaf tree node from a flat record
    pub fn from_record(node: &Node) -> Self {
        Self {
            node_id: node.node_id.clone(),
            title: node.title.clone(),
            parent_node_id: node.parent_node_id.clone(),
            order_index: node.order_index,
            children: Vec::new(),
        }
    }

    /// Total nodes in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TreeNode::subtree_len)
            .sum::<usize>()
    }
}
