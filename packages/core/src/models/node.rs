//! Node Data Structures
//!
//! This module defines the `Node` record and related types for the MindMap
//! hierarchy.
//!
//! # Identity
//!
//! The `(node_id, space_id)` pair is the sole stable identity of a node.
//! The space identifier participates because every storage lookup is keyed
//! by the composite pair; code must never key by `node_id` alone.
//!
//! # Hierarchy
//!
//! - `parent_node_id = None` marks a root node
//! - a set parent must reference a node in the *same* space
//! - `order_index` defines sibling display order (not required unique)
//!
//! # Examples
//!
//! ```rust
//! use mindmap_core::models::Node;
//!
//! // A root node
//! let root = Node::new("space-1".to_string(), "Rust".to_string(), None, 0);
//!
//! // A child under it
//! let child = Node::new(
//!     "space-1".to_string(),
//!     "Ownership".to_string(),
//!     Some(root.node_id.clone()),
//!     1,
//! );
//! assert!(child.validate().is_ok());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for model-level input checks
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid content pointer: {0}")]
    InvalidContent(String),
}

/// Reference locating a node's HTML content.
///
/// Small content is carried inline; anything larger lives in the blob store
/// and the record keeps only the key plus a short preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentPointer {
    /// Full content stored inline in the record
    Inline { preview: String },
    /// Content stored in the blob store under `key`
    Blob {
        key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview: Option<String>,
    },
}

impl ContentPointer {
    /// Blob-store key, if this pointer references the blob store
    pub fn blob_key(&self) -> Option<&str> {
        match self {
            ContentPointer::Blob { key, .. } => Some(key),
            ContentPointer::Inline { .. } => None,
        }
    }

    /// Short preview text, when available
    pub fn preview(&self) -> Option<&str> {
        match self {
            ContentPointer::Inline { preview } => Some(preview),
            ContentPointer::Blob { preview, .. } => preview.as_deref(),
        }
    }
}

/// Content-generation lifecycle of a node.
///
/// `NoContent → Generating → Generated`, with `GenerationFailed` as a
/// retryable dead-end reachable from `Generating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationState {
    #[default]
    NoContent,
    Generating,
    Generated,
    GenerationFailed,
}

/// Single entry in a space's hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique within the owning space
    pub node_id: String,

    /// Owning space (part of the composite identity)
    pub space_id: String,

    /// Display title, required non-empty
    pub title: String,

    /// Parent node within the same space; `None` marks a root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,

    /// Sibling display order, ascending
    #[serde(default)]
    pub order_index: i64,

    /// Where the node's HTML content lives, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentPointer>,

    /// Content-generation lifecycle state
    #[serde(default)]
    pub generation_state: GenerationState,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a new node with an auto-generated UUID
    pub fn new(
        space_id: String,
        title: String,
        parent_node_id: Option<String>,
        order_index: i64,
    ) -> Self {
        Self::new_with_id(
            Uuid::new_v4().to_string(),
            space_id,
            title,
            parent_node_id,
            order_index,
        )
    }

    /// Create a new node with a caller-supplied identifier
    pub fn new_with_id(
        node_id: String,
        space_id: String,
        title: String,
        parent_node_id: Option<String>,
        order_index: i64,
    ) -> Self {
        let now = Utc::now();

        Self {
            node_id,
            space_id,
            title,
            parent_node_id,
            order_index,
            content: None,
            generation_state: GenerationState::NoContent,
            created_at: now,
            updated_at: now,
        }
    }

    /// Composite identity of this node
    pub fn key(&self) -> NodeKey {
        NodeKey {
            space_id: self.space_id.clone(),
            node_id: self.node_id.clone(),
        }
    }

    /// Whether this node sits at the top of its space's hierarchy
    pub fn is_root(&self) -> bool {
        self.parent_node_id.is_none()
    }

    /// Whether this node carries a content pointer (inline or blob)
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Validate structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `node_id`, `space_id` or `title` is empty
    /// - the node references itself as parent
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.node_id.is_empty() {
            return Err(ValidationError::MissingField("nodeId".to_string()));
        }

        if self.space_id.is_empty() {
            return Err(ValidationError::MissingField("spaceId".to_string()));
        }

        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()));
        }

        if let Some(parent_id) = &self.parent_node_id {
            if parent_id == &self.node_id {
                return Err(ValidationError::InvalidParent(
                    "Node cannot be its own parent".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Composite `(space_id, node_id)` identity used for bulk store operations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeKey {
    pub space_id: String,
    pub node_id: String,
}

impl NodeKey {
    pub fn new(space_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            node_id: node_id.into(),
        }
    }
}

/// Custom deserializer for optional fields that accepts both plain values and null
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (set to NULL)
/// - "value" → Some(Some("value")) (set to value)
pub(crate) fn deserialize_optional_field<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Missing field is handled by #[serde(default)] on the struct field
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Sparse node update for conditional store writes.
///
/// # Double-Option Pattern for Nullable Fields
///
/// `parent_node_id` and `content` distinguish three states:
///
/// - `None`: don't change this field
/// - `Some(None)`: set the field to NULL (remove the reference)
/// - `Some(Some(value))`: set the field to the value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    /// Update display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Update parent reference (double-Option)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_node_id: Option<Option<String>>,

    /// Update sibling order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,

    /// Update content pointer (double-Option)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub content: Option<Option<ContentPointer>>,

    /// Update generation lifecycle state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_state: Option<GenerationState>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_order_index(mut self, order_index: i64) -> Self {
        self.order_index = Some(order_index);
        self
    }

    pub fn with_content(mut self, content: Option<ContentPointer>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_generation_state(mut self, state: GenerationState) -> Self {
        self.generation_state = Some(state);
        self
    }

    /// Check if the update contains any changes
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.parent_node_id.is_none()
            && self.order_index.is_none()
            && self.content.is_none()
            && self.generation_state.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new("space-1".to_string(), "Rust".to_string(), None, 0);

        assert!(!node.node_id.is_empty());
        assert_eq!(node.space_id, "space-1");
        assert_eq!(node.title, "Rust");
        assert!(node.is_root());
        assert!(!node.has_content());
        assert_eq!(node.generation_state, GenerationState::NoContent);
    }

    #[test]
    fn test_node_validation_rejects_blank_title() {
        let node = Node::new("space-1".to_string(), "   ".to_string(), None, 0);
        assert!(matches!(
            node.validate(),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_node_validation_circular_parent() {
        let mut node = Node::new("space-1".to_string(), "Test".to_string(), None, 0);
        node.parent_node_id = Some(node.node_id.clone());

        assert!(matches!(
            node.validate(),
            Err(ValidationError::InvalidParent(_))
        ));
    }

    #[test]
    fn test_content_pointer_blob_key() {
        let inline = ContentPointer::Inline {
            preview: "<p>x</p>".to_string(),
        };
        assert!(inline.blob_key().is_none());
        assert_eq!(inline.preview(), Some("<p>x</p>"));

        let blob = ContentPointer::Blob {
            key: "nodes/s/n/content.html".to_string(),
            preview: Some("<p>x".to_string()),
        };
        assert_eq!(blob.blob_key(), Some("nodes/s/n/content.html"));
    }

    #[test]
    fn test_content_pointer_serialization() {
        let blob = ContentPointer::Blob {
            key: "nodes/s/n/content.html".to_string(),
            preview: None,
        };
        let json = serde_json::to_value(&blob).unwrap();
        assert_eq!(json["kind"], "blob");
        assert_eq!(json["key"], "nodes/s/n/content.html");
        assert!(json.get("preview").is_none());
    }

    #[test]
    fn test_node_serialization_uses_camel_case() {
        let node = Node::new(
            "space-1".to_string(),
            "Rust".to_string(),
            Some("parent-1".to_string()),
            2,
        );
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["nodeId"], node.node_id);
        assert_eq!(json["spaceId"], "space-1");
        assert_eq!(json["parentNodeId"], "parent-1");
        assert_eq!(json["orderIndex"], 2);
        assert_eq!(json["generationState"], "noContent");
    }

    #[test]
    fn test_node_deserialization_defaults() {
        // Records written before the generation lifecycle existed carry
        // neither orderIndex nor generationState.
        let json = serde_json::json!({
            "nodeId": "n1",
            "spaceId": "s1",
            "title": "Old record",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });

        let node: Node = serde_json::from_value(json).unwrap();
        assert_eq!(node.order_index, 0);
        assert_eq!(node.generation_state, GenerationState::NoContent);
        assert!(node.content.is_none());
    }

    #[test]
    fn test_node_update_builder() {
        let update = NodeUpdate::new()
            .with_title("Renamed".to_string())
            .with_order_index(3);

        assert_eq!(update.title, Some("Renamed".to_string()));
        assert_eq!(update.order_index, Some(3));
        assert!(!update.is_empty());
        assert!(NodeUpdate::new().is_empty());
    }

    #[test]
    fn test_node_update_double_option_from_json() {
        // null means "clear the parent", not "leave it alone"
        let update: NodeUpdate =
            serde_json::from_str(r#"{"parentNodeId": null, "title": "t"}"#).unwrap();
        assert_eq!(update.parent_node_id, Some(None));

        // absent means "leave it alone"
        let update: NodeUpdate = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(update.parent_node_id, None);

        // a value means "set it"
        let update: NodeUpdate = serde_json::from_str(r#"{"parentNodeId": "p1"}"#).unwrap();
        assert_eq!(update.parent_node_id, Some(Some("p1".to_string())));
    }
}
