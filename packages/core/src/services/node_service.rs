//! Node Service
//!
//! CRUD, tree reads, and reordering for nodes. All the cross-cutting
//! behavior that used to be scattered per endpoint lives here behind one
//! configuration: the inline-content size threshold, preview length, and
//! event publication.
//!
//! # Content placement
//!
//! HTML up to the configured limit is stored inline in the record; larger
//! content goes to the blob store under a key derived from the composite
//! identity, with a short preview kept on the record.

use crate::models::{
    ContentPointer, GenerationState, Node, Notification, NodeUpdate, TreeNode, ValidationError,
};
use crate::services::cascade_deleter::{CascadeDeleteReport, CascadeDeleter};
use crate::services::content_generator::content_blob_key;
use crate::services::error::{Result, ServiceError};
use crate::services::tree_assembler::assemble_forest;
use crate::services::timed;
use crate::store::{BlobStore, EventPublisher, RecordStore, UpdateCondition, HTML_CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Behavior knobs shared by every node operation
#[derive(Debug, Clone)]
pub struct NodeServiceConfig {
    /// Content at or below this many characters stays inline in the record
    pub inline_content_limit: usize,
    /// Preview length stored with blob pointers, in characters
    pub preview_len: usize,
    /// Whether mutations publish notifications
    pub publish_events: bool,
    /// Deadline for each storage operation
    pub op_timeout: Duration,
}

impl Default for NodeServiceConfig {
    fn default() -> Self {
        Self {
            inline_content_limit: 1000,
            preview_len: 100,
            publish_events: true,
            op_timeout: Duration::from_secs(10),
        }
    }
}

/// Request payload for creating a node
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    /// Caller-supplied identifier; autogenerated when absent
    #[serde(default)]
    pub node_id: Option<String>,
    pub title: String,
    #[serde(default, rename = "contentHTML")]
    pub content_html: Option<String>,
    #[serde(default)]
    pub parent_node_id: Option<String>,
    #[serde(default)]
    pub order_index: i64,
}

/// Request payload for updating a node. Absent fields are untouched;
/// an empty `contentHTML` string clears the node's content.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "contentHTML")]
    pub content_html: Option<String>,
    #[serde(default)]
    pub parent_node_id: Option<String>,
    #[serde(default)]
    pub order_index: Option<i64>,
}

impl UpdateNodeParams {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content_html.is_none()
            && self.parent_node_id.is_none()
            && self.order_index.is_none()
    }
}

/// A node with its content resolved from wherever it lives
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub node: Node,
    #[serde(rename = "contentHTML", skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
}

/// The assembled hierarchy of one space
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceTree {
    pub space_id: String,
    pub name: String,
    pub nodes: Vec<TreeNode>,
}

/// One sibling position in a reorder request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderEntry {
    pub node_id: String,
    pub order_index: i64,
}

/// One node a reorder could not update
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFailure {
    pub node_id: String,
    pub error: String,
}

/// Outcome of a reorder, including per-node failures
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderReport {
    pub updated: usize,
    pub failures: Vec<ReorderFailure>,
}

impl ReorderReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Node CRUD over the record, blob and event backends
pub struct NodeService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    publisher: Arc<dyn EventPublisher>,
    deleter: CascadeDeleter,
    config: NodeServiceConfig,
}

impl NodeService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        publisher: Arc<dyn EventPublisher>,
        config: NodeServiceConfig,
    ) -> Self {
        Self {
            deleter: CascadeDeleter::new(records.clone(), blobs.clone(), config.op_timeout),
            records,
            blobs,
            publisher,
            config,
        }
    }

    /// Create a node in a space.
    ///
    /// Publishes a `Created` notification only when the node starts
    /// without content, which is what arms the generation pipeline.
    pub async fn create_node(&self, space_id: &str, params: CreateNodeParams) -> Result<Node> {
        timed(
            "get_space",
            self.config.op_timeout,
            self.records.get_space(space_id),
        )
        .await?
        .ok_or_else(|| ServiceError::space_not_found(space_id))?;

        let mut node = match params.node_id {
            Some(node_id) => Node::new_with_id(
                node_id,
                space_id.to_string(),
                params.title,
                params.parent_node_id,
                params.order_index,
            ),
            None => Node::new(
                space_id.to_string(),
                params.title,
                params.parent_node_id,
                params.order_index,
            ),
        };
        node.validate()?;

        if let Some(parent_id) = &node.parent_node_id {
            self.ensure_parent_exists(space_id, parent_id).await?;
        }

        if let Some(html) = params.content_html.as_deref().filter(|h| !h.is_empty()) {
            node.content = Some(self.place_content(space_id, &node.node_id, html).await?);
        }

        let stored = timed(
            "put_node",
            self.config.op_timeout,
            self.records.put_node(node),
        )
        .await?;

        if !stored.has_content() {
            self.publish(Notification::node_created(&stored)).await;
        }

        info!(
            "Created node '{}' in space '{space_id}' (content: {})",
            stored.node_id,
            stored.has_content()
        );
        Ok(stored)
    }

    /// Fetch a node with its content resolved.
    ///
    /// A missing or unreadable blob degrades to a view without content
    /// rather than failing the read.
    pub async fn get_node(&self, space_id: &str, node_id: &str) -> Result<NodeView> {
        let node = timed(
            "get_node",
            self.config.op_timeout,
            self.records.get_node(space_id, node_id),
        )
        .await?
        .ok_or_else(|| ServiceError::node_not_found(space_id, node_id))?;

        let content_html = match &node.content {
            None => None,
            Some(ContentPointer::Inline { preview }) => Some(preview.clone()),
            Some(ContentPointer::Blob { key, .. }) => {
                match timed("blob get", self.config.op_timeout, self.blobs.get(key)).await {
                    Ok(Some(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Ok(None) => {
                        warn!("Blob '{key}' referenced by node '{node_id}' is missing");
                        None
                    }
                    Err(err) => {
                        warn!("Could not read blob '{key}' for node '{node_id}': {err}");
                        None
                    }
                }
            }
        };

        Ok(NodeView { node, content_html })
    }

    /// Apply a sparse update to a node.
    ///
    /// Publishes an `Updated` notification when a retitle leaves the node
    /// content-free, so the generation pipeline picks it back up.
    pub async fn update_node(
        &self,
        space_id: &str,
        node_id: &str,
        params: UpdateNodeParams,
    ) -> Result<Node> {
        if params.is_empty() {
            return Err(ServiceError::invalid_update(
                "update must change at least one field",
            ));
        }

        let existing = timed(
            "get_node",
            self.config.op_timeout,
            self.records.get_node(space_id, node_id),
        )
        .await?
        .ok_or_else(|| ServiceError::node_not_found(space_id, node_id))?;

        let mut update = NodeUpdate::new();

        if let Some(title) = params.title.clone() {
            if title.trim().is_empty() {
                return Err(ValidationError::MissingField("title".to_string()).into());
            }
            update.title = Some(title);
        }

        if let Some(order_index) = params.order_index {
            update.order_index = Some(order_index);
        }

        if let Some(parent_id) = &params.parent_node_id {
            if parent_id == node_id {
                return Err(ValidationError::InvalidParent(
                    "Node cannot be its own parent".to_string(),
                )
                .into());
            }
            self.ensure_parent_exists(space_id, parent_id).await?;
            self.ensure_no_cycle(space_id, node_id, parent_id).await?;
            update.parent_node_id = Some(Some(parent_id.clone()));
        }

        match params.content_html.as_deref() {
            None => {}
            Some("") => {
                // Clearing content re-arms the generation lifecycle
                self.delete_blob_of(&existing).await;
                update.content = Some(None);
                update.generation_state = Some(GenerationState::NoContent);
            }
            Some(html) => {
                let pointer = self.place_content(space_id, node_id, html).await?;
                if pointer.blob_key().is_none() {
                    // New content is inline; an old blob would be orphaned
                    self.delete_blob_of(&existing).await;
                }
                update.content = Some(Some(pointer));
            }
        }

        let updated = timed(
            "update_node",
            self.config.op_timeout,
            self.records
                .update_node(space_id, node_id, update, Some(UpdateCondition::Exists)),
        )
        .await?;

        if params.title.is_some() && !updated.has_content() {
            self.publish(Notification::node_updated(&updated)).await;
        }

        Ok(updated)
    }

    /// Delete a node and its whole subtree
    pub async fn delete_node(&self, space_id: &str, node_id: &str) -> Result<CascadeDeleteReport> {
        self.deleter.delete_subtree(space_id, node_id).await
    }

    /// Assemble the full hierarchy of a space
    pub async fn space_tree(&self, space_id: &str) -> Result<SpaceTree> {
        let space = timed(
            "get_space",
            self.config.op_timeout,
            self.records.get_space(space_id),
        )
        .await?
        .ok_or_else(|| ServiceError::space_not_found(space_id))?;

        let records = timed(
            "query_by_space",
            self.config.op_timeout,
            self.records.query_by_space(space_id),
        )
        .await?;

        Ok(SpaceTree {
            space_id: space.space_id,
            name: space.name,
            nodes: assemble_forest(&records),
        })
    }

    /// Apply new sibling positions, making maximal progress.
    ///
    /// Nodes that cannot be updated are reported as failures; only an
    /// unreachable store fails the whole call.
    pub async fn reorder_nodes(
        &self,
        space_id: &str,
        entries: Vec<ReorderEntry>,
    ) -> Result<ReorderReport> {
        if entries.is_empty() {
            return Err(ServiceError::invalid_update(
                "reorder requires at least one entry",
            ));
        }

        let mut report = ReorderReport::default();

        for entry in entries {
            let update = NodeUpdate::new().with_order_index(entry.order_index);
            match timed(
                "update_node",
                self.config.op_timeout,
                self.records.update_node(
                    space_id,
                    &entry.node_id,
                    update,
                    Some(UpdateCondition::Exists),
                ),
            )
            .await
            {
                Ok(_) => report.updated += 1,
                Err(err @ (ServiceError::NotFound(_) | ServiceError::ConditionFailed(_))) => {
                    report.failures.push(ReorderFailure {
                        node_id: entry.node_id,
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if report.is_partial() {
            warn!(
                "Reorder in space '{space_id}' updated {} nodes with {} failures",
                report.updated,
                report.failures.len()
            );
        }

        Ok(report)
    }

    /// Store HTML inline or in the blob store, depending on size
    async fn place_content(
        &self,
        space_id: &str,
        node_id: &str,
        html: &str,
    ) -> Result<ContentPointer> {
        if html.chars().count() <= self.config.inline_content_limit {
            return Ok(ContentPointer::Inline {
                preview: html.to_string(),
            });
        }

        let key = content_blob_key(space_id, node_id);
        timed(
            "blob put",
            self.config.op_timeout,
            self.blobs
                .put(&key, html.as_bytes().to_vec(), HTML_CONTENT_TYPE),
        )
        .await?;

        Ok(ContentPointer::Blob {
            key,
            preview: Some(html.chars().take(self.config.preview_len).collect()),
        })
    }

    async fn ensure_parent_exists(&self, space_id: &str, parent_id: &str) -> Result<()> {
        let parent = timed(
            "get_node",
            self.config.op_timeout,
            self.records.get_node(space_id, parent_id),
        )
        .await?;

        if parent.is_none() {
            return Err(ValidationError::InvalidParent(format!(
                "Parent node '{parent_id}' does not exist in space '{space_id}'"
            ))
            .into());
        }
        Ok(())
    }

    /// Reject a reparent that would make the node its own ancestor. The
    /// walk is bounded by a visited set, so pre-existing corrupt links
    /// cannot loop it.
    async fn ensure_no_cycle(
        &self,
        space_id: &str,
        node_id: &str,
        new_parent_id: &str,
    ) -> Result<()> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut cursor = Some(new_parent_id.to_string());

        while let Some(current) = cursor {
            if current == node_id {
                return Err(ValidationError::InvalidParent(
                    "Reparenting would make the node its own ancestor".to_string(),
                )
                .into());
            }

            if !visited.insert(current.clone()) {
                break;
            }

            cursor = timed(
                "get_node",
                self.config.op_timeout,
                self.records.get_node(space_id, &current),
            )
            .await?
            .and_then(|n| n.parent_node_id);
        }

        Ok(())
    }

    /// Best-effort removal of the blob a node points at
    async fn delete_blob_of(&self, node: &Node) {
        if let Some(key) = node.content.as_ref().and_then(|c| c.blob_key()) {
            if let Err(err) = self.blobs.delete(key).await {
                warn!("Could not delete blob '{key}': {err}");
            }
        }
    }

    async fn publish(&self, notification: Notification) {
        if !self.config.publish_events {
            return;
        }
        if let Err(err) = self.publisher.publish(notification).await {
            warn!("Event publication failed: {err}");
        }
    }
}
