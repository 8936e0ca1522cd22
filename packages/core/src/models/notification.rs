//! Event-Bus Notifications
//!
//! Typed notifications published when nodes change. The content-generation
//! pipeline consumes `Created`/`Updated` notifications and emits
//! `ContentGenerated` on completion.
//!
//! The detail payload carries enough for the generator to build a prompt
//! without a secondary read, though the generator still re-checks the
//! authoritative record before acting (stale payloads are expected).

use crate::models::{ContentPointer, Node};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag stamped on every notification this service publishes
pub const NOTIFICATION_SOURCE: &str = "mindmap-content-events";

/// Kind of node event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Created,
    Updated,
    ContentGenerated,
}

/// Node payload of a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetail {
    pub node_id: String,
    pub space_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_pointer: Option<ContentPointer>,
    pub timestamp: DateTime<Utc>,
}

/// Typed notification published to the event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub source: String,
    pub detail_type: NotificationKind,
    pub detail: NotificationDetail,
}

impl Notification {
    fn from_node(kind: NotificationKind, node: &Node) -> Self {
        Self {
            source: NOTIFICATION_SOURCE.to_string(),
            detail_type: kind,
            detail: NotificationDetail {
                node_id: node.node_id.clone(),
                space_id: node.space_id.clone(),
                title: node.title.clone(),
                parent_node_id: node.parent_node_id.clone(),
                content_pointer: node.content.clone(),
                timestamp: Utc::now(),
            },
        }
    }

    /// Notification for a freshly created node
    pub fn node_created(node: &Node) -> Self {
        Self::from_node(NotificationKind::Created, node)
    }

    /// Notification for an updated node
    pub fn node_updated(node: &Node) -> Self {
        Self::from_node(NotificationKind::Updated, node)
    }

    /// Completion notification carrying the stored content pointer
    pub fn content_generated(node: &Node) -> Self {
        Self::from_node(NotificationKind::ContentGenerated, node)
    }
}
