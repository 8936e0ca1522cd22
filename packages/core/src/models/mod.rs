//! Data Models
//!
//! Core data structures for the MindMap hierarchy:
//!
//! - [`Space`] - top-level named collection of nodes
//! - [`Node`] - single hierarchy entry, identified by `(node_id, space_id)`
//! - [`TreeNode`] - derived, read-only nested view built per read
//! - [`Notification`] - typed event-bus payloads

pub mod node;
pub mod notification;
pub mod space;
pub mod tree;

pub use node::{ContentPointer, GenerationState, Node, NodeKey, NodeUpdate, ValidationError};
pub use notification::{Notification, NotificationDetail, NotificationKind, NOTIFICATION_SOURCE};
pub use space::{Space, SpaceUpdate, ANONYMOUS_OWNER};
pub use tree::TreeNode;
