//! MindMap Core
//!
//! Hierarchical note-taking service: spaces hold tree-structured nodes over
//! a keyed record store, a blob store for oversized content, and an event
//! bus that drives asynchronous AI content generation.
//!
//! # Architecture
//!
//! - [`models`] - `Space`, `Node`, the derived `TreeNode` view, and typed
//!   notifications
//! - [`store`] - storage traits with in-memory implementations
//! - [`services`] - business logic: CRUD, tree assembly, cascade deletion,
//!   and the content-generation coordinator
//! - [`api`] - axum REST surface over the services
//!
//! The flat `(node_id, space_id)` records are the source of truth; the
//! nested tree is assembled per read and never persisted.

pub mod api;
pub mod models;
pub mod services;
pub mod store;

pub use models::{
    ContentPointer, GenerationState, Node, NodeKey, NodeUpdate, Notification, NotificationKind,
    Space, SpaceUpdate, TreeNode,
};
pub use services::{
    assemble_forest, CascadeDeleteReport, CascadeDeleter, ContentGenerator,
    ContentGeneratorConfig, GenerationOutcome, NodeService, NodeServiceConfig, ServiceError,
    SpaceService,
};
pub use store::{
    BlobStore, BroadcastEventBus, EventPublisher, MemoryBlobStore, MemoryRecordStore, RecordStore,
    StoreError, UpdateCondition,
};
