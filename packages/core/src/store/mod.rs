//! Storage Abstractions
//!
//! Three independent backends sit behind traits here:
//!
//! - [`RecordStore`] - keyed `Node`/`Space` persistence with conditional
//!   updates
//! - [`BlobStore`] - flat keyed storage for oversized node content
//! - [`EventPublisher`] - fire-and-forget notification sink
//!
//! In-memory implementations back the dev server and tests; services only
//! ever see the traits.

pub mod blob_store;
pub mod error;
pub mod event_bus;
pub mod memory_record_store;
pub mod record_store;

pub use blob_store::{BlobStore, MemoryBlobStore, HTML_CONTENT_TYPE};
pub use error::StoreError;
pub use event_bus::{BroadcastEventBus, EventPublisher, DEFAULT_BUS_CAPACITY};
pub use memory_record_store::MemoryRecordStore;
pub use record_store::{RecordStore, UpdateCondition};
