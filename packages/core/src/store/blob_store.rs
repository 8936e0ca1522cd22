//! Blob Store
//!
//! Flat keyed storage for node content that is too large to live inline in
//! a record. Keys are derived deterministically from the composite node
//! identity, so content can always be re-located (or re-deleted) from the
//! record alone.

use crate::store::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// MIME type recorded for generated node content
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Keyed binary storage for node content
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a key, replacing any existing object
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetch the bytes stored under a key, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a single object. Returns whether an object existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Delete a batch of objects, skipping absent keys. Returns the number
    /// of objects actually removed.
    async fn delete_many(&self, keys: &[String]) -> Result<usize>;
}

struct BlobObject {
    bytes: Vec<u8>,
    #[allow(dead_code)]
    content_type: String,
}

/// In-memory `BlobStore` used by the dev server and tests
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, BlobObject>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects held
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            BlobObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).map(|o| o.bytes.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut objects = self.objects.write().await;
        Ok(objects.remove(key).is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<usize> {
        let mut objects = self.objects.write().await;
        let mut deleted = 0;

        for key in keys {
            if objects.remove(key).is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}
