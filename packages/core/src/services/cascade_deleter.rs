//! Cascade Deleter
//!
//! Deleting a node removes its whole subtree, and deleting a space removes
//! everything in it. Descendants are discovered breadth-first through the
//! record store, then blobs and records are removed in that order so a
//! failed blob deletion can never strand an unreferenced record.
//!
//! Deletion makes maximal progress: individual discovery or blob failures
//! are collected into the report rather than aborting the operation. Only
//! an unreachable record store fails the call outright.

use crate::models::NodeKey;
use crate::services::error::Result;
use crate::services::timed;
use crate::store::{BlobStore, RecordStore};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one cascade, including partial failures
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeDeleteReport {
    pub records_deleted: usize,
    pub blobs_deleted: usize,
    pub errors: Vec<String>,
}

impl CascadeDeleteReport {
    /// Whether the cascade completed without any partial failure
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Removes subtrees and space contents across the record and blob stores
pub struct CascadeDeleter {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    op_timeout: Duration,
}

impl CascadeDeleter {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            records,
            blobs,
            op_timeout,
        }
    }

    /// Delete a node and every descendant reachable from it.
    ///
    /// Idempotent: a missing target yields an empty report, not an error.
    pub async fn delete_subtree(&self, space_id: &str, node_id: &str) -> Result<CascadeDeleteReport> {
        let mut report = CascadeDeleteReport::default();

        let Some(target) = timed(
            "get_node",
            self.op_timeout,
            self.records.get_node(space_id, node_id),
        )
        .await?
        else {
            return Ok(report);
        };

        // Breadth-first discovery. The visited set terminates the walk
        // even if stored parent links form a cycle.
        let mut keys: Vec<NodeKey> = Vec::new();
        let mut blob_keys: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        visited.insert(target.node_id.clone());
        blob_keys.extend(target.content.as_ref().and_then(|c| c.blob_key()).map(str::to_string));
        keys.push(target.key());
        queue.push_back(target.node_id);

        while let Some(current) = queue.pop_front() {
            let children = match timed(
                "query_by_parent",
                self.op_timeout,
                self.records.query_by_parent(space_id, &current),
            )
            .await
            {
                Ok(children) => children,
                Err(err) => {
                    warn!("Descendant discovery failed under '{current}': {err}");
                    report
                        .errors
                        .push(format!("discovery under '{current}': {err}"));
                    continue;
                }
            };

            for child in children {
                if visited.insert(child.node_id.clone()) {
                    blob_keys.extend(
                        child.content.as_ref().and_then(|c| c.blob_key()).map(str::to_string),
                    );
                    keys.push(child.key());
                    queue.push_back(child.node_id);
                }
            }
        }

        self.remove(keys, blob_keys, &mut report).await?;

        info!(
            "Cascade delete of node '{node_id}' in space '{space_id}': \
             {} records, {} blobs, {} errors",
            report.records_deleted,
            report.blobs_deleted,
            report.errors.len()
        );

        Ok(report)
    }

    /// Delete every node (and its blob) belonging to a space. Does not
    /// remove the space record itself.
    pub async fn delete_space_contents(&self, space_id: &str) -> Result<CascadeDeleteReport> {
        let mut report = CascadeDeleteReport::default();

        let nodes = timed(
            "query_by_space",
            self.op_timeout,
            self.records.query_by_space(space_id),
        )
        .await?;

        let blob_keys: Vec<String> = nodes
            .iter()
            .filter_map(|n| n.content.as_ref().and_then(|c| c.blob_key()))
            .map(str::to_string)
            .collect();
        let keys: Vec<NodeKey> = nodes.iter().map(|n| n.key()).collect();

        self.remove(keys, blob_keys, &mut report).await?;

        info!(
            "Cascade delete of space '{space_id}' contents: {} records, {} blobs",
            report.records_deleted, report.blobs_deleted
        );

        Ok(report)
    }

    /// Blobs first, then records. A blob failure is recorded and the
    /// record deletion still runs; a record-store failure propagates.
    async fn remove(
        &self,
        keys: Vec<NodeKey>,
        blob_keys: Vec<String>,
        report: &mut CascadeDeleteReport,
    ) -> Result<()> {
        if !blob_keys.is_empty() {
            match timed(
                "blob delete_many",
                self.op_timeout,
                self.blobs.delete_many(&blob_keys),
            )
            .await
            {
                Ok(deleted) => report.blobs_deleted = deleted,
                Err(err) => {
                    warn!("Blob deletion failed: {err}");
                    report.errors.push(format!("blob deletion: {err}"));
                }
            }
        }

        if !keys.is_empty() {
            report.records_deleted = timed(
                "delete_nodes",
                self.op_timeout,
                self.records.delete_nodes(&keys),
            )
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentPointer, Node, NodeUpdate, Space, SpaceUpdate};
    use crate::store::error::StoreError;
    use crate::store::{MemoryBlobStore, MemoryRecordStore, UpdateCondition, HTML_CONTENT_TYPE};
    use async_trait::async_trait;

    /// Blob backend whose every call fails
    struct OfflineBlobStore;

    #[async_trait]
    impl BlobStore for OfflineBlobStore {
        async fn put(
            &self,
            _key: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> crate::store::error::Result<()> {
            Err(StoreError::unavailable("blob backend offline"))
        }

        async fn get(&self, _key: &str) -> crate::store::error::Result<Option<Vec<u8>>> {
            Err(StoreError::unavailable("blob backend offline"))
        }

        async fn delete(&self, _key: &str) -> crate::store::error::Result<bool> {
            Err(StoreError::unavailable("blob backend offline"))
        }

        async fn delete_many(&self, _keys: &[String]) -> crate::store::error::Result<usize> {
            Err(StoreError::unavailable("blob backend offline"))
        }
    }

    /// Record store that fails child queries under one specific node
    struct FlakyDiscoveryStore {
        inner: Arc<MemoryRecordStore>,
        fail_under: String,
    }

    #[async_trait]
    impl RecordStore for FlakyDiscoveryStore {
        async fn get_node(
            &self,
            space_id: &str,
            node_id: &str,
        ) -> crate::store::error::Result<Option<Node>> {
            self.inner.get_node(space_id, node_id).await
        }

        async fn put_node(&self, node: Node) -> crate::store::error::Result<Node> {
            self.inner.put_node(node).await
        }

        async fn update_node(
            &self,
            space_id: &str,
            node_id: &str,
            update: NodeUpdate,
            condition: Option<UpdateCondition>,
        ) -> crate::store::error::Result<Node> {
            self.inner.update_node(space_id, node_id, update, condition).await
        }

        async fn delete_node(
            &self,
            space_id: &str,
            node_id: &str,
        ) -> crate::store::error::Result<bool> {
            self.inner.delete_node(space_id, node_id).await
        }

        async fn delete_nodes(&self, keys: &[NodeKey]) -> crate::store::error::Result<usize> {
            self.inner.delete_nodes(keys).await
        }

        async fn query_by_space(&self, space_id: &str) -> crate::store::error::Result<Vec<Node>> {
            self.inner.query_by_space(space_id).await
        }

        async fn query_by_parent(
            &self,
            space_id: &str,
            parent_node_id: &str,
        ) -> crate::store::error::Result<Vec<Node>> {
            if parent_node_id == self.fail_under {
                return Err(StoreError::unavailable("partition offline"));
            }
            self.inner.query_by_parent(space_id, parent_node_id).await
        }

        async fn get_space(&self, space_id: &str) -> crate::store::error::Result<Option<Space>> {
            self.inner.get_space(space_id).await
        }

        async fn put_space(&self, space: Space) -> crate::store::error::Result<Space> {
            self.inner.put_space(space).await
        }

        async fn update_space(
            &self,
            space_id: &str,
            update: SpaceUpdate,
        ) -> crate::store::error::Result<Space> {
            self.inner.update_space(space_id, update).await
        }

        async fn delete_space(&self, space_id: &str) -> crate::store::error::Result<bool> {
            self.inner.delete_space(space_id).await
        }

        async fn list_spaces_by_owner(
            &self,
            owner_id: &str,
        ) -> crate::store::error::Result<Vec<Space>> {
            self.inner.list_spaces_by_owner(owner_id).await
        }
    }

    fn deleter(
        records: &Arc<MemoryRecordStore>,
        blobs: &Arc<MemoryBlobStore>,
    ) -> CascadeDeleter {
        CascadeDeleter::new(
            records.clone() as Arc<dyn RecordStore>,
            blobs.clone() as Arc<dyn BlobStore>,
            Duration::from_secs(5),
        )
    }

    async fn put_node(
        records: &MemoryRecordStore,
        blobs: &MemoryBlobStore,
        id: &str,
        parent: Option<&str>,
        with_blob: bool,
    ) -> Node {
        let mut node = Node::new_with_id(
            id.to_string(),
            "s1".to_string(),
            format!("title-{id}"),
            parent.map(str::to_string),
            0,
        );

        if with_blob {
            let key = format!("nodes/s1/{id}/content.html");
            blobs
                .put(&key, b"<p>x</p>".to_vec(), HTML_CONTENT_TYPE)
                .await
                .unwrap();
            node.content = Some(ContentPointer::Blob { key, preview: None });
        }

        records.put_node(node.clone()).await.unwrap();
        node
    }

    #[tokio::test]
    async fn test_subtree_deleted_siblings_survive() {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());

        put_node(&records, &blobs, "root", None, false).await;
        put_node(&records, &blobs, "doomed", Some("root"), true).await;
        put_node(&records, &blobs, "doomed-child", Some("doomed"), true).await;
        put_node(&records, &blobs, "survivor", Some("root"), false).await;

        let report = deleter(&records, &blobs)
            .delete_subtree("s1", "doomed")
            .await
            .unwrap();

        assert_eq!(report.records_deleted, 2);
        assert_eq!(report.blobs_deleted, 2);
        assert!(report.is_clean());

        assert!(records.get_node("s1", "survivor").await.unwrap().is_some());
        assert!(records.get_node("s1", "doomed").await.unwrap().is_none());
        assert!(records.get_node("s1", "doomed-child").await.unwrap().is_none());
        assert!(blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_target_is_a_no_op() {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());

        let report = deleter(&records, &blobs)
            .delete_subtree("s1", "never-existed")
            .await
            .unwrap();

        assert_eq!(report.records_deleted, 0);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        put_node(&records, &blobs, "once", None, true).await;

        let d = deleter(&records, &blobs);
        let first = d.delete_subtree("s1", "once").await.unwrap();
        let second = d.delete_subtree("s1", "once").await.unwrap();

        assert_eq!(first.records_deleted, 1);
        assert_eq!(second.records_deleted, 0);
        assert_eq!(second.blobs_deleted, 0);
    }

    #[tokio::test]
    async fn test_cyclic_parent_links_terminate() {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());

        // a <-> b, written directly to simulate corruption
        put_node(&records, &blobs, "a", Some("b"), false).await;
        put_node(&records, &blobs, "b", Some("a"), false).await;

        let report = deleter(&records, &blobs)
            .delete_subtree("s1", "a")
            .await
            .unwrap();

        assert_eq!(report.records_deleted, 2);
        assert_eq!(records.node_count().await, 0);
    }

    #[tokio::test]
    async fn test_blob_failure_still_deletes_records() {
        let records = Arc::new(MemoryRecordStore::new());

        let mut node = Node::new_with_id(
            "doomed".to_string(),
            "s1".to_string(),
            "doomed".to_string(),
            None,
            0,
        );
        node.content = Some(ContentPointer::Blob {
            key: "nodes/s1/doomed/content.html".to_string(),
            preview: None,
        });
        records.put_node(node).await.unwrap();

        let d = CascadeDeleter::new(
            records.clone() as Arc<dyn RecordStore>,
            Arc::new(OfflineBlobStore) as Arc<dyn BlobStore>,
            Duration::from_secs(5),
        );
        let report = d.delete_subtree("s1", "doomed").await.unwrap();

        assert_eq!(report.records_deleted, 1);
        assert_eq!(report.blobs_deleted, 0);
        assert!(!report.is_clean());
        assert!(report.errors[0].contains("blob deletion"));
        assert!(records.get_node("s1", "doomed").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_discovery_failure_is_reported_and_traversal_continues() {
        let inner = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());

        put_node(&inner, &blobs, "root", None, false).await;
        put_node(&inner, &blobs, "a", Some("root"), false).await;
        put_node(&inner, &blobs, "b", Some("root"), false).await;
        put_node(&inner, &blobs, "a-child", Some("a"), false).await;

        let records = Arc::new(FlakyDiscoveryStore {
            inner: inner.clone(),
            fail_under: "a".to_string(),
        });

        let report = CascadeDeleter::new(
            records as Arc<dyn RecordStore>,
            blobs.clone() as Arc<dyn BlobStore>,
            Duration::from_secs(5),
        )
        .delete_subtree("s1", "root")
        .await
        .unwrap();

        // Everything discovered before and after the failure is deleted
        assert_eq!(report.records_deleted, 3);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("discovery under 'a'"));

        // The undiscovered grandchild survives as a dangling record
        assert!(inner.get_node("s1", "a-child").await.unwrap().is_some());
        assert!(inner.get_node("s1", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_space_contents_sweeps_everything() {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());

        put_node(&records, &blobs, "r1", None, true).await;
        put_node(&records, &blobs, "c1", Some("r1"), false).await;
        put_node(&records, &blobs, "r2", None, true).await;

        // A different space is untouched
        let other = Node::new("s2".to_string(), "elsewhere".to_string(), None, 0);
        records.put_node(other.clone()).await.unwrap();

        let report = deleter(&records, &blobs)
            .delete_space_contents("s1")
            .await
            .unwrap();

        assert_eq!(report.records_deleted, 3);
        assert_eq!(report.blobs_deleted, 2);
        assert!(records.get_node("s2", &other.node_id).await.unwrap().is_some());
    }
}
