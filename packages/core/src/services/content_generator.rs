//! Content Generation Coordinator
//!
//! Consumes `Created`/`Updated` notifications and fills empty nodes with
//! AI-generated HTML. The pipeline is at-most-once per trigger and never
//! overwrites content that already exists, no matter how stale the
//! triggering notification is.
//!
//! # Concurrency guards
//!
//! Two conditional record writes fence the pipeline:
//!
//! 1. the claim sets `Generating` only while the node still awaits
//!    generation, so concurrent triggers collapse to one winner
//! 2. the final write stores the content pointer only while the record is
//!    still content-free, so a racing manual write always wins and the
//!    generated blob is discarded
//!
//! Notification payloads are treated as hints only; every decision is made
//! against a fresh authoritative read.

use crate::models::{
    ContentPointer, GenerationState, Node, Notification, NotificationKind, NodeUpdate,
};
use crate::services::error::{Result, ServiceError};
use crate::services::timed;
use crate::store::{BlobStore, EventPublisher, RecordStore, UpdateCondition, HTML_CONTENT_TYPE};
use mindmap_gen_engine::{GenerationError, GenerationParams, TextGenerator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Blob-store key for a node's generated content, derived from the
/// composite identity
pub fn content_blob_key(space_id: &str, node_id: &str) -> String {
    format!("nodes/{space_id}/{node_id}/content.html")
}

/// Tuning for the generation pipeline
#[derive(Debug, Clone)]
pub struct ContentGeneratorConfig {
    /// Max sibling titles folded into the prompt
    pub sibling_context_limit: usize,
    /// Preview length stored alongside the blob pointer, in characters
    pub preview_len: usize,
    /// Deadline for each storage operation
    pub op_timeout: Duration,
    /// Deadline for the model backend call
    pub generation_timeout: Duration,
    /// Sampling parameters passed to the backend
    pub params: GenerationParams,
}

impl Default for ContentGeneratorConfig {
    fn default() -> Self {
        Self {
            sibling_context_limit: 5,
            preview_len: 100,
            op_timeout: Duration::from_secs(10),
            generation_timeout: Duration::from_secs(30),
            params: GenerationParams::default(),
        }
    }
}

/// How one notification was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Content was generated and stored under `blob_key`
    Generated { blob_key: String },
    /// The node already carried content (or content appeared mid-flight)
    SkippedExistingContent,
    /// The node no longer exists
    SkippedMissingNode,
    /// Another worker holds the generation claim
    SkippedAlreadyClaimed,
    /// The notification was itself a completion event
    SkippedCompletionNotification,
}

/// Notification-driven generator filling empty nodes with HTML content
pub struct ContentGenerator {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    publisher: Arc<dyn EventPublisher>,
    backend: Arc<dyn TextGenerator>,
    config: ContentGeneratorConfig,
}

impl ContentGenerator {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        publisher: Arc<dyn EventPublisher>,
        backend: Arc<dyn TextGenerator>,
        config: ContentGeneratorConfig,
    ) -> Self {
        Self {
            records,
            blobs,
            publisher,
            backend,
            config,
        }
    }

    /// Process one notification end to end.
    ///
    /// Skips are normal outcomes, not errors. An `Err` means the pipeline
    /// failed mid-flight; the node is left in `GenerationFailed` where
    /// possible so the failure is observable and retryable.
    pub async fn handle_notification(
        &self,
        notification: &Notification,
    ) -> Result<GenerationOutcome> {
        if notification.detail_type == NotificationKind::ContentGenerated {
            return Ok(GenerationOutcome::SkippedCompletionNotification);
        }

        let space_id = notification.detail.space_id.clone();
        let node_id = notification.detail.node_id.clone();

        // Authoritative read; the notification payload may be stale
        let Some(node) = timed(
            "get_node",
            self.config.op_timeout,
            self.records.get_node(&space_id, &node_id),
        )
        .await?
        else {
            warn!("Node '{node_id}' in space '{space_id}' vanished before generation");
            return Ok(GenerationOutcome::SkippedMissingNode);
        };

        if node.has_content() {
            debug!("Node '{node_id}' already has content, skipping");
            return Ok(GenerationOutcome::SkippedExistingContent);
        }

        // Claim the node. Exactly one concurrent claimant can pass the
        // AwaitingGeneration guard.
        let claim = NodeUpdate::new().with_generation_state(GenerationState::Generating);
        match timed(
            "claim node",
            self.config.op_timeout,
            self.records
                .update_node(&space_id, &node_id, claim, Some(UpdateCondition::AwaitingGeneration)),
        )
        .await
        {
            Ok(_) => {}
            Err(ServiceError::ConditionFailed(_)) => {
                debug!("Node '{node_id}' already claimed by another worker");
                return Ok(GenerationOutcome::SkippedAlreadyClaimed);
            }
            Err(ServiceError::NotFound(_)) => {
                return Ok(GenerationOutcome::SkippedMissingNode);
            }
            Err(err) => return Err(err),
        }

        let prompt = self.build_prompt(&node).await;

        let text = match self.generate_text(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                error!("Generation backend failed for node '{node_id}': {err}");
                self.mark_failed(&space_id, &node_id).await;
                return Err(err);
            }
        };

        let html = wrap_generated_html(&text);
        let blob_key = content_blob_key(&space_id, &node_id);

        if let Err(err) = timed(
            "blob put",
            self.config.op_timeout,
            self.blobs
                .put(&blob_key, html.clone().into_bytes(), HTML_CONTENT_TYPE),
        )
        .await
        {
            error!("Storing generated content for node '{node_id}' failed: {err}");
            self.mark_failed(&space_id, &node_id).await;
            return Err(err);
        }

        // Final fence: only attach the pointer while the record is still
        // content-free. Losing this race means someone wrote content
        // while we were generating; their write wins.
        let preview: String = html.chars().take(self.config.preview_len).collect();
        let attach = NodeUpdate::new()
            .with_content(Some(ContentPointer::Blob {
                key: blob_key.clone(),
                preview: Some(preview),
            }))
            .with_generation_state(GenerationState::Generated);

        let updated = match timed(
            "attach content",
            self.config.op_timeout,
            self.records
                .update_node(&space_id, &node_id, attach, Some(UpdateCondition::ContentAbsent)),
        )
        .await
        {
            Ok(updated) => updated,
            Err(ServiceError::ConditionFailed(_)) => {
                info!("Content appeared concurrently on node '{node_id}', discarding generated blob");
                if let Err(err) = self.blobs.delete(&blob_key).await {
                    warn!("Could not remove orphaned blob '{blob_key}': {err}");
                }
                return Ok(GenerationOutcome::SkippedExistingContent);
            }
            Err(err) => return Err(err),
        };

        self.publisher
            .publish(Notification::content_generated(&updated))
            .await?;

        info!("Generated content for node '{node_id}' in space '{space_id}'");
        Ok(GenerationOutcome::Generated { blob_key })
    }

    /// Consume notifications until the bus closes. Lag drops are logged
    /// and skipped; handler failures are logged, never fatal.
    pub async fn run(self: Arc<Self>, mut receiver: broadcast::Receiver<Notification>) {
        loop {
            match receiver.recv().await {
                Ok(notification) => {
                    if let Err(err) = self.handle_notification(&notification).await {
                        error!("Content generation failed: {err}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Generation consumer lagged, {skipped} notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Fold parent and sibling titles into the prompt when available.
    /// Context gathering is best-effort; a failed lookup degrades the
    /// prompt, not the pipeline.
    async fn build_prompt(&self, node: &Node) -> String {
        let mut parent_title = None;
        let mut sibling_titles = Vec::new();

        if let Some(parent_id) = &node.parent_node_id {
            match self.records.get_node(&node.space_id, parent_id).await {
                Ok(Some(parent)) => parent_title = Some(parent.title),
                Ok(None) => {}
                Err(err) => warn!("Could not retrieve parent node '{parent_id}': {err}"),
            }

            match self.records.query_by_parent(&node.space_id, parent_id).await {
                Ok(siblings) => {
                    sibling_titles = siblings
                        .into_iter()
                        .filter(|s| s.node_id != node.node_id)
                        .take(self.config.sibling_context_limit)
                        .map(|s| s.title)
                        .collect();
                }
                Err(err) => warn!("Could not retrieve sibling nodes: {err}"),
            }
        }

        build_content_prompt(&node.title, parent_title.as_deref(), &sibling_titles)
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(
            self.config.generation_timeout,
            self.backend.generate(prompt, &self.config.params),
        )
        .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(ServiceError::Generation(GenerationError::Timeout(
                self.config.generation_timeout,
            ))),
        }
    }

    /// Best-effort transition to `GenerationFailed` so the stuck claim is
    /// observable and a later trigger can retry
    async fn mark_failed(&self, space_id: &str, node_id: &str) {
        let update = NodeUpdate::new().with_generation_state(GenerationState::GenerationFailed);
        if let Err(err) = self
            .records
            .update_node(space_id, node_id, update, Some(UpdateCondition::Exists))
            .await
        {
            warn!("Could not mark node '{node_id}' as failed: {err}");
        }
    }
}

/// Prompt sent to the model backend for one node
pub fn build_content_prompt(
    title: &str,
    parent_title: Option<&str>,
    sibling_titles: &[String],
) -> String {
    let mut prompt = format!(
        "Generate concise, informative HTML content for a mind map node titled \"{title}\".\n\
         \n\
         The content should:\n\
         1. Provide a brief explanation or definition related to the title\n\
         2. Include 2-3 key points or facts relevant to the topic\n\
         3. Be formatted as clean HTML with minimal styling\n\
         4. Be concise but comprehensive, suitable for a mind map node\n"
    );

    if let Some(parent) = parent_title {
        prompt.push_str(&format!(
            "\nThis is a child node under the parent topic: \"{parent}\"\n"
        ));
    }

    if !sibling_titles.is_empty() {
        let list = sibling_titles
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| format!("\"{s}\""))
            .collect::<Vec<_>>()
            .join(", ");
        if !list.is_empty() {
            prompt.push_str(&format!(
                "\nOther related nodes at the same level include: {list}\n"
            ));
        }
    }

    prompt
}

/// Wrap model output in the marker element the frontend styles
pub fn wrap_generated_html(text: &str) -> String {
    format!("<div class=\"ai-generated-content\">\n{text}\n</div>")
}
