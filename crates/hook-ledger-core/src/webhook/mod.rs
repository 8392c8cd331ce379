//! # Webhook Processing Module
//!
//! Handles GitLab webhook delivery classification, parsing, normalization,
//! and acknowledgement.
//!
//! A delivery moves through `Received → Classified → Parsed → Projected →
//! Acknowledged`, with `Rejected` reachable from `Received` (missing header,
//! undecodable body) or `Parsed` (shape mismatch). Every failure is terminal
//! for that delivery and reported synchronously; there is no retry state.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use classify::classify;
use parser::parse_event;
use record::project;

// ============================================================================
// Core Types
// ============================================================================

/// Raw HTTP request data from a GitLab webhook delivery
#[derive(Debug, Clone)]
pub struct Delivery {
    pub headers: DeliveryHeaders,
    pub body: Bytes,
}

impl Delivery {
    /// Create new delivery
    pub fn new(headers: DeliveryHeaders, body: Bytes) -> Self {
        Self { headers, body }
    }

    /// Get event type from headers
    pub fn event_type(&self) -> &str {
        &self.headers.event_type
    }

    /// Get shared-secret token from headers if present
    pub fn token(&self) -> Option<&str> {
        self.headers.token.as_deref()
    }
}

/// GitLab-specific HTTP headers consumed by the pipeline
#[derive(Debug, Clone)]
pub struct DeliveryHeaders {
    pub event_type: String,           // X-Gitlab-Event
    pub instance_url: Option<String>, // X-Gitlab-Instance
    pub token: Option<String>,        // X-Gitlab-Token, checked by the auth collaborator
    pub user_agent: Option<String>,   // User-Agent
}

impl DeliveryHeaders {
    /// Parse headers from HTTP header map.
    ///
    /// A missing event-type header is a hard input error: without it the
    /// delivery's shape cannot be determined at all, unlike an unrecognized
    /// category which is acknowledged as received-but-not-processed.
    pub fn from_http_headers(headers: &HashMap<String, String>) -> Result<Self, WebhookError> {
        let event_type = headers
            .get("x-gitlab-event")
            .or_else(|| headers.get("X-Gitlab-Event"))
            .filter(|value| !value.is_empty())
            .ok_or(WebhookError::MissingHeader {
                header: "X-Gitlab-Event",
            })?
            .clone();

        let instance_url = headers
            .get("x-gitlab-instance")
            .or_else(|| headers.get("X-Gitlab-Instance"))
            .cloned();

        let token = headers
            .get("x-gitlab-token")
            .or_else(|| headers.get("X-Gitlab-Token"))
            .cloned();

        let user_agent = headers
            .get("user-agent")
            .or_else(|| headers.get("User-Agent"))
            .cloned();

        Ok(Self {
            event_type,
            instance_url,
            token,
            user_agent,
        })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Top-level error for delivery processing failures
///
/// Every variant is a terminal client error; unsupported categories and
/// persistence failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing required header: {header}")]
    MissingHeader { header: &'static str },

    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Payload(#[from] parser::PayloadError),
}

impl WebhookError {
    /// Build the error acknowledgement returned to the caller
    pub fn to_acknowledgement(&self) -> Acknowledgement {
        Acknowledgement {
            status: AckStatus::Error,
            message: self.to_string(),
            event: serde_json::Value::Null,
        }
    }
}

// ============================================================================
// Acknowledgement
// ============================================================================

/// Outcome reported in the acknowledgement payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Success,
    Error,
}

/// Uniform acknowledgement payload returned to the webhook sender
///
/// Unsupported deliveries are acknowledged with success semantics: an
/// unknown-but-well-formed delivery is not a caller error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub status: AckStatus,
    pub message: String,
    pub event: serde_json::Value,
}

impl Acknowledgement {
    /// Successful acknowledgement with an echoed event summary
    pub fn success(message: impl Into<String>, event: serde_json::Value) -> Self {
        Self {
            status: AckStatus::Success,
            message: message.into(),
            event,
        }
    }
}

// ============================================================================
// Core Operations
// ============================================================================

/// Main interface for the delivery processing pipeline
#[async_trait]
pub trait DeliveryProcessor: Send + Sync {
    /// Process one delivery through classification, parsing, projection, and
    /// persistence, producing the acknowledgement for the caller
    async fn process(&self, delivery: Delivery) -> Result<Acknowledgement, WebhookError>;
}

/// Delivery pipeline with an optionally injected persistence collaborator
///
/// Without a store the pipeline still classifies, parses, and projects, and
/// acknowledges success; useful for testing and for degraded operation when
/// the storage schema does not exist.
pub struct DeliveryPipeline {
    store: Option<Arc<dyn store::EventStore>>,
}

impl DeliveryPipeline {
    /// Create new pipeline with an optional event store
    pub fn new(store: Option<Arc<dyn store::EventStore>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DeliveryProcessor for DeliveryPipeline {
    async fn process(&self, delivery: Delivery) -> Result<Acknowledgement, WebhookError> {
        info!(
            event_type = %delivery.event_type(),
            instance = delivery.headers.instance_url.as_deref().unwrap_or(""),
            "Processing GitLab webhook delivery"
        );

        // The body is read exactly once; a body that is not JSON at all is a
        // hard input error regardless of category.
        let payload: serde_json::Value = serde_json::from_slice(&delivery.body)?;

        let classification = classify(delivery.event_type(), &payload);
        if !classification.is_supported() {
            info!(
                event_type = %delivery.event_type(),
                dialect = %classification.dialect,
                "Unsupported delivery acknowledged without processing"
            );
            return Ok(unsupported_acknowledgement(&delivery, classification, &payload));
        }

        let event = parse_event(classification, &payload)?;
        let record = project(&event, classification, &delivery.body);
        let (message, summary) = summarize(&event, classification);

        match &self.store {
            Some(store) => {
                if let Err(error) = store.persist(record).await {
                    warn!(
                        error = %error,
                        category = %classification.category,
                        "Failed to persist normalized record"
                    );
                } else {
                    info!(
                        category = %classification.category,
                        dialect = %classification.dialect,
                        "Normalized record persisted"
                    );
                }
            }
            None => {
                info!("Record persistence skipped - no store configured");
            }
        }

        Ok(Acknowledgement::success(message, summary))
    }
}

/// Acknowledgement for recognized-shape deliveries outside the dispatch tables
fn unsupported_acknowledgement(
    delivery: &Delivery,
    classification: EventClassification,
    payload: &serde_json::Value,
) -> Acknowledgement {
    match classification.dialect {
        Dialect::Hook => Acknowledgement::success(
            "Event received but not processed",
            json!({ "event": delivery.event_type() }),
        ),
        Dialect::SystemHook => Acknowledgement::success(
            "New format system event received but not processed",
            json!({
                "object_kind": payload.get("object_kind").cloned().unwrap_or_default(),
                "action": payload.get("action").cloned().unwrap_or_default(),
            }),
        ),
        Dialect::LegacyFlat => Acknowledgement::success(
            "System hook event received but not processed",
            json!({
                "event_name": payload.get("event_name").cloned().unwrap_or_default(),
            }),
        ),
    }
}

/// Processed message and echoed summary for a parsed event
fn summarize(
    event: &TypedEvent,
    classification: EventClassification,
) -> (&'static str, serde_json::Value) {
    match event {
        TypedEvent::MergeRequest(event) => {
            let attrs = &event.object_attributes;
            let mut summary = json!({
                "action": attrs.action,
                "mr_id": attrs.iid,
                "title": attrs.title,
                "state": attrs.state,
                "project": event.project.name,
            });
            if classification.dialect == Dialect::SystemHook {
                summary["source"] = json!(record::SYSTEM_HOOK_SOURCE);
                ("System hook merge request event processed", summary)
            } else {
                ("Merge request event processed", summary)
            }
        }
        TypedEvent::Note(event) => (
            "Note event processed",
            json!({
                "action": event.object_attributes.action,
                "note_id": event.object_attributes.id,
                "noteable_type": event.object_attributes.noteable_type,
                "project": event.project.name,
                "author_id": event.object_attributes.author_id,
            }),
        ),
        TypedEvent::Project(event) => (
            "Project system event processed",
            json!({
                "event_name": event.event_name,
                "project_id": event.project_id,
                "project_name": event.name,
                "path": event.path_with_namespace,
            }),
        ),
        TypedEvent::User(event) => (
            "User system event processed",
            json!({
                "event_name": event.event_name,
                "user_id": event.user_id,
                "user_name": event.user_name,
                "username": event.user_username,
            }),
        ),
        TypedEvent::Group(event) => (
            "Group system event processed",
            json!({
                "event_name": event.event_name,
                "group_id": event.group_id,
                "group_name": event.name,
                "path": event.path_with_namespace,
            }),
        ),
        TypedEvent::AccessRequest(event) => (
            "Access request event processed",
            json!({
                "event_name": event.event_name,
                "user_id": event.user_id,
                "user_name": event.user_name,
            }),
        ),
        TypedEvent::Key(event) => (
            "Key event processed",
            json!({
                "event_name": event.event_name,
                "user_id": event.user_id,
                "key_id": event.key_id,
            }),
        ),
        TypedEvent::RepositoryUpdate(event) => (
            "Repository update event processed",
            json!({
                "event_name": event.event_name,
                "user_id": event.user_id,
                "project_id": event.project_id,
                "project_name": event.project.name,
                "refs_count": event.refs.len(),
            }),
        ),
        TypedEvent::MemberApproval(event) => (
            "Member approval event processed",
            json!({
                "object_kind": event.object_kind,
                "action": event.action,
                "user_id": event.user_id,
                "status": event.object_attributes.status,
            }),
        ),
        TypedEvent::Push(event) => (
            "Push event processed",
            json!({
                "project_id": event.project_id,
                "ref": event.ref_name,
                "commit_count": event.total_commits_count,
            }),
        ),
        TypedEvent::TagPush(event) => (
            "Tag push event processed",
            json!({
                "project_id": event.project_id,
                "ref": event.ref_name,
                "commit_count": event.total_commits_count,
            }),
        ),
        TypedEvent::Issues(event) => (
            "Issue event processed",
            json!({
                "action": event.object_attributes.action,
                "issue_id": event.object_attributes.iid,
                "title": event.object_attributes.title,
                "state": event.object_attributes.state,
                "project": event.project.name,
            }),
        ),
    }
}

// ============================================================================
// Submodules
// ============================================================================

pub mod author;
pub mod classify;
pub mod events;
pub mod parser;
pub mod record;
pub mod store;

pub use author::{resolve_author, ResolvedAuthor};
pub use classify::{Dialect, EventCategory, EventClassification};
pub use events::{EventTime, Noteable, TypedEvent};
pub use parser::PayloadError;
pub use record::NormalizedRecord;
pub use store::{EventStore, InMemoryEventStore, StoreError};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
