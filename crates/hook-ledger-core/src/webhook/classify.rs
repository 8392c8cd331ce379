//! # Delivery Classification
//!
//! Decides which event category and payload dialect a delivery belongs to.
//!
//! Per-project hooks declare their category directly in the `X-Gitlab-Event`
//! header. Instance-wide system hooks all arrive with the `System Hook`
//! header and are discriminated by the payload envelope instead: new-format
//! events carry an `object_kind` field, legacy flat events carry only an
//! `event_name` drawn from a fixed catalogue.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Header value announcing an instance-wide system hook delivery
pub const SYSTEM_HOOK_EVENT: &str = "System Hook";

/// Logical event family, independent of payload dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    MergeRequest,
    Note,
    Project,
    User,
    Group,
    AccessRequest,
    Key,
    RepositoryUpdate,
    MemberApproval,
    Push,
    TagPush,
    Issues,
    Unsupported,
}

impl EventCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MergeRequest => "merge_request",
            Self::Note => "note",
            Self::Project => "project",
            Self::User => "user",
            Self::Group => "group",
            Self::AccessRequest => "access_request",
            Self::Key => "key",
            Self::RepositoryUpdate => "repository_update",
            Self::MemberApproval => "member_approval",
            Self::Push => "push",
            Self::TagPush => "tag_push",
            Self::Issues => "issues",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the two historical GitLab payload shapes, plus the legacy flat
/// system-hook format that predates envelope discriminators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Hook,
    SystemHook,
    LegacyFlat,
}

impl Dialect {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hook => "hook",
            Self::SystemHook => "system_hook",
            Self::LegacyFlat => "legacy_flat",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a delivery, derived purely from its header and envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventClassification {
    pub category: EventCategory,
    pub dialect: Dialect,
}

impl EventClassification {
    /// Whether the pipeline has a typed parser for this classification
    pub fn is_supported(&self) -> bool {
        self.category != EventCategory::Unsupported
    }
}

// ============================================================================
// Dispatch Tables
// ============================================================================

/// Per-project hook categories declared directly by the event-type header
static HOOK_HEADER_TABLE: Lazy<HashMap<&'static str, EventCategory>> = Lazy::new(|| {
    HashMap::from([
        ("Merge Request Hook", EventCategory::MergeRequest),
        ("Note Hook", EventCategory::Note),
        ("Push Hook", EventCategory::Push),
        ("Tag Push Hook", EventCategory::TagPush),
        ("Issues Hook", EventCategory::Issues),
    ])
});

/// New-format system hook categories keyed by the `object_kind` discriminator
static OBJECT_KIND_TABLE: Lazy<HashMap<&'static str, EventCategory>> = Lazy::new(|| {
    HashMap::from([
        ("merge_request", EventCategory::MergeRequest),
        (
            "gitlab_subscription_member_approval",
            EventCategory::MemberApproval,
        ),
        (
            "gitlab_subscription_member_approvals",
            EventCategory::MemberApproval,
        ),
    ])
});

/// Legacy flat system hook catalogue, keyed by `event_name`
static EVENT_NAME_TABLE: Lazy<HashMap<&'static str, EventCategory>> = Lazy::new(|| {
    HashMap::from([
        ("project_create", EventCategory::Project),
        ("project_destroy", EventCategory::Project),
        ("project_rename", EventCategory::Project),
        ("project_transfer", EventCategory::Project),
        ("project_update", EventCategory::Project),
        ("user_create", EventCategory::User),
        ("user_destroy", EventCategory::User),
        ("user_rename", EventCategory::User),
        ("user_failed_login", EventCategory::User),
        ("group_create", EventCategory::Group),
        ("group_destroy", EventCategory::Group),
        ("group_rename", EventCategory::Group),
        (
            "user_access_request_revoked_for_group",
            EventCategory::AccessRequest,
        ),
        (
            "user_access_request_revoked_for_project",
            EventCategory::AccessRequest,
        ),
        ("user_access_request_to_group", EventCategory::AccessRequest),
        (
            "user_access_request_to_project",
            EventCategory::AccessRequest,
        ),
        ("user_add_to_group", EventCategory::AccessRequest),
        ("user_add_to_team", EventCategory::AccessRequest),
        ("user_remove_from_group", EventCategory::AccessRequest),
        ("user_remove_from_team", EventCategory::AccessRequest),
        ("user_update_for_group", EventCategory::AccessRequest),
        ("user_update_for_team", EventCategory::AccessRequest),
        ("key_create", EventCategory::Key),
        ("key_destroy", EventCategory::Key),
        ("repository_update", EventCategory::RepositoryUpdate),
    ])
});

// ============================================================================
// Classification
// ============================================================================

/// Classify a delivery from its event-type header and decoded payload.
///
/// Never fails: anything outside the dispatch tables is `Unsupported`, which
/// callers acknowledge as received-but-not-processed. The caller is
/// responsible for rejecting a missing header or an undecodable body before
/// classification runs.
pub fn classify(event_type: &str, payload: &serde_json::Value) -> EventClassification {
    if event_type == SYSTEM_HOOK_EVENT {
        return classify_system_hook(payload);
    }

    let category = HOOK_HEADER_TABLE
        .get(event_type)
        .copied()
        .unwrap_or(EventCategory::Unsupported);

    EventClassification {
        category,
        dialect: Dialect::Hook,
    }
}

/// Classify a system hook payload by its envelope discriminators
fn classify_system_hook(payload: &serde_json::Value) -> EventClassification {
    let object_kind = payload
        .get("object_kind")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if !object_kind.is_empty() {
        let category = OBJECT_KIND_TABLE
            .get(object_kind)
            .copied()
            .unwrap_or(EventCategory::Unsupported);

        return EventClassification {
            category,
            dialect: Dialect::SystemHook,
        };
    }

    let event_name = payload
        .get("event_name")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let category = EVENT_NAME_TABLE
        .get(event_name)
        .copied()
        .unwrap_or(EventCategory::Unsupported);

    EventClassification {
        category,
        dialect: Dialect::LegacyFlat,
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
