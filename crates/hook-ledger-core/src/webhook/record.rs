//! # Normalization and Projection
//!
//! Maps each typed event to a flat, persistence-ready record: a set of scalar
//! fields keyed the way the storage collaborator's collections expect, plus
//! the verbatim raw payload for audit. Projection is pure; persistence
//! happens behind the [`EventStore`](super::store::EventStore) seam.

use super::author::resolve_author;
use super::classify::{Dialect, EventClassification};
use super::events::{
    AccessRequestEvent, EventTime, GroupLifecycleEvent, IssueEvent, KeyEvent, MemberApprovalEvent,
    MergeRequestEvent, NoteEvent, Noteable, ProjectLifecycleEvent, PushEvent,
    RepositoryUpdateEvent, TypedEvent, UserLifecycleEvent,
};
use bytes::Bytes;
use serde_json::{Map, Value};

// Collection names, mirroring the storage collaborator's schema
pub const MERGE_REQUESTS: &str = "gitlab_merge_requests";
pub const NOTE_EVENTS: &str = "gitlab_note_events";
pub const PROJECT_SYSTEM_EVENTS: &str = "gitlab_project_system_events";
pub const USER_SYSTEM_EVENTS: &str = "gitlab_user_system_events";
pub const GROUP_SYSTEM_EVENTS: &str = "gitlab_group_system_events";
pub const ACCESS_REQUEST_EVENTS: &str = "gitlab_access_request_events";
pub const KEY_EVENTS: &str = "gitlab_key_events";
pub const REPOSITORY_UPDATE_EVENTS: &str = "gitlab_repository_update_events";
pub const MEMBER_APPROVAL_EVENTS: &str = "gitlab_member_approval_events";
pub const PUSH_EVENTS: &str = "gitlab_push_events";
pub const TAG_PUSH_EVENTS: &str = "gitlab_tag_push_events";
pub const ISSUE_EVENTS: &str = "gitlab_issue_events";

/// Origin marker distinguishing System Hook merge requests from Hook ones
pub const SYSTEM_HOOK_SOURCE: &str = "system_hook";

/// Flat scalar record handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub collection: &'static str,
    pub fields: Map<String, Value>,
}

impl NormalizedRecord {
    fn new(collection: &'static str) -> Self {
        Self {
            collection,
            fields: Map::new(),
        }
    }

    /// Set a scalar field
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Set a field only when the source actually carried a value
    pub fn set_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    /// Get a projected field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Project a typed event into its normalized record.
///
/// Always includes the verbatim raw payload under `event_data`, even when
/// structured fields are partially missing.
pub fn project(
    event: &TypedEvent,
    classification: EventClassification,
    raw: &Bytes,
) -> NormalizedRecord {
    let mut record = match event {
        TypedEvent::MergeRequest(event) => project_merge_request(event, classification),
        TypedEvent::Note(event) => project_note(event),
        TypedEvent::Project(event) => project_project(event),
        TypedEvent::User(event) => project_user(event),
        TypedEvent::Group(event) => project_group(event),
        TypedEvent::AccessRequest(event) => project_access_request(event),
        TypedEvent::Key(event) => project_key(event),
        TypedEvent::RepositoryUpdate(event) => project_repository_update(event),
        TypedEvent::MemberApproval(event) => project_member_approval(event),
        TypedEvent::Push(event) => project_push(event, PUSH_EVENTS),
        TypedEvent::TagPush(event) => project_push(event, TAG_PUSH_EVENTS),
        TypedEvent::Issues(event) => project_issue(event),
    };

    record.set("event_data", String::from_utf8_lossy(raw).into_owned());
    record
}

fn project_merge_request(
    event: &MergeRequestEvent,
    classification: EventClassification,
) -> NormalizedRecord {
    let attrs = &event.object_attributes;
    let mut record = NormalizedRecord::new(MERGE_REQUESTS);

    record.set("mr_id", attrs.id);
    record.set("mr_iid", attrs.iid);
    record.set_opt("title", attrs.title.as_deref());
    record.set_opt("description", attrs.description.as_deref());
    record.set_opt("state", attrs.state.as_deref());
    record.set_opt("action", attrs.action.as_deref());

    let author = resolve_author(&attrs.author, &event.user);
    record.set("author_name", author.name);
    record.set("author_username", author.username);

    record.set("project_id", event.project.id);
    record.set_opt("project_name", event.project.name.as_deref());
    record.set_opt("source_branch", attrs.source_branch.as_deref());
    record.set_opt("target_branch", attrs.target_branch.as_deref());
    record.set_opt("url", attrs.url.as_deref());

    // System Hook records keep the original timestamp text, empty or not,
    // and are tagged with their origin so both dialects stay distinguishable
    // downstream.
    if classification.dialect == Dialect::SystemHook {
        if let EventTime::Raw(created) = &attrs.created_at {
            record.set("created_at", created.as_str());
        }
        if let EventTime::Raw(updated) = &attrs.updated_at {
            record.set("updated_at", updated.as_str());
        }
        record.set("event_source", SYSTEM_HOOK_SOURCE);
    }

    record
}

fn project_note(event: &NoteEvent) -> NormalizedRecord {
    let attrs = &event.object_attributes;
    let mut record = NormalizedRecord::new(NOTE_EVENTS);

    record.set("note_id", attrs.id);
    record.set_opt("note_content", attrs.note.as_deref());
    record.set("noteable_type", attrs.noteable_type.as_str());
    record.set("author_id", attrs.author_id);
    record.set("project_id", event.project.id);
    record.set_opt("project_name", event.project.name.as_deref());
    record.set_opt("action", attrs.action.as_deref());
    record.set("system", attrs.system);
    record.set_opt("created_at", attrs.created_at.as_deref());
    record.set_opt("updated_at", attrs.updated_at.as_deref());
    record.set_opt("url", attrs.url.as_deref());

    // Enrichment fields come from the declared noteable's sub-object; when
    // it is absent they are simply omitted.
    match event.noteable() {
        Noteable::MergeRequest(mr) => {
            record.set("noteable_id", mr.iid);
            record.set_opt("noteable_title", mr.title.as_deref());
            record.set_opt("noteable_state", mr.state.as_deref());
        }
        Noteable::Issue(issue) => {
            record.set("noteable_id", issue.iid);
            record.set_opt("noteable_title", issue.title.as_deref());
            record.set_opt("noteable_state", issue.state.as_deref());
        }
        Noteable::Commit(commit) => {
            record.set("noteable_id", commit.id.as_str());
            record.set_opt("noteable_title", commit.message.as_deref());
            record.set("commit_id", commit.id.as_str());
        }
        Noteable::Snippet(snippet) => {
            record.set("noteable_id", snippet.id);
            record.set_opt("noteable_title", snippet.title.as_deref());
        }
        Noteable::Absent => {}
    }

    record.set_opt("line_code", attrs.line_code.as_deref());
    if let Some(commit_id) = attrs.commit_id.as_deref() {
        record.set("commit_id", commit_id);
    }

    record
}

fn project_project(event: &ProjectLifecycleEvent) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(PROJECT_SYSTEM_EVENTS);

    record.set("event_name", event.event_name.as_str());
    record.set("project_id", event.project_id);
    record.set_opt("project_name", event.name.as_deref());
    record.set_opt("path", event.path.as_deref());
    record.set_opt("path_with_namespace", event.path_with_namespace.as_deref());
    record.set_opt("project_visibility", event.project_visibility.as_deref());
    record.set_opt("owner_name", event.owner_name.as_deref());
    record.set_opt("owner_email", event.owner_email.as_deref());
    record.set_opt(
        "old_path_with_namespace",
        event.old_path_with_namespace.as_deref(),
    );

    record
}

fn project_user(event: &UserLifecycleEvent) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(USER_SYSTEM_EVENTS);

    record.set("event_name", event.event_name.as_str());
    record.set("user_id", event.user_id);
    record.set_opt("user_name", event.user_name.as_deref());
    record.set_opt("user_email", event.user_email.as_deref());
    record.set_opt("user_username", event.user_username.as_deref());
    record.set_opt("old_username", event.old_username.as_deref());

    record
}

fn project_group(event: &GroupLifecycleEvent) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(GROUP_SYSTEM_EVENTS);

    record.set("event_name", event.event_name.as_str());
    record.set("group_id", event.group_id);
    record.set_opt("group_name", event.name.as_deref());
    record.set_opt("path", event.path.as_deref());
    record.set_opt("path_with_namespace", event.path_with_namespace.as_deref());
    record.set_opt("old_path", event.old_path.as_deref());
    record.set_opt(
        "old_path_with_namespace",
        event.old_path_with_namespace.as_deref(),
    );

    record
}

fn project_access_request(event: &AccessRequestEvent) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(ACCESS_REQUEST_EVENTS);

    record.set("event_name", event.event_name.as_str());
    record.set("user_id", event.user_id);
    record.set_opt("user_name", event.user_name.as_deref());
    record.set_opt("user_email", event.user_email.as_deref());
    record.set_opt("user_username", event.user_username.as_deref());

    if event.group_id > 0 {
        record.set("group_id", event.group_id);
        record.set_opt("group_name", event.group_name.as_deref());
        record.set_opt("group_path", event.group_path.as_deref());
        record.set_opt("group_access", event.group_access.as_deref());
    }
    if event.project_id > 0 {
        record.set("project_id", event.project_id);
        record.set_opt("project_name", event.project_name.as_deref());
        record.set_opt("project_path", event.project_path.as_deref());
        record.set_opt("project_access", event.project_access.as_deref());
    }

    record
}

fn project_key(event: &KeyEvent) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(KEY_EVENTS);

    record.set("event_name", event.event_name.as_str());
    record.set("user_id", event.user_id);
    record.set_opt("user_name", event.user_name.as_deref());
    record.set_opt("user_email", event.user_email.as_deref());
    record.set("key_id", event.key_id);

    record
}

fn project_repository_update(event: &RepositoryUpdateEvent) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(REPOSITORY_UPDATE_EVENTS);

    record.set("event_name", event.event_name.as_str());
    record.set("user_id", event.user_id);
    record.set_opt("user_name", event.user_name.as_deref());
    record.set_opt("user_email", event.user_email.as_deref());
    record.set("project_id", event.project_id);
    record.set_opt("project_name", event.project.name.as_deref());
    record.set_opt(
        "project_path",
        event.project.path_with_namespace.as_deref(),
    );

    // Ref lists are unbounded and schema-free, so they are embedded verbatim
    // as JSON blobs rather than flattened.
    if let Ok(refs_json) = serde_json::to_string(&event.refs) {
        record.set("refs", refs_json);
    }
    if let Ok(changes_json) = serde_json::to_string(&event.changes) {
        record.set("changes", changes_json);
    }

    record
}

fn project_member_approval(event: &MemberApprovalEvent) -> NormalizedRecord {
    let attrs = &event.object_attributes;
    let mut record = NormalizedRecord::new(MEMBER_APPROVAL_EVENTS);

    record.set("object_kind", event.object_kind.as_str());
    record.set_opt("action", event.action.as_deref());
    record.set("user_id", event.user_id);
    if event.requested_by_user_id > 0 {
        record.set("requested_by_user_id", event.requested_by_user_id);
    }
    if event.reviewed_by_user_id > 0 {
        record.set("reviewed_by_user_id", event.reviewed_by_user_id);
    }
    if event.promotion_namespace_id > 0 {
        record.set("promotion_namespace_id", event.promotion_namespace_id);
    }
    record.set_opt("status", attrs.status.as_deref());
    if attrs.new_access_level > 0 {
        record.set("new_access_level", attrs.new_access_level);
    }
    if attrs.old_access_level > 0 {
        record.set("old_access_level", attrs.old_access_level);
    }

    record
}

fn project_push(event: &PushEvent, collection: &'static str) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(collection);

    record.set("object_kind", event.object_kind.as_str());
    record.set_opt("before", event.before.as_deref());
    record.set_opt("after", event.after.as_deref());
    record.set_opt("ref", event.ref_name.as_deref());
    record.set_opt("checkout_sha", event.checkout_sha.as_deref());
    record.set("user_id", event.user_id);
    record.set_opt("user_name", event.user_name.as_deref());
    record.set_opt("user_username", event.user_username.as_deref());
    record.set("project_id", event.project_id);
    record.set_opt("project_name", event.project.name.as_deref());
    record.set_opt(
        "project_path",
        event.project.path_with_namespace.as_deref(),
    );
    record.set("commit_count", event.total_commits_count);

    record
}

fn project_issue(event: &IssueEvent) -> NormalizedRecord {
    let attrs = &event.object_attributes;
    let mut record = NormalizedRecord::new(ISSUE_EVENTS);

    record.set("issue_id", attrs.id);
    record.set("issue_iid", attrs.iid);
    record.set_opt("title", attrs.title.as_deref());
    record.set_opt("description", attrs.description.as_deref());
    record.set_opt("state", attrs.state.as_deref());
    record.set_opt("action", attrs.action.as_deref());
    record.set("author_id", attrs.author_id);
    record.set("project_id", event.project.id);
    record.set_opt("project_name", event.project.name.as_deref());
    record.set_opt("url", attrs.url.as_deref());

    record
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
