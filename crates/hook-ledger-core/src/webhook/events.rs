//! # Typed GitLab Event Structures
//!
//! Wire structures for the payload shapes GitLab delivers, one family per
//! event category. Unknown JSON fields are ignored everywhere; optional
//! fields tolerate both absence and `null`.
//!
//! The two merge-request dialects (per-project "Hook" and instance-wide
//! "System Hook") share one structure here. The only material difference
//! between them is timestamp treatment, captured by [`EventTime`]: the Hook
//! dialect normalizes timestamps into canonical instants, the System Hook
//! dialect keeps the original text untouched because downstream consumers
//! expect the verbatim form.

use crate::timestamp::{FlexibleTimestamp, TimeFormatError};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Dialect-Tagged Timestamps
// ============================================================================

/// A timestamp field whose treatment depends on the payload dialect
///
/// Deserializes as the raw string; the parser decides per dialect whether to
/// normalize it into an instant.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    /// Canonical instant, produced by the time normalizer (Hook dialect)
    Instant(FlexibleTimestamp),
    /// Verbatim source text, passed through unmodified (System Hook dialect)
    Raw(String),
}

impl EventTime {
    /// Whether the source carried no value at all
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Raw(raw) if raw.is_empty())
    }

    /// Normalize a raw value into a canonical instant
    ///
    /// Empty values stay empty: an absent timestamp is not a format error.
    pub fn normalize(self) -> Result<Self, TimeFormatError> {
        match self {
            Self::Raw(raw) if !raw.is_empty() => {
                Ok(Self::Instant(FlexibleTimestamp::parse(&raw)?))
            }
            other => Ok(other),
        }
    }

    /// The verbatim source text, if this value was never normalized
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            Self::Raw(raw) if !raw.is_empty() => Some(raw),
            _ => None,
        }
    }
}

impl Default for EventTime {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::Raw(raw.unwrap_or_default()))
    }
}

// ============================================================================
// Shared Sub-Objects
// ============================================================================

/// GitLab user reference as it appears inside event payloads
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GitLabUser {
    pub id: i64,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Project sub-object shared by most per-project hook payloads
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GitLabProject {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub web_url: Option<String>,
    pub avatar_url: Option<String>,
    pub git_ssh_url: Option<String>,
    pub git_http_url: Option<String>,
    pub namespace: Option<String>,
    pub visibility_level: i64,
    pub path_with_namespace: Option<String>,
    pub default_branch: Option<String>,
    pub homepage: Option<String>,
    pub url: Option<String>,
    pub ssh_url: Option<String>,
    pub http_url: Option<String>,
}

/// Legacy repository sub-object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GitLabRepository {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

/// Commit author as embedded in commit sub-objects
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Commit sub-object (merge request last commit, push commit lists, commit notes)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Commit {
    pub id: String,
    pub message: Option<String>,
    pub timestamp: Option<FlexibleTimestamp>,
    pub url: Option<String>,
    pub author: CommitAuthor,
}

/// Label attached to merge requests and issues
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Label {
    pub id: i64,
    pub title: Option<String>,
    pub color: Option<String>,
    pub project_id: i64,
    pub created_at: Option<FlexibleTimestamp>,
    pub updated_at: Option<FlexibleTimestamp>,
    pub template: bool,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub label_type: Option<String>,
    pub group_id: i64,
}

/// Previous/current pair for a changed scalar attribute
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldChange {
    pub previous: Option<String>,
    pub current: Option<String>,
}

/// Previous/current pair for the label set
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelChange {
    pub previous: Vec<Label>,
    pub current: Vec<Label>,
}

/// Attribute changes carried by merge-request events
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Changes {
    pub title: FieldChange,
    pub description: FieldChange,
    pub labels: LabelChange,
    pub state: FieldChange,
    pub updated_at: FieldChange,
}

// ============================================================================
// Merge Request Events (both dialects)
// ============================================================================

/// Merge request event, covering both the Hook and System Hook dialects
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MergeRequestEvent {
    pub object_kind: String,
    pub event_type: String,
    pub user: GitLabUser,
    pub project: GitLabProject,
    pub object_attributes: MergeRequestAttributes,
    pub labels: Vec<Label>,
    pub changes: Changes,
    pub repository: GitLabRepository,
}

/// Merge request attributes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MergeRequestAttributes {
    pub id: i64,
    pub iid: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub created_at: EventTime,
    pub updated_at: EventTime,
    pub merge_status: Option<String>,
    pub target_branch: Option<String>,
    pub source_branch: Option<String>,
    pub source_project_id: i64,
    pub target_project_id: i64,
    pub url: Option<String>,
    pub source: Option<GitLabProject>,
    pub target: Option<GitLabProject>,
    pub last_commit: Option<Commit>,
    pub work_in_progress: bool,
    pub assignee: Option<GitLabUser>,
    pub author: GitLabUser,
    pub merge_commit_sha: Option<String>,
    pub blocking_discussions_resolved: bool,
    pub action: Option<String>,
}

// ============================================================================
// Note Events
// ============================================================================

/// Note (comment) event
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoteEvent {
    pub object_kind: String,
    pub event_type: String,
    pub user: GitLabUser,
    pub project_id: i64,
    pub project: GitLabProject,
    pub repository: GitLabRepository,
    pub object_attributes: NoteAttributes,
    pub merge_request: Option<NoteMergeRequest>,
    pub issue: Option<NoteIssue>,
    pub commit: Option<Commit>,
    pub snippet: Option<Snippet>,
}

impl NoteEvent {
    /// Resolve the polymorphic noteable reference.
    ///
    /// Exactly one sub-object matches the declared `noteable_type`; when the
    /// declared type's sub-object is missing (or the type is unknown) the
    /// enrichment is simply `Absent`, never an error.
    pub fn noteable(&self) -> Noteable<'_> {
        match self.object_attributes.noteable_type.as_str() {
            "MergeRequest" => self
                .merge_request
                .as_ref()
                .map_or(Noteable::Absent, Noteable::MergeRequest),
            "Issue" => self.issue.as_ref().map_or(Noteable::Absent, Noteable::Issue),
            "Commit" => self
                .commit
                .as_ref()
                .map_or(Noteable::Absent, Noteable::Commit),
            "Snippet" => self
                .snippet
                .as_ref()
                .map_or(Noteable::Absent, Noteable::Snippet),
            _ => Noteable::Absent,
        }
    }
}

/// The object a note was left on, selected by the `noteable_type` discriminator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Noteable<'a> {
    MergeRequest(&'a NoteMergeRequest),
    Issue(&'a NoteIssue),
    Commit(&'a Commit),
    Snippet(&'a Snippet),
    Absent,
}

/// Note attributes. Note hooks carry timestamps as plain strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoteAttributes {
    pub id: i64,
    pub note: Option<String>,
    pub noteable_type: String,
    pub author_id: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub project_id: i64,
    pub attachment: Option<serde_json::Value>,
    pub line_code: Option<String>,
    pub commit_id: Option<String>,
    // Integer, commit sha string, or null depending on the noteable kind
    pub noteable_id: Option<serde_json::Value>,
    pub system: bool,
    pub st_diff: Option<NoteDiff>,
    pub action: Option<String>,
    pub url: Option<String>,
}

/// Diff context for notes left on code lines
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoteDiff {
    pub diff: Option<String>,
    pub new_path: Option<String>,
    pub old_path: Option<String>,
    pub a_mode: Option<String>,
    pub b_mode: Option<String>,
    pub new_file: bool,
    pub renamed_file: bool,
    pub deleted_file: bool,
}

/// Merge request enrichment attached to merge-request notes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoteMergeRequest {
    pub id: i64,
    pub iid: i64,
    pub target_branch: Option<String>,
    pub source_branch: Option<String>,
    pub source_project_id: i64,
    pub target_project_id: i64,
    pub author_id: i64,
    pub assignee_id: i64,
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub milestone_id: i64,
    pub state: Option<String>,
    pub merge_status: Option<String>,
    pub description: Option<String>,
    pub position: i64,
    pub labels: Vec<Label>,
    pub source: Option<GitLabProject>,
    pub target: Option<GitLabProject>,
    pub last_commit: Option<Commit>,
    pub work_in_progress: bool,
    pub draft: bool,
    pub assignee: Option<GitLabUser>,
    pub detailed_merge_status: Option<String>,
}

/// Issue enrichment attached to issue notes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoteIssue {
    pub id: i64,
    pub iid: i64,
    pub title: Option<String>,
    pub assignee_ids: Vec<i64>,
    pub assignee_id: i64,
    pub author_id: i64,
    pub project_id: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub position: i64,
    pub branch_name: Option<String>,
    pub description: Option<String>,
    pub milestone_id: i64,
    pub state: Option<String>,
    pub labels: Vec<Label>,
}

/// Snippet enrichment attached to snippet notes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Snippet {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub author_id: i64,
    pub project_id: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub file_name: Option<String>,
    #[serde(rename = "type")]
    pub snippet_type: Option<String>,
    pub visibility_level: i64,
    pub url: Option<String>,
}

// ============================================================================
// Legacy Flat System Hook Events
// ============================================================================

/// Project owner reference in legacy project events
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Owner {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Project lifecycle event (`project_create`, `project_rename`, ...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectLifecycleEvent {
    pub event_name: String,
    pub created_at: Option<FlexibleTimestamp>,
    pub updated_at: Option<FlexibleTimestamp>,
    pub name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub owners: Vec<Owner>,
    pub path: Option<String>,
    pub path_with_namespace: Option<String>,
    pub project_id: i64,
    pub project_namespace_id: i64,
    pub project_visibility: Option<String>,
    // Present for project_rename and project_transfer
    pub old_path_with_namespace: Option<String>,
}

/// User lifecycle event (`user_create`, `user_rename`, ...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserLifecycleEvent {
    pub event_name: String,
    pub created_at: Option<FlexibleTimestamp>,
    pub updated_at: Option<FlexibleTimestamp>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub user_username: Option<String>,
    pub user_id: i64,
    // Present for user_rename
    pub old_username: Option<String>,
}

/// Group lifecycle event (`group_create`, `group_rename`, ...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupLifecycleEvent {
    pub event_name: String,
    pub created_at: Option<FlexibleTimestamp>,
    pub updated_at: Option<FlexibleTimestamp>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub path_with_namespace: Option<String>,
    pub group_id: i64,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub old_path: Option<String>,
    pub old_path_with_namespace: Option<String>,
}

/// Membership and access-request event (the `user_*` catalogue bucket)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccessRequestEvent {
    pub event_name: String,
    pub created_at: Option<FlexibleTimestamp>,
    pub updated_at: Option<FlexibleTimestamp>,
    pub group_access: Option<String>,
    pub project_access: Option<String>,
    pub group_id: i64,
    pub project_id: i64,
    pub group_name: Option<String>,
    pub project_name: Option<String>,
    pub group_path: Option<String>,
    pub project_path: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub user_username: Option<String>,
    pub user_id: i64,
}

/// SSH key event (`key_create`, `key_destroy`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeyEvent {
    pub event_name: String,
    pub created_at: Option<FlexibleTimestamp>,
    pub updated_at: Option<FlexibleTimestamp>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_id: i64,
    pub key_id: i64,
}

/// Repository update event, carrying unbounded ref-change lists
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepositoryUpdateEvent {
    pub event_name: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_avatar: Option<String>,
    pub project_id: i64,
    pub project: GitLabProject,
    pub changes: Vec<RefChange>,
    pub refs: Vec<String>,
}

/// One ref change inside a repository update.
///
/// Serializable because ref changes are persisted verbatim as a JSON blob;
/// their cardinality is unbounded and their schema is not flattened.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RefChange {
    pub before: String,
    pub after: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
}

// ============================================================================
// New-Format System Hook Events
// ============================================================================

/// Member approval event (new enveloped system hook format)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemberApprovalEvent {
    pub object_kind: String,
    pub action: Option<String>,
    pub object_attributes: MemberApprovalAttributes,
    pub user_id: i64,
    pub requested_by_user_id: i64,
    pub reviewed_by_user_id: i64,
    pub promotion_namespace_id: i64,
    pub created_at: Option<FlexibleTimestamp>,
    pub updated_at: Option<FlexibleTimestamp>,
}

/// Member approval attributes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemberApprovalAttributes {
    pub new_access_level: i64,
    pub old_access_level: i64,
    pub existing_member_id: i64,
    pub promotion_request_ids_that_failed_to_apply: Vec<i64>,
    pub status: Option<String>,
}

// ============================================================================
// Push, Tag Push, and Issue Events
// ============================================================================

/// Push event; tag pushes share the same shape with a different ref namespace
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PushEvent {
    pub object_kind: String,
    pub event_name: String,
    pub before: Option<String>,
    pub after: Option<String>,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub checkout_sha: Option<String>,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_username: Option<String>,
    pub user_email: Option<String>,
    pub user_avatar: Option<String>,
    pub project_id: i64,
    pub project: GitLabProject,
    pub repository: GitLabRepository,
    pub commits: Vec<Commit>,
    pub total_commits_count: i64,
}

/// Issue event
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IssueEvent {
    pub object_kind: String,
    pub event_type: String,
    pub user: GitLabUser,
    pub project: GitLabProject,
    pub object_attributes: IssueAttributes,
    pub labels: Vec<Label>,
    pub repository: GitLabRepository,
}

/// Issue attributes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IssueAttributes {
    pub id: i64,
    pub iid: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub action: Option<String>,
    pub author_id: i64,
    pub project_id: i64,
    pub url: Option<String>,
    pub created_at: EventTime,
    pub updated_at: EventTime,
}

// ============================================================================
// Typed Event Union
// ============================================================================

/// A successfully parsed delivery, one variant per supported category
#[derive(Debug, Clone, PartialEq)]
pub enum TypedEvent {
    MergeRequest(MergeRequestEvent),
    Note(NoteEvent),
    Project(ProjectLifecycleEvent),
    User(UserLifecycleEvent),
    Group(GroupLifecycleEvent),
    AccessRequest(AccessRequestEvent),
    Key(KeyEvent),
    RepositoryUpdate(RepositoryUpdateEvent),
    MemberApproval(MemberApprovalEvent),
    Push(PushEvent),
    TagPush(PushEvent),
    Issues(IssueEvent),
}
