//! # Typed Event Parsers
//!
//! One parser per (category, dialect) pair. Each decodes the payload into the
//! category's structure, enforces the required-identifier invariants, and
//! applies the dialect's timestamp policy.

use super::classify::{Dialect, EventCategory, EventClassification};
use super::events::{
    AccessRequestEvent, GroupLifecycleEvent, IssueEvent, KeyEvent, MemberApprovalEvent,
    MergeRequestEvent, NoteEvent, ProjectLifecycleEvent, PushEvent, RepositoryUpdateEvent,
    TypedEvent, UserLifecycleEvent,
};
use crate::timestamp::TimeFormatError;
use serde::de::DeserializeOwned;

/// Error raised when a payload is valid JSON but not a valid event of its
/// declared category
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Malformed {category} payload: {source}")]
    Decode {
        category: EventCategory,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required field '{field}' in {category} payload")]
    MissingField {
        category: EventCategory,
        field: &'static str,
    },

    #[error("Invalid timestamp in {category} payload: {source}")]
    Time {
        category: EventCategory,
        #[source]
        source: TimeFormatError,
    },

    #[error("No typed parser exists for unsupported deliveries")]
    Unsupported,
}

/// Decode the payload for a classified delivery into its typed event.
///
/// The caller has already decoded the body into a JSON value; shape
/// mismatches surface here as [`PayloadError::Decode`], absent identifiers as
/// [`PayloadError::MissingField`].
pub fn parse_event(
    classification: EventClassification,
    payload: &serde_json::Value,
) -> Result<TypedEvent, PayloadError> {
    let category = classification.category;

    match category {
        EventCategory::MergeRequest => {
            let mut event: MergeRequestEvent = decode(category, payload)?;
            require_id(category, "project.id", event.project.id)?;
            require_id(category, "object_attributes.iid", event.object_attributes.iid)?;

            // The Hook dialect normalizes timestamps; the System Hook dialect
            // keeps the original text for downstream consumers.
            if classification.dialect == Dialect::Hook {
                event.object_attributes.created_at = event
                    .object_attributes
                    .created_at
                    .normalize()
                    .map_err(|source| PayloadError::Time { category, source })?;
                event.object_attributes.updated_at = event
                    .object_attributes
                    .updated_at
                    .normalize()
                    .map_err(|source| PayloadError::Time { category, source })?;
            }

            Ok(TypedEvent::MergeRequest(event))
        }
        EventCategory::Note => {
            let event: NoteEvent = decode(category, payload)?;
            require_id(category, "object_attributes.id", event.object_attributes.id)?;
            require_id(category, "project.id", event.project.id)?;
            Ok(TypedEvent::Note(event))
        }
        EventCategory::Project => {
            let event: ProjectLifecycleEvent = decode(category, payload)?;
            require_id(category, "project_id", event.project_id)?;
            Ok(TypedEvent::Project(event))
        }
        EventCategory::User => {
            let event: UserLifecycleEvent = decode(category, payload)?;
            require_id(category, "user_id", event.user_id)?;
            Ok(TypedEvent::User(event))
        }
        EventCategory::Group => {
            let event: GroupLifecycleEvent = decode(category, payload)?;
            require_id(category, "group_id", event.group_id)?;
            Ok(TypedEvent::Group(event))
        }
        EventCategory::AccessRequest => {
            let event: AccessRequestEvent = decode(category, payload)?;
            require_id(category, "user_id", event.user_id)?;
            Ok(TypedEvent::AccessRequest(event))
        }
        EventCategory::Key => {
            let event: KeyEvent = decode(category, payload)?;
            require_id(category, "user_id", event.user_id)?;
            require_id(category, "key_id", event.key_id)?;
            Ok(TypedEvent::Key(event))
        }
        EventCategory::RepositoryUpdate => {
            let event: RepositoryUpdateEvent = decode(category, payload)?;
            require_id(category, "project_id", event.project_id)?;
            Ok(TypedEvent::RepositoryUpdate(event))
        }
        EventCategory::MemberApproval => {
            let event: MemberApprovalEvent = decode(category, payload)?;
            require_id(category, "user_id", event.user_id)?;
            Ok(TypedEvent::MemberApproval(event))
        }
        EventCategory::Push => {
            let event: PushEvent = decode(category, payload)?;
            require_id(category, "project_id", event.project_id)?;
            Ok(TypedEvent::Push(event))
        }
        EventCategory::TagPush => {
            let event: PushEvent = decode(category, payload)?;
            require_id(category, "project_id", event.project_id)?;
            Ok(TypedEvent::TagPush(event))
        }
        EventCategory::Issues => {
            let mut event: IssueEvent = decode(category, payload)?;
            require_id(category, "project.id", event.project.id)?;
            require_id(category, "object_attributes.iid", event.object_attributes.iid)?;

            event.object_attributes.created_at = event
                .object_attributes
                .created_at
                .normalize()
                .map_err(|source| PayloadError::Time { category, source })?;
            event.object_attributes.updated_at = event
                .object_attributes
                .updated_at
                .normalize()
                .map_err(|source| PayloadError::Time { category, source })?;

            Ok(TypedEvent::Issues(event))
        }
        EventCategory::Unsupported => Err(PayloadError::Unsupported),
    }
}

fn decode<T: DeserializeOwned>(
    category: EventCategory,
    payload: &serde_json::Value,
) -> Result<T, PayloadError> {
    serde_json::from_value(payload.clone())
        .map_err(|source| PayloadError::Decode { category, source })
}

fn require_id(
    category: EventCategory,
    field: &'static str,
    value: i64,
) -> Result<(), PayloadError> {
    if value > 0 {
        Ok(())
    } else {
        Err(PayloadError::MissingField { category, field })
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
