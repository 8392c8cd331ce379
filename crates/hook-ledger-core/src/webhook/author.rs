//! # Author Resolution Policy
//!
//! Merge-request payloads carry two user references: the merge request's
//! recorded author and the user who triggered the delivery. Either can be
//! missing or incomplete, so the display author is resolved with a fixed
//! precedence, independently for the name and the username.

use super::events::GitLabUser;
use tracing::{info, warn};

/// Display name used when neither user reference carries a usable name
pub const DEFAULT_AUTHOR_NAME: &str = "Unknown Author";

/// Username used when neither user reference carries a usable username
pub const DEFAULT_AUTHOR_USERNAME: &str = "unknown";

/// Resolved display identity for an event author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAuthor {
    pub name: String,
    pub username: String,
}

/// Resolve the display author from the recorded author and the triggering user.
///
/// Precedence per field: the recorded author's value wins when its user id is
/// a positive integer and the field is non-empty; otherwise the triggering
/// user's value under the same condition; otherwise the fixed default. Name
/// and username are resolved independently and may come from different
/// references.
pub fn resolve_author(author: &GitLabUser, triggering: &GitLabUser) -> ResolvedAuthor {
    let name = match (usable(author, &author.name), usable(triggering, &triggering.name)) {
        (Some(name), _) => name.to_string(),
        (None, Some(name)) => {
            info!(
                triggering_user_id = triggering.id,
                triggering_user_name = name,
                "Using triggering user as author name fallback"
            );
            name.to_string()
        }
        (None, None) => {
            warn!(
                author_id = author.id,
                triggering_user_id = triggering.id,
                "Both author and triggering user name are invalid, using default"
            );
            DEFAULT_AUTHOR_NAME.to_string()
        }
    };

    let username = match (
        usable(author, &author.username),
        usable(triggering, &triggering.username),
    ) {
        (Some(username), _) => username.to_string(),
        (None, Some(username)) => {
            info!(
                triggering_user_id = triggering.id,
                triggering_user_username = username,
                "Using triggering user as author username fallback"
            );
            username.to_string()
        }
        (None, None) => {
            warn!(
                author_id = author.id,
                triggering_user_id = triggering.id,
                "Both author and triggering user username are invalid, using default"
            );
            DEFAULT_AUTHOR_USERNAME.to_string()
        }
    };

    ResolvedAuthor { name, username }
}

/// A field is usable when its owning user id is positive and it is non-empty
fn usable<'a>(user: &GitLabUser, field: &'a Option<String>) -> Option<&'a str> {
    if user.id > 0 {
        field.as_deref().filter(|value| !value.is_empty())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "author_tests.rs"]
mod tests;
