//! Truth-table tests for author resolution.

use super::*;

fn user(id: i64, name: &str, username: &str) -> GitLabUser {
    GitLabUser {
        id,
        name: if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        },
        username: if username.is_empty() {
            None
        } else {
            Some(username.to_string())
        },
        ..GitLabUser::default()
    }
}

#[test]
fn test_primary_valid_secondary_valid_primary_wins() {
    let resolved = resolve_author(&user(7, "Ada", "ada"), &user(9, "Grace", "grace"));
    assert_eq!(resolved.name, "Ada");
    assert_eq!(resolved.username, "ada");
}

#[test]
fn test_primary_invalid_secondary_valid_secondary_wins() {
    let resolved = resolve_author(&user(0, "Ada", "ada"), &user(9, "Grace", "grace"));
    assert_eq!(resolved.name, "Grace");
    assert_eq!(resolved.username, "grace");
}

#[test]
fn test_primary_valid_secondary_invalid_primary_wins() {
    let resolved = resolve_author(&user(7, "Ada", "ada"), &user(0, "", ""));
    assert_eq!(resolved.name, "Ada");
    assert_eq!(resolved.username, "ada");
}

#[test]
fn test_both_invalid_defaults() {
    let resolved = resolve_author(&user(0, "", ""), &user(0, "", ""));
    assert_eq!(resolved.name, DEFAULT_AUTHOR_NAME);
    assert_eq!(resolved.username, DEFAULT_AUTHOR_USERNAME);
}

#[test]
fn test_positive_id_with_empty_field_is_not_usable() {
    // A positive id alone is not enough, the field itself must be non-empty.
    let resolved = resolve_author(&user(7, "", ""), &user(9, "Grace", "grace"));
    assert_eq!(resolved.name, "Grace");
    assert_eq!(resolved.username, "grace");
}

#[test]
fn test_name_and_username_resolve_independently() {
    // Primary has a usable name but no username; secondary has both.
    let resolved = resolve_author(&user(7, "Ada", ""), &user(9, "Grace", "grace"));
    assert_eq!(resolved.name, "Ada");
    assert_eq!(resolved.username, "grace");
}

#[test]
fn test_username_falls_to_default_while_name_resolves() {
    let resolved = resolve_author(&user(7, "Ada", ""), &user(0, "Grace", "grace"));
    assert_eq!(resolved.name, "Ada");
    assert_eq!(resolved.username, DEFAULT_AUTHOR_USERNAME);
}

#[test]
fn test_name_falls_to_secondary_while_username_uses_primary() {
    let resolved = resolve_author(&user(7, "", "ada"), &user(9, "Grace", ""));
    assert_eq!(resolved.name, "Grace");
    assert_eq!(resolved.username, "ada");
}
