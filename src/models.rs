//! Data models for Smart Bookmark
//!
//! Defines the core data structures: User, Bookmark, and NewBookmark.
//! Bookmarks are immutable after creation - there is no edit operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user, as reported by the identity service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique identifier assigned by the identity service
    pub id: Uuid,
    /// Email address, when the provider shares one
    pub email: Option<String>,
}

impl User {
    /// Create a user with a fresh random id
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: Some(email.into()),
        }
    }

    /// Create a user with a specific id (for loading from a session)
    pub fn with_id(id: Uuid) -> Self {
        Self { id, email: None }
    }
}

/// A saved bookmark, owned by exactly one user
///
/// `id` and `created_at` are assigned by the store at insert time and never
/// change afterwards. Listings are always ordered by `created_at` descending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    /// Unique identifier, assigned by the store, never reused
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// The bookmarked URL
    pub url: String,
    /// Owner of this row; set once at creation
    pub owner_id: Uuid,
    /// When this bookmark was created; the sole sort key
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new bookmark
///
/// Only constructed from validated, trimmed input (see [`crate::validate`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub owner_id: Uuid,
}
