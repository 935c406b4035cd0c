//! Bookmark creation flow
//!
//! Validates a candidate title/URL pair, resolves the acting user, and issues
//! exactly one insert. Validation failures never reach the network.

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::identity::{Identity, IdentityError};
use crate::models::NewBookmark;
use crate::store::{BookmarkStore, StoreError};
use crate::validate::{validate, Draft, ValidationError};

/// Errors from submitting a new bookmark
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The input failed validation; edit it and resubmit
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No user is signed in; nothing was written
    #[error("Not signed in")]
    NotAuthenticated,

    /// The identity service failed
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The store rejected the insert; resubmitting may succeed
    #[error("Could not save the bookmark: {0}")]
    Store(#[from] StoreError),
}

/// Submits new bookmarks for the signed-in user
///
/// Holds its collaborators explicitly; nothing here is ambient state.
pub struct Composer<S, I> {
    store: S,
    identity: I,
    saving: bool,
}

impl<S: BookmarkStore, I: Identity> Composer<S, I> {
    pub fn new(store: S, identity: I) -> Self {
        Self {
            store,
            identity,
            saving: false,
        }
    }

    /// Whether an insert is currently in flight
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Validate and submit one new bookmark; returns the assigned id
    ///
    /// Inputs are trimmed before validation. A validation failure makes no
    /// network call and does not count as saving. The saving flag clears on
    /// every outcome.
    pub async fn submit(&mut self, title: &str, url: &str) -> Result<Uuid, SubmitError> {
        let draft = validate(title, url)?;

        self.saving = true;
        let result = self.insert_draft(draft).await;
        self.saving = false;

        match &result {
            Ok(id) => debug!(%id, "bookmark saved"),
            Err(e) => warn!(error = %e, "bookmark submit failed"),
        }
        result
    }

    async fn insert_draft(&self, draft: Draft) -> Result<Uuid, SubmitError> {
        let user = self
            .identity
            .current_user()
            .await?
            .ok_or(SubmitError::NotAuthenticated)?;

        let id = self
            .store
            .insert(NewBookmark {
                title: draft.title,
                url: draft.url,
                owner_id: user.id,
            })
            .await?;
        Ok(id)
    }
}
