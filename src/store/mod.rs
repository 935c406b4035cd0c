//! Bookmark store gateway
//!
//! Wraps the opaque row store behind the [`BookmarkStore`] trait: insert,
//! delete-by-id, paginated read-with-count, and a change-notification feed.
//! Owner scoping is enforced by the store's access policy, never re-checked
//! by the client.
//!
//! ## Change feed
//!
//! [`subscribe_changes`](BookmarkStore::subscribe_changes) returns a
//! [`Subscription`]: a stream of row-level [`ChangeEvent`]s filtered
//! store-side to one owner, paired with a release guard that runs when the
//! subscription is dropped or explicitly closed. Holders must not outlive the
//! view they feed; dropping the subscription is the unsubscribe.

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::{Bookmark, NewBookmark};

/// One page of rows plus the exact total row count for the owner
///
/// Both values come from the same read, so a consumer can apply them
/// atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<Bookmark>,
    pub total_count: u64,
}

/// Kind of a row-level change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-level change delivered on the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub bookmark_id: Uuid,
    pub owner_id: Uuid,
}

/// A live change-notification subscription for one owner
///
/// Events arrive via [`recv`](Subscription::recv). The store-side
/// registration is released when the subscription is dropped;
/// [`close`](Subscription::close) does the same explicitly.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Build a subscription from an event receiver and a release action
    ///
    /// `release` runs exactly once, on drop or close.
    pub fn new(
        events: mpsc::UnboundedReceiver<ChangeEvent>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            release: Some(Box::new(release)),
        }
    }

    /// Wait for the next change event
    ///
    /// Returns `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Release the subscription explicitly
    pub fn close(self) {
        // Drop runs the release action.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Access to the opaque row store, scoped to the acting user's session
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Insert a new row; the store assigns `id` and `created_at`
    async fn insert(&self, row: NewBookmark) -> StoreResult<Uuid>;

    /// Delete the row with the given id
    ///
    /// The store's access policy restricts the delete to rows the acting
    /// user owns; ids outside that scope delete nothing.
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()>;

    /// Read one page of `owner`'s rows, newest first, plus the exact total
    ///
    /// `offset` is zero-based; at most `limit` rows are returned.
    async fn read_page(&self, owner: Uuid, offset: u64, limit: u64) -> StoreResult<Page>;

    /// Open a change-notification feed for `owner`'s rows
    ///
    /// Events of every kind (insert, update, delete) are delivered, filtered
    /// store-side to the given owner.
    async fn subscribe_changes(&self, owner: Uuid) -> StoreResult<Subscription>;
}
