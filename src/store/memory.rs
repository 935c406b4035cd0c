//! In-memory bookmark store
//!
//! A reference [`BookmarkStore`] backend holding rows in process. It enforces
//! the same contracts the real backend does: rows are visible only to their
//! owner, listings are ordered newest first, the access policy silently skips
//! deletes of rows the acting user does not own, and change events fan out
//! only to subscribers of the affected owner.
//!
//! Handles are cheap clones over shared state; [`for_user`]
//! (MemoryStore::for_user) derives a handle acting as a given user, the way a
//! backend client carries its auth session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::{BookmarkStore, ChangeEvent, ChangeKind, Page, StoreError, StoreResult, Subscription};
use crate::models::{Bookmark, NewBookmark};

/// A stored row plus its insertion sequence number
///
/// The sequence breaks `created_at` ties deterministically: later inserts
/// sort first among equal timestamps.
#[derive(Debug, Clone)]
struct Stored {
    row: Bookmark,
    seq: u64,
}

struct Subscriber {
    id: u64,
    owner: Uuid,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

struct Shared {
    rows: Mutex<Vec<Stored>>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_seq: AtomicU64,
    next_subscriber: AtomicU64,
}

/// In-memory row store with owner-scoped access
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    acting_user: Option<Uuid>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    /// Create an empty store with no acting user
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                rows: Mutex::new(Vec::new()),
                subscribers: Mutex::new(Vec::new()),
                next_seq: AtomicU64::new(0),
                next_subscriber: AtomicU64::new(0),
            }),
            acting_user: None,
        }
    }

    /// Derive a handle over the same rows, acting as `user`
    pub fn for_user(&self, user: Uuid) -> Self {
        Self {
            shared: self.shared.clone(),
            acting_user: Some(user),
        }
    }

    /// Number of currently registered change-feed subscribers
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }

    /// Total number of rows across all owners
    pub fn row_count(&self) -> usize {
        lock(&self.shared.rows).len()
    }

    fn notify(&self, event: ChangeEvent) {
        let mut subscribers = lock(&self.shared.subscribers);
        // Sending to a dropped receiver fails; prune those entries as we go.
        subscribers.retain(|sub| {
            if sub.owner != event.owner_id {
                return true;
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn insert(&self, row: NewBookmark) -> StoreResult<Uuid> {
        if self.acting_user != Some(row.owner_id) {
            return Err(StoreError::AccessDenied);
        }

        let bookmark = Bookmark {
            id: Uuid::new_v4(),
            title: row.title,
            url: row.url,
            owner_id: row.owner_id,
            created_at: Utc::now(),
        };
        let id = bookmark.id;
        let seq = self.shared.next_seq.fetch_add(1, Ordering::SeqCst);

        lock(&self.shared.rows).push(Stored { row: bookmark, seq });
        debug!(%id, owner = %row.owner_id, "inserted bookmark");

        self.notify(ChangeEvent {
            kind: ChangeKind::Insert,
            bookmark_id: id,
            owner_id: row.owner_id,
        });
        Ok(id)
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
        let Some(acting) = self.acting_user else {
            return Err(StoreError::AccessDenied);
        };

        let removed = {
            let mut rows = lock(&self.shared.rows);
            let before = rows.len();
            // The row policy scopes the delete to the acting user's rows;
            // ids outside that scope match nothing.
            rows.retain(|stored| !(stored.row.id == id && stored.row.owner_id == acting));
            before != rows.len()
        };

        if removed {
            debug!(%id, owner = %acting, "deleted bookmark");
            self.notify(ChangeEvent {
                kind: ChangeKind::Delete,
                bookmark_id: id,
                owner_id: acting,
            });
        }
        Ok(())
    }

    async fn read_page(&self, owner: Uuid, offset: u64, limit: u64) -> StoreResult<Page> {
        if self.acting_user != Some(owner) {
            // The policy hides other owners' rows entirely.
            return Ok(Page {
                rows: Vec::new(),
                total_count: 0,
            });
        }

        let mut owned: Vec<Stored> = lock(&self.shared.rows)
            .iter()
            .filter(|stored| stored.row.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.row
                .created_at
                .cmp(&a.row.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total_count = owned.len() as u64;
        let rows = owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|stored| stored.row)
            .collect();

        Ok(Page { rows, total_count })
    }

    async fn subscribe_changes(&self, owner: Uuid) -> StoreResult<Subscription> {
        if self.acting_user != Some(owner) {
            return Err(StoreError::AccessDenied);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::SeqCst);
        lock(&self.shared.subscribers).push(Subscriber { id, owner, tx });
        debug!(subscriber = id, %owner, "opened change feed");

        let shared = self.shared.clone();
        Ok(Subscription::new(rx, move || {
            lock(&shared.subscribers).retain(|sub| sub.id != id);
            debug!(subscriber = id, "released change feed");
        }))
    }
}
