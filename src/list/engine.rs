//! List synchronization engine
//!
//! Owns the visible page of a user's bookmarks and keeps it consistent with
//! the store: paginated reads keyed on a 1-indexed page number, plus a live
//! change-feed subscription that triggers a full re-fetch of the current page
//! on any remote change. The engine trusts the store as the source of truth;
//! it never patches rows locally.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{page_range, total_pages, FetchTicket, Phase, DEFAULT_PAGE_SIZE};
use crate::identity::{Identity, IdentityError};
use crate::models::Bookmark;
use crate::store::{BookmarkStore, Page, StoreResult, Subscription};

/// Synchronized, paginated view over one owner's bookmarks
///
/// Construct with [`new`](ListSync::new), then [`activate`](ListSync::activate)
/// once the surrounding view is shown. Drive refreshes either explicitly
/// ([`change_page`](ListSync::change_page), [`refresh`](ListSync::refresh)) or
/// by awaiting [`poll_change`](ListSync::poll_change) in a loop. Call
/// [`teardown`](ListSync::teardown) when the view goes away; dropping the
/// engine releases the subscription as well.
pub struct ListSync<S> {
    store: S,
    page_size: u32,
    phase: Phase,
    owner: Option<Uuid>,
    current_page: u32,
    items: Vec<Bookmark>,
    total_count: u64,
    loading: bool,
    fetch_seq: u64,
    subscription: Option<Subscription>,
}

impl<S: BookmarkStore> ListSync<S> {
    /// Create an engine over `store` with the default page size
    pub fn new(store: S) -> Self {
        Self::with_page_size(store, DEFAULT_PAGE_SIZE)
    }

    /// Create an engine with a specific page size
    pub fn with_page_size(store: S, page_size: u32) -> Self {
        Self {
            store,
            page_size,
            phase: Phase::Uninitialized,
            owner: None,
            current_page: 1,
            items: Vec::new(),
            total_count: 0,
            loading: true,
            fetch_seq: 0,
            subscription: None,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Resolved owner, if any
    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    /// 1-indexed page currently shown
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Rows of the current page, newest first
    pub fn items(&self) -> &[Bookmark] {
        &self.items
    }

    /// Exact total row count for the owner
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Whether a fetch is in flight (or the owner is still unresolved)
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// `ceil(total_count / page_size)`
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    /// Whether a page selector is worth showing
    pub fn has_multiple_pages(&self) -> bool {
        self.total_pages() > 1
    }

    /// Whether the engine has an owner and is not torn down
    pub fn is_active(&self) -> bool {
        self.owner.is_some() && self.phase != Phase::TornDown
    }

    /// Resolve the acting user and bring the engine live
    ///
    /// Returns `Ok(true)` once a user is resolved: exactly one change-feed
    /// subscription is open for them and the first page has been requested.
    /// Returns `Ok(false)` when no user is signed in; the engine then stays
    /// inactive and performs no reads. Calling this again under a different
    /// user releases the old subscription and starts over on page 1.
    pub async fn activate(&mut self, identity: &dyn Identity) -> Result<bool, IdentityError> {
        if self.phase == Phase::TornDown {
            return Ok(false);
        }

        self.phase = Phase::ResolvingOwner;
        let user = match identity.current_user().await {
            Ok(user) => user,
            Err(e) => {
                self.phase = Phase::Uninitialized;
                return Err(e);
            }
        };

        let Some(user) = user else {
            debug!("no signed-in user; list stays inactive");
            self.phase = Phase::Uninitialized;
            return Ok(false);
        };

        if self.owner == Some(user.id) && self.subscription.is_some() {
            // Already live for this owner.
            self.phase = Phase::Idle;
            return Ok(true);
        }

        // Owner resolved (or changed): swap the subscription and start over.
        self.subscription = None;
        self.owner = Some(user.id);
        self.current_page = 1;
        info!(owner = %user.id, "list engine activated");

        match self.store.subscribe_changes(user.id).await {
            Ok(sub) => self.subscription = Some(sub),
            // A missing feed only stops live refresh; reads still work.
            Err(e) => warn!(owner = %user.id, error = %e, "change feed unavailable"),
        }

        self.phase = Phase::Idle;
        if let Err(e) = self.fetch_page(1).await {
            warn!(error = %e, "initial page fetch failed");
        }
        Ok(true)
    }

    /// Fetch page `page` and apply rows and count atomically
    ///
    /// On failure the previous items and count are retained. Stale
    /// completions (a newer fetch was issued meanwhile) are discarded.
    pub async fn fetch_page(&mut self, page: u32) -> StoreResult<()> {
        let Some(owner) = self.owner else {
            return Ok(());
        };
        if self.phase == Phase::TornDown {
            return Ok(());
        }

        let ticket = self.begin_fetch(page);
        let (offset, limit) = page_range(page, self.page_size);
        debug!(page, offset, limit, "fetching page");

        let result = self.store.read_page(owner, offset, limit).await;
        self.apply(ticket, result)
    }

    /// Move to page `page` if it is within `[1, total_pages]`
    ///
    /// Out-of-range requests are no-ops: `current_page` and `items` stay
    /// unchanged.
    pub async fn change_page(&mut self, page: u32) -> StoreResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        if page < 1 || page > self.total_pages() {
            debug!(page, total_pages = self.total_pages(), "page out of range");
            return Ok(());
        }

        self.current_page = page;
        self.fetch_page(page).await
    }

    /// Re-fetch the current page
    pub async fn refresh(&mut self) -> StoreResult<()> {
        let page = self.current_page;
        self.fetch_page(page).await
    }

    /// Wait for one remote change and re-fetch the current page
    ///
    /// Every event triggers exactly one fetch, regardless of its kind. A
    /// failed refresh keeps the previous page state. Returns `false` once the
    /// feed has closed or the engine is torn down; the list then silently
    /// stops refreshing.
    pub async fn poll_change(&mut self) -> bool {
        if self.phase == Phase::TornDown {
            return false;
        }
        let event = match self.subscription.as_mut() {
            Some(sub) => sub.recv().await,
            None => return false,
        };

        let Some(event) = event else {
            debug!("change feed closed");
            self.subscription = None;
            return false;
        };

        debug!(kind = ?event.kind, bookmark = %event.bookmark_id, "remote change");
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after remote change failed");
        }
        true
    }

    /// Delete a bookmark and re-fetch the current page
    ///
    /// The store's access policy scopes the delete to the owner's rows. The
    /// change feed also fires for the delete; that refresh and this one land
    /// on the same page state.
    pub async fn delete(&mut self, id: Uuid) -> StoreResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        self.store.delete_by_id(id).await?;
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after delete failed");
        }
        Ok(())
    }

    /// Tear the engine down, releasing its subscription
    ///
    /// Terminal: no further fetches happen, even if change events were
    /// already queued.
    pub fn teardown(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }
        info!("list engine torn down");
        self.subscription = None;
        self.loading = false;
        self.phase = Phase::TornDown;
    }

    /// Issue a fetch ticket, superseding any fetch still in flight
    fn begin_fetch(&mut self, page: u32) -> FetchTicket {
        self.fetch_seq += 1;
        self.loading = true;
        self.phase = Phase::Fetching;
        FetchTicket {
            seq: self.fetch_seq,
            page,
        }
    }

    /// Apply a fetch completion, unless a newer fetch was issued meanwhile
    fn apply(&mut self, ticket: FetchTicket, result: StoreResult<Page>) -> StoreResult<()> {
        if self.phase == Phase::TornDown {
            return Ok(());
        }
        if ticket.seq != self.fetch_seq {
            debug!(page = ticket.page, "discarding stale fetch result");
            return Ok(());
        }

        self.loading = false;
        self.phase = Phase::Idle;
        match result {
            Ok(page) => {
                // Rows and count always land together.
                self.items = page.rows;
                self.total_count = page.total_count;
                Ok(())
            }
            Err(e) => {
                warn!(page = ticket.page, error = %e, "page fetch failed; keeping previous state");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::identity::MemoryIdentity;
    use crate::models::{NewBookmark, User};
    use crate::store::{MemoryStore, StoreError};

    /// Store wrapper that counts page reads
    struct CountingStore {
        inner: MemoryStore,
        reads: Arc<AtomicU64>,
    }

    #[async_trait]
    impl BookmarkStore for CountingStore {
        async fn insert(&self, row: NewBookmark) -> StoreResult<Uuid> {
            self.inner.insert(row).await
        }

        async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
            self.inner.delete_by_id(id).await
        }

        async fn read_page(&self, owner: Uuid, offset: u64, limit: u64) -> StoreResult<Page> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_page(owner, offset, limit).await
        }

        async fn subscribe_changes(&self, owner: Uuid) -> StoreResult<Subscription> {
            self.inner.subscribe_changes(owner).await
        }
    }

    /// Store wrapper whose reads fail on demand
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: Arc<AtomicBool>,
    }

    #[async_trait]
    impl BookmarkStore for FlakyStore {
        async fn insert(&self, row: NewBookmark) -> StoreResult<Uuid> {
            self.inner.insert(row).await
        }

        async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
            self.inner.delete_by_id(id).await
        }

        async fn read_page(&self, owner: Uuid, offset: u64, limit: u64) -> StoreResult<Page> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Connection("store unreachable".to_string()));
            }
            self.inner.read_page(owner, offset, limit).await
        }

        async fn subscribe_changes(&self, owner: Uuid) -> StoreResult<Subscription> {
            self.inner.subscribe_changes(owner).await
        }
    }

    async fn seed(store: &MemoryStore, owner: Uuid, count: usize) {
        let handle = store.for_user(owner);
        for i in 0..count {
            handle
                .insert(NewBookmark {
                    title: format!("bookmark {i}"),
                    url: format!("https://example.com/{i}"),
                    owner_id: owner,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_activate_without_user_stays_inactive() {
        let backing = MemoryStore::new();
        let reads = Arc::new(AtomicU64::new(0));
        let store = CountingStore {
            inner: backing.clone(),
            reads: reads.clone(),
        };
        let mut engine = ListSync::new(store);

        let active = engine.activate(&MemoryIdentity::anonymous()).await.unwrap();
        assert!(!active);
        assert!(!engine.is_active());
        assert_eq!(engine.phase(), Phase::Uninitialized);

        // No reads, no subscription
        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert_eq!(backing.subscriber_count(), 0);
        assert!(engine.items().is_empty());
    }

    #[tokio::test]
    async fn test_activate_fetches_first_page_and_subscribes() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();
        seed(&backing, user.id, 3).await;

        let mut engine = ListSync::new(backing.for_user(user.id));
        let active = engine
            .activate(&MemoryIdentity::signed_in(user.clone()))
            .await
            .unwrap();

        assert!(active);
        assert_eq!(engine.owner(), Some(user.id));
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(!engine.loading());
        assert_eq!(engine.items().len(), 3);
        assert_eq!(engine.total_count(), 3);
        assert_eq!(backing.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_pagination_windows_and_clamping() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();
        seed(&backing, user.id, 13).await;

        let mut engine = ListSync::new(backing.for_user(user.id));
        engine
            .activate(&MemoryIdentity::signed_in(user.clone()))
            .await
            .unwrap();

        assert_eq!(engine.total_pages(), 3);
        assert_eq!(engine.current_page(), 1);
        assert_eq!(engine.items().len(), 6);
        assert!(engine.has_multiple_pages());

        engine.change_page(3).await.unwrap();
        assert_eq!(engine.current_page(), 3);
        assert_eq!(engine.items().len(), 1);

        // Past the last page: no-op
        let before: Vec<_> = engine.items().to_vec();
        engine.change_page(4).await.unwrap();
        assert_eq!(engine.current_page(), 3);
        assert_eq!(engine.items(), before.as_slice());

        // Below page 1: no-op
        engine.change_page(0).await.unwrap();
        assert_eq!(engine.current_page(), 3);
    }

    #[tokio::test]
    async fn test_change_event_triggers_exactly_one_fetch() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();
        seed(&backing, user.id, 2).await;

        let reads = Arc::new(AtomicU64::new(0));
        let store = CountingStore {
            inner: backing.for_user(user.id),
            reads: reads.clone(),
        };
        let mut engine = ListSync::new(store);
        engine
            .activate(&MemoryIdentity::signed_in(user.clone()))
            .await
            .unwrap();
        let reads_after_activate = reads.load(Ordering::SeqCst);

        // A remote insert fires one feed event
        backing
            .for_user(user.id)
            .insert(NewBookmark {
                title: "remote insert".to_string(),
                url: "https://example.com/new".to_string(),
                owner_id: user.id,
            })
            .await
            .unwrap();

        assert!(engine.poll_change().await);
        assert_eq!(reads.load(Ordering::SeqCst), reads_after_activate + 1);

        // Rows and count updated together
        assert_eq!(engine.items().len(), 3);
        assert_eq!(engine.total_count(), 3);
        assert_eq!(engine.items()[0].title, "remote insert");
    }

    #[tokio::test]
    async fn test_teardown_releases_subscription_and_stops_fetches() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();
        seed(&backing, user.id, 1).await;

        let reads = Arc::new(AtomicU64::new(0));
        let store = CountingStore {
            inner: backing.for_user(user.id),
            reads: reads.clone(),
        };
        let mut engine = ListSync::new(store);
        engine
            .activate(&MemoryIdentity::signed_in(user.clone()))
            .await
            .unwrap();
        assert_eq!(backing.subscriber_count(), 1);

        engine.teardown();
        assert_eq!(engine.phase(), Phase::TornDown);
        assert_eq!(backing.subscriber_count(), 0);

        // An event arriving right after teardown causes no fetch
        let reads_after_teardown = reads.load(Ordering::SeqCst);
        backing
            .for_user(user.id)
            .insert(NewBookmark {
                title: "after teardown".to_string(),
                url: "https://example.com/late".to_string(),
                owner_id: user.id,
            })
            .await
            .unwrap();

        assert!(!engine.poll_change().await);
        engine.refresh().await.unwrap();
        engine.change_page(1).await.unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), reads_after_teardown);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();

        {
            let mut engine = ListSync::new(backing.for_user(user.id));
            engine
                .activate(&MemoryIdentity::signed_in(user.clone()))
                .await
                .unwrap();
            assert_eq!(backing.subscriber_count(), 1);
        }

        assert_eq!(backing.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_retains_previous_state() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();
        seed(&backing, user.id, 4).await;

        let fail_reads = Arc::new(AtomicBool::new(false));
        let store = FlakyStore {
            inner: backing.for_user(user.id),
            fail_reads: fail_reads.clone(),
        };
        let mut engine = ListSync::new(store);
        engine
            .activate(&MemoryIdentity::signed_in(user.clone()))
            .await
            .unwrap();
        assert_eq!(engine.items().len(), 4);

        fail_reads.store(true, Ordering::SeqCst);
        let result = engine.refresh().await;
        assert!(result.is_err());

        // Stale but consistent: previous rows and count survive
        assert_eq!(engine.items().len(), 4);
        assert_eq!(engine.total_count(), 4);
        assert!(!engine.loading());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_stale_fetch_result_is_discarded() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();
        seed(&backing, user.id, 13).await;

        let store = backing.for_user(user.id);
        let mut engine = ListSync::new(backing.for_user(user.id));
        engine
            .activate(&MemoryIdentity::signed_in(user.clone()))
            .await
            .unwrap();

        // Two overlapping fetch intents: page 2 issued, then superseded by
        // page 3. The page 2 response arrives last.
        let old_ticket = engine.begin_fetch(2);
        let old_result = store.read_page(user.id, 6, 6).await;

        let new_ticket = engine.begin_fetch(3);
        let new_result = store.read_page(user.id, 12, 6).await;

        engine.current_page = 3;
        engine.apply(new_ticket, new_result).unwrap();
        assert_eq!(engine.items().len(), 1);

        // Late completion of the superseded fetch changes nothing
        engine.apply(old_ticket, old_result).unwrap();
        assert_eq!(engine.items().len(), 1);
        assert_eq!(engine.current_page(), 3);
        assert!(!engine.loading());
    }

    #[tokio::test]
    async fn test_owner_change_resubscribes() {
        let alice = User::new("alice@example.com");
        let bob = User::new("bob@example.com");
        let backing = MemoryStore::new();
        seed(&backing, alice.id, 2).await;
        seed(&backing, bob.id, 5).await;

        // A handle that follows whoever is signed in
        #[derive(Clone)]
        struct SessionStore {
            backing: MemoryStore,
        }

        #[async_trait]
        impl BookmarkStore for SessionStore {
            async fn insert(&self, row: NewBookmark) -> StoreResult<Uuid> {
                self.backing.for_user(row.owner_id).insert(row).await
            }
            async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
                self.backing.delete_by_id(id).await
            }
            async fn read_page(&self, owner: Uuid, offset: u64, limit: u64) -> StoreResult<Page> {
                self.backing.for_user(owner).read_page(owner, offset, limit).await
            }
            async fn subscribe_changes(&self, owner: Uuid) -> StoreResult<Subscription> {
                self.backing.for_user(owner).subscribe_changes(owner).await
            }
        }

        let mut engine = ListSync::new(SessionStore {
            backing: backing.clone(),
        });

        engine
            .activate(&MemoryIdentity::signed_in(alice.clone()))
            .await
            .unwrap();
        assert_eq!(engine.owner(), Some(alice.id));
        assert_eq!(engine.total_count(), 2);
        assert_eq!(backing.subscriber_count(), 1);

        engine.change_page(1).await.unwrap();

        // A different user signs in: old subscription released, fresh start
        engine
            .activate(&MemoryIdentity::signed_in(bob.clone()))
            .await
            .unwrap();
        assert_eq!(engine.owner(), Some(bob.id));
        assert_eq!(engine.current_page(), 1);
        assert_eq!(engine.total_count(), 5);
        assert_eq!(backing.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_refreshes_current_page() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();
        seed(&backing, user.id, 3).await;

        let mut engine = ListSync::new(backing.for_user(user.id));
        engine
            .activate(&MemoryIdentity::signed_in(user.clone()))
            .await
            .unwrap();
        let victim = engine.items()[0].id;

        engine.delete(victim).await.unwrap();
        assert_eq!(engine.items().len(), 2);
        assert_eq!(engine.total_count(), 2);
        assert!(engine.items().iter().all(|b| b.id != victim));
    }

    #[tokio::test]
    async fn test_delete_of_foreign_row_leaves_list_unchanged() {
        let alice = User::new("alice@example.com");
        let bob = Uuid::new_v4();
        let backing = MemoryStore::new();
        seed(&backing, alice.id, 2).await;

        let bobs_id = backing
            .for_user(bob)
            .insert(NewBookmark {
                title: "Bob's row".to_string(),
                url: "https://example.com/bob".to_string(),
                owner_id: bob,
            })
            .await
            .unwrap();

        let mut engine = ListSync::new(backing.for_user(alice.id));
        engine
            .activate(&MemoryIdentity::signed_in(alice.clone()))
            .await
            .unwrap();

        // The access policy matches nothing; after refresh the list is as before
        engine.delete(bobs_id).await.unwrap();
        assert_eq!(engine.items().len(), 2);
        assert_eq!(engine.total_count(), 2);
        assert_eq!(backing.for_user(bob).read_page(bob, 0, 10).await.unwrap().total_count, 1);
    }

    #[tokio::test]
    async fn test_reactivate_same_owner_keeps_subscription() {
        let user = User::new("owner@example.com");
        let backing = MemoryStore::new();

        let mut engine = ListSync::new(backing.for_user(user.id));
        let identity = MemoryIdentity::signed_in(user.clone());

        engine.activate(&identity).await.unwrap();
        assert_eq!(backing.subscriber_count(), 1);

        engine.activate(&identity).await.unwrap();
        assert_eq!(backing.subscriber_count(), 1);
    }
}
