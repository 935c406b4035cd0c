//! Bookmark list synchronization
//!
//! The stateful core of the crate: a paginated view over one owner's
//! bookmarks that re-fetches itself whenever the store reports a change.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized -> ResolvingOwner -> Idle <-> Fetching -> TornDown
//! ```
//!
//! Once the owner is resolved a change-feed subscription stays open through
//! `Idle` and `Fetching`; teardown (or drop) releases it on every path.
//!
//! ## Usage
//!
//! ```ignore
//! let mut list = ListSync::new(store);
//! if list.activate(&identity).await? {
//!     while list.poll_change().await {
//!         render(list.items());
//!     }
//! }
//! ```

mod engine;
mod state;

pub use engine::ListSync;
pub use state::{page_range, total_pages, Phase, DEFAULT_PAGE_SIZE};
