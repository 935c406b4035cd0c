//! Smart Bookmark Core Library
//!
//! This crate provides the client-side synchronization core for Smart
//! Bookmark: authenticated users create, list, paginate, and delete URL
//! bookmarks scoped to their account, with live updates whenever the
//! underlying data changes.
//!
//! # Architecture
//!
//! Persistence, authentication, and change notification live in an external
//! backend; this crate wraps them behind two traits ([`Identity`] and
//! [`BookmarkStore`]) and builds the stateful pieces on top:
//!
//! - [`ListSync`]: paginated view over one owner's bookmarks that re-fetches
//!   itself on every remote change (the store is the source of truth)
//! - [`Composer`]: validate-then-insert flow for new bookmarks
//!
//! # Quick Start
//!
//! ```text
//! let store = MemoryStore::new().for_user(user.id);
//! let identity = MemoryIdentity::signed_in(user);
//!
//! let mut list = ListSync::new(store);
//! list.activate(&identity).await?;
//!
//! while list.poll_change().await {
//!     render(list.items());
//! }
//! ```
//!
//! # Modules
//!
//! - `list`: list synchronization engine (main entry point)
//! - `compose`: bookmark creation flow
//! - `store`: bookmark store gateway and in-memory backend
//! - `identity`: identity session access
//! - `validate`: title/URL validation
//! - `models`: data structures for users and bookmarks
//! - `config`: application configuration

pub mod compose;
pub mod config;
pub mod identity;
pub mod list;
pub mod models;
pub mod store;
pub mod validate;

pub use compose::{Composer, SubmitError};
pub use config::Config;
pub use identity::{Identity, IdentityError, MemoryIdentity, OAuthProvider};
pub use list::{ListSync, Phase, DEFAULT_PAGE_SIZE};
pub use models::{Bookmark, NewBookmark, User};
pub use store::{
    BookmarkStore, ChangeEvent, ChangeKind, MemoryStore, Page, StoreError, Subscription,
};
pub use validate::{validate, Draft, ValidationError};
