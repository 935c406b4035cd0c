//! List view state primitives
//!
//! Pagination math and the fetch-ordering ticket used by the engine.

/// Default number of bookmarks per page
pub const DEFAULT_PAGE_SIZE: u32 = 6;

/// Lifecycle phase of a list engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created; owner not yet requested
    Uninitialized,
    /// Waiting on the identity service
    ResolvingOwner,
    /// Owner resolved, no fetch in flight
    Idle,
    /// A page read is in flight
    Fetching,
    /// Terminal; the subscription has been released
    TornDown,
}

/// Zero-based row window for a 1-indexed page: `(offset, limit)`
pub fn page_range(page: u32, page_size: u32) -> (u64, u64) {
    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    (offset, u64::from(page_size))
}

/// Total number of pages for `total_count` rows: `ceil(count / page_size)`
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size)) as u32
}

/// Identity of one issued fetch
///
/// Tickets are handed out in a strictly increasing sequence; a completion
/// carrying a ticket older than the latest issued one is stale and must not
/// touch engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchTicket {
    pub(crate) seq: u64,
    pub(crate) page: u32,
}
