//! Client-side query cache for server-fetched collections and records.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Keys entries by (resource, parameters) with deterministic hashing
//! - De-duplicates concurrent fetches (at most one in flight per key)
//! - Serves stale entries while revalidating in the background
//! - Marks dependent entries stale when a mutation lands (invalidation)
//! - Supports cursor-based infinite pagination per collection key

mod entry;
mod invalidation;
mod key;
mod paged;
mod query;
mod store;

pub use entry::{CacheEntry, QueryStatus};
pub use invalidation::KeyMatcher;
pub use key::{QueryKey, DEFAULT_FRESHNESS};
pub use paged::{Page, PagedQuery};
pub use query::{Query, QueryState};
pub use store::{QueryCache, WatchGuard};
