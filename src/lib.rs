//! Client-side data layer for the paper feed API.
//!
//! The crate is organized as three layers:
//!
//! - [`transport`]: one HTTP exchange — credential attachment, query
//!   serialization, 204 handling, and error classification into a single
//!   typed [`ApiError`]
//! - [`cache`]: a keyed query cache with request de-duplication,
//!   stale-while-revalidate serving, cursor pagination, and
//!   mutation-driven invalidation
//! - [`feed`]: the domain — typed operations for papers, bookmarks,
//!   categories, and the user, wired through the cache by
//!   [`CachedFeedClient`]
//!
//! # Example
//!
//! ```ignore
//! let config = Config::new("https://api.example.com/v1");
//! let client = CachedFeedClient::new(&config, Arc::new(EnvToken::new()))?;
//!
//! let papers = client.papers(PaperFilters::default());
//! papers.fetch_next_page().await?;          // first page
//! papers.fetch_next_page().await?;          // second page
//! let all = papers.items();                 // P1 ++ P2, server order
//!
//! client.add_bookmark(&all[0].arxiv_id).await?;
//! // papers, bookmarks and the paper's detail entry are now stale and
//! // refetch on next access.
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod transport;

pub use auth::{Anonymous, CredentialProvider, EnvToken, StaticToken};
pub use cache::{
  CacheEntry, KeyMatcher, Page, PagedQuery, Query, QueryCache, QueryKey, QueryState, QueryStatus,
  WatchGuard,
};
pub use config::Config;
pub use error::{ApiError, ConfigError};
pub use feed::{CachedFeedClient, FeedClient, FeedQueryKey, MutationKind, PaperFilters};
pub use transport::{NoContent, Transport};
