//! Cache-backed query handle for data fetching.
//!
//! Inspired by TanStack Query, `Query<T>` ties one cache key to its
//! fetcher and exposes the loading / success / error states a renderer
//! needs, while the shared [`QueryCache`](super::QueryCache) provides
//! de-duplication, staleness, and invalidation across handles.
//!
//! # Example
//!
//! ```ignore
//! let query = client.paper_detail("2401.00001");
//!
//! // Await the value (served from cache when fresh)
//! let detail = query.ensure().await?;
//!
//! // Or render from the snapshot
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(detail) => render_detail(detail),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use super::key::QueryKey;
use super::store::{QueryCache, WatchGuard};
use crate::error::ApiError;

/// The renderable state of a query.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// First fetch in flight, nothing to render yet
  Loading,
  /// Query holds data
  Success(T),
  /// Query failed with no data to keep serving
  Error(ApiError),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A fetcher that produces the value for one cache key.
type FetcherFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Handle binding one cache key to its fetcher.
///
/// Holding the handle registers an active reader: invalidations of the
/// key refetch immediately rather than deferring to the next access.
/// Queries for the same key share one cache entry, so two handles never
/// issue duplicate fetches.
pub struct Query<T> {
  cache: QueryCache,
  key: Arc<dyn QueryKey>,
  fetcher: FetcherFn<T>,
  _watch: WatchGuard,
}

impl<T> Query<T>
where
  T: Serialize + DeserializeOwned + Send + 'static,
{
  pub fn new<K, F, Fut>(cache: QueryCache, key: K, fetcher: F) -> Self
  where
    K: QueryKey + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let watch = cache.watch(&key);
    let fetcher: FetcherFn<T> = Arc::new(move || Box::pin(fetcher()));
    Self {
      cache,
      key: Arc::new(key),
      fetcher,
      _watch: watch,
    }
  }

  /// Await the value: served from cache when fresh, stale-while-
  /// revalidate when expired, fetched when absent.
  pub async fn ensure(&self) -> Result<T, ApiError> {
    let fetcher = self.fetcher.clone();
    self.cache.fetch(&*self.key, move || fetcher()).await
  }

  /// Force a refetch, bypassing freshness. Joins an in-flight fetch when
  /// one exists rather than starting a second.
  pub async fn refetch(&self) -> Result<T, ApiError> {
    let fetcher = self.fetcher.clone();
    self.cache.refetch(&*self.key, move || fetcher()).await
  }

  /// Get the current renderable state of the query.
  pub fn state(&self) -> QueryState<T> {
    self.cache.state(&*self.key)
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<T> {
    match self.state() {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  /// Check if the query is currently loading.
  pub fn is_loading(&self) -> bool {
    self.state().is_loading()
  }

  /// Check if the query failed.
  pub fn is_error(&self) -> bool {
    self.state().is_error()
  }

  /// Check if the cached value has been invalidated or outlived its
  /// freshness window.
  pub fn is_stale(&self) -> bool {
    self
      .cache
      .read(&*self.key)
      .map(|entry| !entry.is_fresh(self.key.freshness()) && entry.value.is_some())
      .unwrap_or(false)
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key.description())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  #[derive(Clone)]
  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn resource(&self) -> &str {
      "widgets"
    }

    fn canonical(&self) -> String {
      format!("widgets:{}", self.0)
    }
  }

  #[tokio::test]
  async fn ensure_transitions_idle_to_success() {
    let cache = QueryCache::new();
    let query = Query::new(cache, TestKey("a"), || async {
      Ok::<_, ApiError>(vec![1, 2, 3])
    });

    assert!(matches!(query.state(), QueryState::Idle));

    let data = query.ensure().await.expect("fetch");
    assert_eq!(data, vec![1, 2, 3]);
    assert!(query.state().is_success());
    assert_eq!(query.data(), Some(vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn errors_are_renderable() {
    let cache = QueryCache::with_retry_limit(0);
    let query: Query<i32> = Query::new(cache, TestKey("a"), || async {
      Err(ApiError::new(404, "NOT_FOUND", "gone"))
    });

    let err = query.ensure().await.expect_err("must fail");
    assert_eq!(err.code, "NOT_FOUND");
    assert!(query.is_error());
    assert_eq!(query.state().error().map(|e| e.status), Some(404));
  }

  #[tokio::test]
  async fn two_handles_for_one_key_share_the_entry() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    let make_query = |cache: QueryCache| {
      let calls = calls.clone();
      Query::new(cache, TestKey("a"), move || {
        let calls = calls.clone();
        async move { Ok::<_, ApiError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
      })
    };

    let first = make_query(cache.clone());
    let second = make_query(cache.clone());

    assert_eq!(first.ensure().await.expect("first"), 1);
    assert_eq!(second.ensure().await.expect("second"), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn refetch_bypasses_freshness() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let query = Query::new(cache, TestKey("a"), {
      let calls = calls.clone();
      move || {
        let calls = calls.clone();
        async move { Ok::<_, ApiError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
      }
    });

    assert_eq!(query.ensure().await.expect("first"), 1);
    assert_eq!(query.ensure().await.expect("cached"), 1);
    assert_eq!(query.refetch().await.expect("forced"), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn stale_handles_report_staleness() {
    let cache = QueryCache::new();

    #[derive(Clone)]
    struct ZeroFreshness;

    impl QueryKey for ZeroFreshness {
      fn resource(&self) -> &str {
        "widgets"
      }

      fn canonical(&self) -> String {
        "widgets:zero".to_string()
      }

      fn freshness(&self) -> Duration {
        Duration::ZERO
      }
    }

    let query = Query::new(cache, ZeroFreshness, || async { Ok::<_, ApiError>(1u32) });
    query.ensure().await.expect("fetch");
    assert!(query.is_stale());
  }
}
