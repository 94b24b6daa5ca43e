//! Cursor-based infinite pagination over a cached collection.
//!
//! A collection's realized value is the concatenation of every page
//! fetched so far, in fetch order; the client never reorders or dedupes —
//! ordering authority is the server. Page fetches for one key are
//! strictly sequential, and invalidating the key discards all pages so
//! the next fetch restarts from the first page.

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use super::entry::QueryStatus;
use super::invalidation::KeyMatcher;
use super::key::QueryKey;
use super::query::QueryState;
use super::store::{entry_state, QueryCache, WatchGuard};
use crate::error::ApiError;

/// One fetched slice of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// Opaque server-issued cursor for the next page. Never constructed or
  /// parsed client-side.
  pub next_cursor: Option<String>,
  pub has_next: bool,
}

/// The cached value of a paginated collection: pages in fetch order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PagedState<T> {
  pages: Vec<Page<T>>,
}

impl<T> PagedState<T> {
  fn items(self) -> Vec<T> {
    self.pages.into_iter().flat_map(|page| page.items).collect()
  }

  fn last(&self) -> Option<&Page<T>> {
    self.pages.last()
  }
}

type PageFetcher<T> =
  Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<Page<T>, ApiError>> + Send + Sync>;

/// Handle for one paginated collection key.
///
/// Holding the handle registers an active reader, so invalidations of the
/// key refetch the first page immediately instead of waiting for the next
/// access.
pub struct PagedQuery<T> {
  cache: QueryCache,
  key: Arc<dyn QueryKey>,
  hash: String,
  fetch_page: PageFetcher<T>,
  _watch: WatchGuard,
}

impl<T> PagedQuery<T>
where
  T: Serialize + DeserializeOwned + Send + 'static,
{
  /// Create a handle. `fetch_page` receives the cursor of the page to
  /// fetch (`None` means the first page).
  pub fn new<K, F, Fut>(cache: QueryCache, key: K, fetch_page: F) -> Self
  where
    K: QueryKey + 'static,
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, ApiError>> + Send + 'static,
  {
    let watch = cache.watch(&key);
    let hash = key.cache_hash();
    let fetch_page: PageFetcher<T> = Arc::new(move |cursor| Box::pin(fetch_page(cursor)));
    Self {
      cache,
      key: Arc::new(key),
      hash,
      fetch_page,
      _watch: watch,
    }
  }

  /// Load the first page if nothing is cached, otherwise serve the cached
  /// collection (revalidating in the background when stale). Returns the
  /// realized items.
  ///
  /// The fetcher registered here re-fetches the first page and replaces
  /// the whole collection — which is how an invalidated collection
  /// restarts pagination.
  pub async fn ensure(&self) -> Result<Vec<T>, ApiError> {
    let fetch_page = self.fetch_page.clone();
    let state: PagedState<T> = self
      .cache
      .fetch(&*self.key, move || {
        let fetch_page = fetch_page.clone();
        async move {
          let first = fetch_page(None).await?;
          Ok(PagedState { pages: vec![first] })
        }
      })
      .await?;
    Ok(state.items())
  }

  /// Fetch the next page, if any.
  ///
  /// Returns `Ok(true)` when a page was fetched (including the first page
  /// on initial access) and `Ok(false)` as a no-op when a fetch for this
  /// key is already in flight or the collection is exhausted. At most one
  /// page fetch runs per key, and page N+1 is never requested before page
  /// N's response has been observed.
  pub async fn fetch_next_page(&self) -> Result<bool, ApiError> {
    let loaded = matches!(
      self.cache.read_hash(&self.hash),
      Some(ref entry) if entry.status == QueryStatus::Success && entry.value.is_some()
    );

    if !loaded {
      if self.cache.is_inflight(&self.hash) {
        return Ok(false);
      }
      self.ensure().await?;
      return Ok(true);
    }

    if !self.cache.try_begin(&self.hash) {
      return Ok(false);
    }

    // Exclusive now: no other fetch can move the collection under us, so
    // the cursor read below is the one that ordered this page.
    let state = match self.current_state() {
      Some(state) => state,
      None => {
        self.cache.cancel(&self.hash);
        return Err(ApiError::unknown("Cached collection does not decode"));
      }
    };

    let cursor = match state.last() {
      Some(last) if last.has_next => last.next_cursor.clone(),
      _ => {
        self.cache.cancel(&self.hash);
        return Ok(false);
      }
    };

    let fetch_page = self.fetch_page.clone();
    let fetched = self
      .cache
      .attempts(move || fetch_page(cursor.clone()))
      .await;

    match fetched {
      Ok(page) => {
        let mut state = state;
        state.pages.push(page);
        let value = serde_json::to_value(&state).map_err(ApiError::decode)?;
        self.cache.resolve(&self.hash, Ok(value));
        Ok(true)
      }
      Err(err) => {
        // The pages fetched so far stay servable.
        self.cache.cancel(&self.hash);
        Err(err)
      }
    }
  }

  fn current_state(&self) -> Option<PagedState<T>> {
    self
      .cache
      .read_hash(&self.hash)
      .and_then(|entry| entry.data::<PagedState<T>>())
  }

  /// Realized items: every fetched page concatenated in fetch order.
  pub fn items(&self) -> Vec<T> {
    self.current_state().map(PagedState::items).unwrap_or_default()
  }

  /// The fetched pages, in fetch order.
  pub fn pages(&self) -> Vec<Page<T>> {
    self.current_state().map(|s| s.pages).unwrap_or_default()
  }

  /// Whether another `fetch_next_page` call can produce a page. True
  /// before the first fetch.
  pub fn has_next_page(&self) -> bool {
    match self.current_state() {
      Some(state) => state.last().map(|page| page.has_next).unwrap_or(false),
      None => true,
    }
  }

  /// Whether a fetch for this collection is currently in flight.
  pub fn is_fetching(&self) -> bool {
    self.cache.is_inflight(&self.hash)
  }

  /// Renderable snapshot of the realized collection.
  pub fn state(&self) -> QueryState<Vec<T>> {
    match self.cache.read_hash(&self.hash) {
      None => QueryState::Idle,
      Some(entry) => match entry_state::<PagedState<T>>(entry) {
        QueryState::Idle => QueryState::Idle,
        QueryState::Loading => QueryState::Loading,
        QueryState::Success(state) => QueryState::Success(state.items()),
        QueryState::Error(err) => QueryState::Error(err),
      },
    }
  }

  /// Discard all pages on next refetch by marking this collection stale.
  pub fn invalidate(&self) {
    self.cache.invalidate(&[KeyMatcher::Key(self.hash.clone())]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;
  use tokio::time::sleep;

  #[derive(Clone)]
  struct CollectionKey(&'static str);

  impl QueryKey for CollectionKey {
    fn resource(&self) -> &str {
      "papers"
    }

    fn canonical(&self) -> String {
      format!("papers:{}", self.0)
    }
  }

  fn two_page_fetcher(
    calls: Arc<AtomicU32>,
    delay: Duration,
  ) -> impl Fn(Option<String>) -> BoxFuture<'static, Result<Page<i32>, ApiError>> + Send + Sync + Clone
  {
    move |cursor| {
      let calls = calls.clone();
      let fut: BoxFuture<'static, Result<Page<i32>, ApiError>> = Box::pin(async move {
        calls.fetch_add(1, Ordering::SeqCst);
        if !delay.is_zero() {
          sleep(delay).await;
        }
        match cursor.as_deref() {
          None => Ok(Page {
            items: vec![1, 2],
            next_cursor: Some("c1".to_string()),
            has_next: true,
          }),
          Some("c1") => Ok(Page {
            items: vec![3, 4],
            next_cursor: None,
            has_next: false,
          }),
          Some(other) => Err(ApiError::unknown(format!("unexpected cursor {}", other))),
        }
      });
      fut
    }
  }

  #[tokio::test]
  async fn pages_concatenate_in_fetch_order() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let query = PagedQuery::new(
      cache,
      CollectionKey("all"),
      two_page_fetcher(calls.clone(), Duration::ZERO),
    );

    assert!(query.has_next_page());
    assert!(query.fetch_next_page().await.expect("first page"));
    assert_eq!(query.items(), vec![1, 2]);
    assert!(query.has_next_page());

    assert!(query.fetch_next_page().await.expect("second page"));
    assert_eq!(query.items(), vec![1, 2, 3, 4]);
    assert!(!query.has_next_page());

    // Exhausted: a further call is a no-op.
    assert!(!query.fetch_next_page().await.expect("no-op"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn rapid_next_page_calls_fetch_once() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let query = Arc::new(PagedQuery::new(
      cache,
      CollectionKey("all"),
      two_page_fetcher(calls.clone(), Duration::from_millis(50)),
    ));

    query.ensure().await.expect("first page");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Two rapid calls before the first response: exactly one page fetch.
    let a = tokio::spawn({
      let query = query.clone();
      async move { query.fetch_next_page().await }
    });
    let b = tokio::spawn({
      let query = query.clone();
      async move { query.fetch_next_page().await }
    });

    let (a, b) = (
      a.await.expect("join").expect("a"),
      b.await.expect("join").expect("b"),
    );
    // One call fetched, the other was a no-op.
    assert!(a ^ b);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(query.items(), vec![1, 2, 3, 4]);
  }

  #[tokio::test]
  async fn invalidation_restarts_from_the_first_page() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let query = PagedQuery::new(
      cache.clone(),
      CollectionKey("all"),
      two_page_fetcher(calls.clone(), Duration::ZERO),
    );

    query.ensure().await.expect("first page");
    query.fetch_next_page().await.expect("second page");
    assert_eq!(query.items(), vec![1, 2, 3, 4]);

    // The handle counts as an active reader, so the refetch is immediate.
    query.invalidate();
    sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(query.items(), vec![1, 2]);
    assert!(query.has_next_page());
  }

  #[tokio::test]
  async fn failed_page_fetch_keeps_earlier_pages() {
    let cache = QueryCache::with_retry_limit(0);
    let calls = Arc::new(AtomicU32::new(0));
    let query = PagedQuery::new(cache, CollectionKey("all"), {
      let calls = calls.clone();
      move |cursor: Option<String>| {
        let calls = calls.clone();
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          match cursor {
            None => Ok(Page {
              items: vec![1, 2],
              next_cursor: Some("c1".to_string()),
              has_next: true,
            }),
            Some(_) => Err(ApiError::new(503, "UNAVAILABLE", "down")),
          }
        }
      }
    });

    query.ensure().await.expect("first page");
    let err = query.fetch_next_page().await.expect_err("page two fails");
    assert_eq!(err.code, "UNAVAILABLE");

    assert_eq!(query.items(), vec![1, 2]);
    assert!(query.has_next_page());
    assert!(!query.is_fetching());
  }
}
