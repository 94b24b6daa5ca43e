//! Keyed query cache: request de-duplication, bounded retries,
//! stale-while-revalidate serving, and mutation-driven invalidation.
//!
//! The cache guarantees at most one in-flight fetch per key: concurrent
//! readers join the pending operation and observe the same outcome.
//! Values are stored type-erased as JSON and decoded at the read boundary,
//! so one cache instance serves every resource.

use chrono::Utc;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::entry::{CacheEntry, QueryStatus};
use super::invalidation::KeyMatcher;
use super::key::QueryKey;
use super::query::QueryState;
use crate::error::ApiError;

pub(crate) type Outcome = Result<Value, ApiError>;
type Refetcher = Arc<dyn Fn() -> BoxFuture<'static, Outcome> + Send + Sync>;

struct Inflight {
  tx: broadcast::Sender<Outcome>,
  /// Set when an invalidation lands while this fetch is running, so the
  /// resolved entry is re-marked stale instead of reading as fresh.
  invalidated: bool,
}

#[derive(Default)]
struct CacheInner {
  entries: HashMap<String, CacheEntry>,
  inflight: HashMap<String, Inflight>,
  /// Latest fetcher per key, for background revalidation.
  refetchers: HashMap<String, Refetcher>,
  /// Active reader counts per key.
  watchers: HashMap<String, usize>,
}

impl CacheInner {
  fn begin(&mut self, hash: &str) {
    let (tx, _rx) = broadcast::channel(8);
    self.inflight.insert(
      hash.to_string(),
      Inflight {
        tx,
        invalidated: false,
      },
    );
  }
}

/// Shared cache instance with an explicit lifecycle: created by the
/// caller, passed down to every component that reads or writes it, and
/// cleared on logout. Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct QueryCache {
  inner: Arc<Mutex<CacheInner>>,
  retry_limit: u32,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryCache {
  pub fn new() -> Self {
    Self::with_retry_limit(2)
  }

  pub fn with_retry_limit(retry_limit: u32) -> Self {
    Self {
      inner: Arc::new(Mutex::new(CacheInner::default())),
      retry_limit,
    }
  }

  fn lock(&self) -> MutexGuard<'_, CacheInner> {
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Read-through fetch.
  ///
  /// A fresh `Success` entry is served without I/O. A stale one is served
  /// immediately while exactly one background revalidation runs. With no
  /// servable value the call awaits the fetch — joining the in-flight
  /// operation when one exists, so a key never has two simultaneous
  /// fetches.
  pub async fn fetch<K, T, F, Fut>(&self, key: &K, fetcher: F) -> Result<T, ApiError>
  where
    K: QueryKey + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    self
      .fetch_inner(key, erase(fetcher), false)
      .await
      .and_then(decode)
  }

  /// Force a fetch, bypassing freshness. Joins an in-flight fetch when one
  /// exists rather than starting a second.
  pub async fn refetch<K, T, F, Fut>(&self, key: &K, fetcher: F) -> Result<T, ApiError>
  where
    K: QueryKey + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    self
      .fetch_inner(key, erase(fetcher), true)
      .await
      .and_then(decode)
  }

  async fn fetch_inner<K: QueryKey + ?Sized>(
    &self,
    key: &K,
    refetcher: Refetcher,
    force: bool,
  ) -> Outcome {
    let hash = key.cache_hash();

    enum Plan {
      Hit(Value),
      Join(broadcast::Receiver<Outcome>),
      Run,
      Revalidate(Value),
    }

    let plan = {
      let mut inner = self.lock();
      inner.refetchers.insert(hash.clone(), refetcher);

      let snapshot = inner
        .entries
        .get(&hash)
        .map(|entry| (entry.status, entry.value.clone(), entry.is_fresh(key.freshness())));

      match snapshot {
        Some((QueryStatus::Success, Some(value), fresh)) if !force => {
          if fresh || inner.inflight.contains_key(&hash) {
            // An in-flight revalidation counts as the one refetch this
            // access burst gets.
            Plan::Hit(value)
          } else {
            inner.begin(&hash);
            Plan::Revalidate(value)
          }
        }
        _ => {
          if let Some(inflight) = inner.inflight.get(&hash) {
            Plan::Join(inflight.tx.subscribe())
          } else {
            let resource = key.resource().to_string();
            let entry = inner
              .entries
              .entry(hash.clone())
              .or_insert_with(|| CacheEntry::idle(resource));
            if entry.value.is_none() {
              entry.status = QueryStatus::Loading;
            }
            inner.begin(&hash);
            Plan::Run
          }
        }
      }
    };

    match plan {
      Plan::Hit(value) => Ok(value),
      Plan::Join(mut rx) => match rx.recv().await {
        Ok(outcome) => outcome,
        Err(_) => Err(ApiError::unknown("Fetch was abandoned")),
      },
      Plan::Run => self.drive(hash).await,
      Plan::Revalidate(value) => {
        let cache = self.clone();
        tokio::spawn(async move {
          let _ = cache.drive(hash).await;
        });
        Ok(value)
      }
    }
  }

  /// Run the registered fetcher for a key and resolve the entry. The
  /// caller must already hold the in-flight slot for `hash`.
  async fn drive(&self, hash: String) -> Outcome {
    let refetcher = self.lock().refetchers.get(&hash).cloned();
    let outcome = match refetcher {
      Some(fetch) => self.attempts(|| fetch()).await,
      None => Err(ApiError::unknown("No fetcher registered for key")),
    };
    self.resolve(&hash, outcome.clone());
    outcome
  }

  /// One fetch operation: the initial attempt plus up to `retry_limit`
  /// immediate re-issues. Only the final outcome is reported.
  pub(crate) async fn attempts<T, F, Fut>(&self, fetch: F) -> Result<T, ApiError>
  where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let mut attempt = 0;
    loop {
      match fetch().await {
        Ok(value) => return Ok(value),
        Err(err) => {
          if attempt >= self.retry_limit || !err.is_retryable() {
            return Err(err);
          }
          attempt += 1;
          debug!(attempt, code = %err.code, "retrying failed fetch");
        }
      }
    }
  }

  /// Store a fetch outcome, release the in-flight slot, and notify
  /// joined readers.
  pub(crate) fn resolve(&self, hash: &str, outcome: Outcome) {
    let notify = {
      let mut inner = self.lock();
      let inflight = inner.inflight.remove(hash);
      let invalidated = inflight.as_ref().map(|i| i.invalidated).unwrap_or(false);

      if let Some(entry) = inner.entries.get_mut(hash) {
        match &outcome {
          Ok(value) => {
            entry.status = QueryStatus::Success;
            entry.value = Some(value.clone());
            entry.error = None;
            entry.fetched_at = Some(Utc::now());
            entry.is_stale = invalidated;
          }
          Err(err) => {
            if entry.value.is_some() {
              // Keep serving the stale value rather than dropping to an
              // error state; the next access revalidates again.
              warn!(code = %err.code, "revalidation failed, keeping stale entry");
              entry.is_stale = true;
            } else {
              entry.status = QueryStatus::Error;
              entry.error = Some(err.clone());
            }
          }
        }
      }

      inflight.map(|i| i.tx)
    };

    if let Some(tx) = notify {
      let _ = tx.send(outcome);
    }
  }

  /// Release the in-flight slot without touching the entry (a pagination
  /// fetch that failed; the collection fetched so far stays servable).
  pub(crate) fn cancel(&self, hash: &str) {
    self.lock().inflight.remove(hash);
  }

  /// Claim the in-flight slot for a key. Returns false when a fetch for
  /// the key is already running.
  pub(crate) fn try_begin(&self, hash: &str) -> bool {
    let mut inner = self.lock();
    if inner.inflight.contains_key(hash) {
      return false;
    }
    inner.begin(hash);
    true
  }

  pub(crate) fn is_inflight(&self, hash: &str) -> bool {
    self.lock().inflight.contains_key(hash)
  }

  pub(crate) fn read_hash(&self, hash: &str) -> Option<CacheEntry> {
    self.lock().entries.get(hash).cloned()
  }

  /// Snapshot of the entry for a key.
  pub fn read<K: QueryKey + ?Sized>(&self, key: &K) -> Option<CacheEntry> {
    self.read_hash(&key.cache_hash())
  }

  /// Typed snapshot for rendering.
  pub fn state<K: QueryKey + ?Sized, T: DeserializeOwned>(&self, key: &K) -> QueryState<T> {
    match self.read(key) {
      None => QueryState::Idle,
      Some(entry) => entry_state(entry),
    }
  }

  /// Register an active reader for a key. While the guard lives,
  /// invalidations of the key refetch immediately instead of deferring to
  /// the next read.
  pub fn watch<K: QueryKey + ?Sized>(&self, key: &K) -> WatchGuard {
    let hash = key.cache_hash();
    *self.lock().watchers.entry(hash.clone()).or_insert(0) += 1;
    WatchGuard {
      cache: self.clone(),
      hash,
    }
  }

  /// Mark every matching entry stale, atomically with respect to readers.
  ///
  /// Entries with at least one active watcher trigger exactly one
  /// background refetch; unwatched entries revalidate on their next read.
  pub fn invalidate(&self, matchers: &[KeyMatcher]) {
    let to_refetch = {
      let mut inner = self.lock();

      let mut hits: Vec<String> = Vec::new();
      for (hash, entry) in inner.entries.iter_mut() {
        if matchers.iter().any(|m| m.matches(hash, entry.resource())) {
          entry.is_stale = true;
          hits.push(hash.clone());
        }
      }

      let mut spawn = Vec::new();
      for hash in hits {
        if let Some(inflight) = inner.inflight.get_mut(&hash) {
          inflight.invalidated = true;
          continue;
        }
        let watched = inner.watchers.get(&hash).copied().unwrap_or(0) > 0;
        if watched && inner.refetchers.contains_key(&hash) {
          inner.begin(&hash);
          spawn.push(hash);
        }
      }
      spawn
    };

    for hash in to_refetch {
      debug!(key = %hash, "invalidation triggered refetch");
      let cache = self.clone();
      tokio::spawn(async move {
        let _ = cache.drive(hash).await;
      });
    }
  }

  /// Drop everything (logout). In-flight fetches resolve into the void;
  /// their joined readers observe an abandoned fetch.
  pub fn clear(&self) {
    let mut inner = self.lock();
    inner.entries.clear();
    inner.refetchers.clear();
    inner.watchers.clear();
    inner.inflight.clear();
  }
}

/// Decrements the active-reader count for its key on drop.
pub struct WatchGuard {
  cache: QueryCache,
  hash: String,
}

impl Drop for WatchGuard {
  fn drop(&mut self) {
    let mut inner = self.cache.lock();
    if let Some(count) = inner.watchers.get_mut(&self.hash) {
      *count -= 1;
      if *count == 0 {
        inner.watchers.remove(&self.hash);
      }
    }
  }
}

fn erase<T, F, Fut>(fetcher: F) -> Refetcher
where
  T: Serialize,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
  Arc::new(move || {
    let fut = fetcher();
    Box::pin(async move {
      let data = fut.await?;
      serde_json::to_value(data).map_err(ApiError::decode)
    })
  })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
  serde_json::from_value(value).map_err(ApiError::decode)
}

pub(crate) fn entry_state<T: DeserializeOwned>(entry: CacheEntry) -> QueryState<T> {
  match entry.status {
    QueryStatus::Idle => QueryState::Idle,
    QueryStatus::Loading => QueryState::Loading,
    QueryStatus::Success => match entry.data::<T>() {
      Some(data) => QueryState::Success(data),
      None => QueryState::Error(ApiError::unknown("Cached value does not decode")),
    },
    QueryStatus::Error => QueryState::Error(
      entry
        .error
        .unwrap_or_else(|| ApiError::unknown("Error entry without a stored error")),
    ),
  }
}
