//! Cache entries and their lifecycle.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::error::ApiError;

/// Lifecycle status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Created but never fetched
  Idle,
  /// First fetch in flight, no value yet
  Loading,
  /// Holds the latest known value
  Success,
  /// The last fetch failed and there was no value to keep serving
  Error,
}

/// The latest known state for one cache key.
///
/// Exactly one of `value`/`error` is populated at a time. Values are
/// stored type-erased as JSON; typed decoding happens at the read
/// boundary. A `Success` entry keeps serving after `is_stale` flips —
/// replacement only happens when a revalidation lands.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub status: QueryStatus,
  pub value: Option<Value>,
  pub error: Option<ApiError>,
  pub fetched_at: Option<DateTime<Utc>>,
  pub is_stale: bool,
  resource: String,
}

impl CacheEntry {
  pub(crate) fn idle(resource: impl Into<String>) -> Self {
    Self {
      status: QueryStatus::Idle,
      value: None,
      error: None,
      fetched_at: None,
      is_stale: false,
      resource: resource.into(),
    }
  }

  /// Resource name this entry belongs to.
  pub fn resource(&self) -> &str {
    &self.resource
  }

  /// Inside the freshness window and not invalidated?
  pub fn is_fresh(&self, window: Duration) -> bool {
    if self.is_stale {
      return false;
    }
    match (self.fetched_at, chrono::Duration::from_std(window)) {
      (Some(at), Ok(window)) => Utc::now() - at < window,
      _ => false,
    }
  }

  /// Decode the stored value. `None` when there is no value or it does
  /// not decode to `T`.
  pub fn data<T: DeserializeOwned>(&self) -> Option<T> {
    self
      .value
      .as_ref()
      .and_then(|v| serde_json::from_value(v.clone()).ok())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn idle_entries_are_never_fresh() {
    let entry = CacheEntry::idle("papers");
    assert!(!entry.is_fresh(Duration::from_secs(60)));
  }

  #[test]
  fn stale_flag_defeats_freshness() {
    let mut entry = CacheEntry::idle("papers");
    entry.status = QueryStatus::Success;
    entry.value = Some(serde_json::json!([1, 2]));
    entry.fetched_at = Some(Utc::now());
    assert!(entry.is_fresh(Duration::from_secs(60)));

    entry.is_stale = true;
    assert!(!entry.is_fresh(Duration::from_secs(60)));
  }

  #[test]
  fn data_decodes_the_stored_value() {
    let mut entry = CacheEntry::idle("papers");
    entry.status = QueryStatus::Success;
    entry.value = Some(serde_json::json!([1, 2, 3]));
    assert_eq!(entry.data::<Vec<i32>>(), Some(vec![1, 2, 3]));
    assert_eq!(entry.data::<String>(), None);
  }
}
