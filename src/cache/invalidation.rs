//! Invalidation matching.
//!
//! A mutation maps to a fixed set of matchers; each matcher selects cache
//! entries to mark stale. Parameterized list keys (every filter variant of
//! "papers") are hit by a resource wildcard, single entries by their exact
//! key.

use super::key::QueryKey;

/// Selects the cache entries a mutation must mark stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatcher {
  /// One specific (resource, parameters) key.
  Key(String),
  /// Every entry of a resource, regardless of parameters.
  Resource(&'static str),
}

impl KeyMatcher {
  /// Exact matcher for a concrete key.
  pub fn exact<K: QueryKey + ?Sized>(key: &K) -> Self {
    Self::Key(key.cache_hash())
  }

  pub fn matches(&self, hash: &str, resource: &str) -> bool {
    match self {
      Self::Key(key) => key == hash,
      Self::Resource(name) => *name == resource,
    }
  }
}
