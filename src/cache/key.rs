//! Cache-key identity.

use sha2::{Digest, Sha256};
use std::time::Duration;

/// Default freshness window for list-like resources.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);

/// Identity of a cached query: a resource name plus a canonical rendering
/// of its parameters, hashed into a stable lookup key.
///
/// Two keys are equal iff their canonical renderings are equal; rendering
/// parameters in a fixed field order is the normal form, so insertion
/// order can never produce distinct keys for the same query.
pub trait QueryKey: Send + Sync {
  /// Resource name shared by every parameterized variant (e.g. "papers").
  /// Invalidation wildcards match on this.
  fn resource(&self) -> &str;

  /// Canonical rendering of (resource, parameters).
  fn canonical(&self) -> String;

  /// Human-readable label for logs.
  fn description(&self) -> String {
    self.canonical()
  }

  /// How long a successful fetch is served without re-fetching.
  fn freshness(&self) -> Duration {
    DEFAULT_FRESHNESS
  }

  /// Stable, fixed-length lookup key (SHA256 of the canonical rendering).
  fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }
}
