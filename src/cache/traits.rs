//! Core trait and types for cache store backends.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::http::{Method, Request, Response};

/// A cache lookup result: the stored response plus commit-time metadata.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// The response exactly as observed when the batch was committed.
  pub response: Response,
  /// When the entry was committed.
  pub cached_at: DateTime<Utc>,
}

/// A named key-value store mapping request identity to a stored response.
///
/// The name acts as a version tag: two stores opened under different names
/// never observe each other's entries. The proxy treats the store as the
/// platform cache primitive it builds on, so batch writes must be atomic:
/// either every entry of [`put_all`](CacheStore::put_all) becomes visible
/// or none does.
pub trait CacheStore: Send + Sync {
  /// The cache name this store was opened under.
  fn name(&self) -> &str;

  /// Commit a batch of entries as a single unit.
  fn put_all(&self, entries: &[(Request, Response)]) -> Result<(), StoreError>;

  /// Look up a request by identity (method + URL, matched exactly).
  /// Lookups have no side effects on the store.
  fn match_request(&self, request: &Request) -> Result<Option<CachedEntry>, StoreError>;

  /// Identity keys of every entry, ordered by URL.
  fn keys(&self) -> Result<Vec<(Method, String)>, StoreError>;
}
