//! The offline cache proxy: install-time warm-up and per-request
//! interception.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::error::{InstallFailure, ProxyError};
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::manifest::PRECACHE_MANIFEST;

/// Lifecycle of one proxy activation.
///
/// There is no transition back from `Active`; only the host replacing the
/// whole activation starts over at `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  /// Install has not completed. Interception works, but the cache may be
  /// cold.
  Uninitialized,
  /// Install committed the manifest; the cache holds the precached batch.
  Active,
}

/// Cache-first proxy between a controlled page and the network.
///
/// The store handle and fetch primitive are passed in explicitly rather
/// than resolved through process globals, so hosts and tests can supply
/// their own backends.
pub struct OfflineProxy<S, F> {
  store: Arc<S>,
  fetcher: F,
  manifest: Vec<String>,
  installed: AtomicBool,
}

impl<S: CacheStore, F: Fetcher> OfflineProxy<S, F> {
  /// Build a proxy over a store handle and a fetch primitive, warming the
  /// standard precache manifest on install.
  pub fn new(store: S, fetcher: F) -> Self {
    Self {
      store: Arc::new(store),
      fetcher,
      manifest: PRECACHE_MANIFEST.iter().map(|s| s.to_string()).collect(),
      installed: AtomicBool::new(false),
    }
  }

  /// Replace the precache manifest.
  pub fn with_manifest<I, T>(mut self, manifest: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.manifest = manifest.into_iter().map(Into::into).collect();
    self
  }

  /// Current lifecycle state.
  pub fn state(&self) -> LifecycleState {
    if self.installed.load(Ordering::Acquire) {
      LifecycleState::Active
    } else {
      LifecycleState::Uninitialized
    }
  }

  /// The store this activation warms and reads.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Warm the cache with every manifest resource, as one batch.
  ///
  /// All resources are fetched before anything is written; a transport
  /// failure or non-2xx status for any single resource abandons the whole
  /// batch and leaves the store untouched. No retry happens here - that is
  /// the host runtime's install policy, not ours.
  pub async fn install(&self) -> Result<(), ProxyError> {
    let fetches = self.manifest.iter().map(|locator| {
      let request = Request::get(locator.clone());
      async move {
        match self.fetcher.fetch(&request).await {
          Ok(response) if response.is_success() => Ok((request, response)),
          Ok(response) => Err(ProxyError::InstallFailed {
            url: locator.clone(),
            reason: InstallFailure::Status {
              status: response.status,
            },
          }),
          Err(e) => Err(ProxyError::InstallFailed {
            url: locator.clone(),
            reason: InstallFailure::Fetch(e),
          }),
        }
      }
    });

    let entries = try_join_all(fetches).await?;
    self.store.put_all(&entries)?;
    self.installed.store(true, Ordering::Release);

    info!(
      cache = %self.store.name(),
      entries = entries.len(),
      "cache opened and precache manifest committed"
    );

    Ok(())
  }

  /// Answer one intercepted request: from the cache when an entry matches
  /// the request identity, from the network otherwise.
  ///
  /// Hits are returned exactly as stored, with no staleness check and no
  /// revalidation. Misses are forwarded with the original request
  /// unmodified and the network's outcome - success or failure - passes
  /// through verbatim. The miss path never writes back to the store.
  pub async fn intercept(&self, request: &Request) -> Result<Response, ProxyError> {
    if let Some(entry) = self.store.match_request(request)? {
      debug!(
        method = %request.method,
        url = %request.url,
        cached_at = %entry.cached_at,
        "cache hit"
      );
      return Ok(entry.response);
    }

    debug!(method = %request.method, url = %request.url, "cache miss");
    self
      .fetcher
      .fetch(request)
      .await
      .map_err(ProxyError::NetworkUnavailable)
  }
}
