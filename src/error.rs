//! Error taxonomy for the proxy, its store and its network path.
//!
//! Errors are surfaced to the embedding host, never swallowed and never
//! retried internally. Warm-up failures carry the locator that sank the
//! batch; miss-path failures carry the fetch error unchanged.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the network fetch primitive.
#[derive(Error, Debug)]
pub enum FetchError {
  /// The request never produced a response: offline, DNS failure, timeout.
  #[error("Network error for {url}: {message}")]
  Network { url: String, message: String },

  /// The locator could not be resolved into a fetchable URL.
  #[error("Invalid locator {url}: {message}")]
  InvalidUrl { url: String, message: String },
}

/// Failures raised by a cache store backend.
#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Cache database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("Cache entry encoding error: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("Corrupt cache entry: {0}")]
  Corrupt(String),

  #[error("Cache store lock poisoned")]
  LockPoisoned,

  #[error("Could not determine data directory")]
  NoDataDir,

  #[error("Failed to create cache directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Why a single manifest resource sank the warm-up batch.
#[derive(Error, Debug)]
pub enum InstallFailure {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("unexpected status {status}")]
  Status { status: u16 },
}

/// Errors surfaced by configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Config file not found: {path}")]
  NotFound { path: PathBuf },

  #[error("No configuration file found. Create one at ~/.config/offcache/config.yaml")]
  NoneFound,

  #[error("Failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Top-level errors surfaced to the embedding host.
#[derive(Error, Debug)]
pub enum ProxyError {
  /// A manifest resource could not be fetched during warm-up. The whole
  /// batch is abandoned and the store is left untouched; retry, if any,
  /// is the host runtime's decision.
  #[error("Install failed while precaching {url}: {reason}")]
  InstallFailed {
    url: String,
    #[source]
    reason: InstallFailure,
  },

  /// Miss-path network failure, forwarded unchanged to the requester.
  #[error("Network unavailable: {0}")]
  NetworkUnavailable(#[source] FetchError),

  /// The cache store rejected a read or write.
  #[error(transparent)]
  Store(#[from] StoreError),

  /// The event driver has stopped; no further events can be delivered.
  #[error("Host event driver is no longer running")]
  Shutdown,
}
