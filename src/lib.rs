//! Offline-first cache proxy for an embedded web application runtime.
//!
//! The proxy sits between a controlled page and the network. At install
//! time it warms a named, persistent cache with a fixed manifest of
//! critical resources, committed all-or-nothing. For every intercepted
//! request it answers from the cache when an entry matches the request
//! identity (method + URL), and delegates to the network otherwise.
//!
//! Responses are served and forwarded verbatim: no staleness checks, no
//! revalidation, and the miss path never writes back to the cache. The
//! store name acts as a version tag - changing it starts a fresh store and
//! leaves the old one behind.
//!
//! Typical wiring:
//!
//! ```no_run
//! use offcache::{Config, EventDriver, HttpFetcher, OfflineProxy, SqliteStore, CACHE_NAME};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::for_origin("https://spese.example.net");
//! let store = SqliteStore::open(CACHE_NAME)?;
//! let proxy = OfflineProxy::new(store, HttpFetcher::new(&config)?);
//!
//! let (driver, host) = EventDriver::new(proxy);
//! tokio::spawn(driver.run());
//!
//! host.install().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod http;
pub mod manifest;
pub mod proxy;

pub use cache::{CacheStore, CachedEntry, MemoryStore, SqliteStore};
pub use config::Config;
pub use error::{ConfigError, FetchError, InstallFailure, ProxyError, StoreError};
pub use event::{EventDriver, HostEvent, HostHandle};
pub use fetch::{Fetcher, HttpFetcher};
pub use http::{Method, Request, Response};
pub use manifest::{CACHE_NAME, PRECACHE_MANIFEST};
pub use proxy::{LifecycleState, OfflineProxy};
