//! End-to-end offline behavior over the public API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use offcache::{
  CacheStore, EventDriver, FetchError, Fetcher, LifecycleState, OfflineProxy, ProxyError, Request,
  Response, SqliteStore,
};

/// Scripted fetcher standing in for the network: programmed outcomes per
/// locator, every call logged.
#[derive(Default)]
struct ScriptedFetcher {
  outcomes: HashMap<String, Result<Response, String>>,
  calls: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedFetcher {
  fn new() -> Self {
    Self::default()
  }

  fn ok(mut self, url: &str, body: &[u8]) -> Self {
    self
      .outcomes
      .insert(url.to_string(), Ok(Response::new(200).with_body(body.to_vec())));
    self
  }

  fn fail(mut self, url: &str) -> Self {
    self
      .outcomes
      .insert(url.to_string(), Err("connection refused".to_string()));
    self
  }

  fn calls(&self) -> Arc<Mutex<Vec<Request>>> {
    Arc::clone(&self.calls)
  }
}

impl Fetcher for ScriptedFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
    self.calls.lock().unwrap().push(request.clone());

    match self.outcomes.get(&request.url) {
      Some(Ok(response)) => Ok(response.clone()),
      Some(Err(message)) => Err(FetchError::Network {
        url: request.url.clone(),
        message: message.clone(),
      }),
      None => Err(FetchError::Network {
        url: request.url.clone(),
        message: "unreachable".to_string(),
      }),
    }
  }
}

fn count_for(calls: &Arc<Mutex<Vec<Request>>>, url: &str) -> usize {
  calls.lock().unwrap().iter().filter(|r| r.url == url).count()
}

/// Opt-in traces: RUST_LOG=offcache=debug cargo test -- --nocapture
fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .try_init();
}

#[tokio::test]
async fn precache_then_serve_offline() {
  init_tracing();

  let fetcher = ScriptedFetcher::new()
    .ok("/", b"<html>home</html>")
    .ok("/a.js", b"console.log(1)")
    .ok("/missing.css", b"body{}");
  let calls = fetcher.calls();

  let store = SqliteStore::open_in_memory("pages-v1").unwrap();
  let proxy = OfflineProxy::new(store, fetcher).with_manifest(["/", "/a.js"]);

  // Install fetches both manifest entries and commits them as one batch.
  proxy.install().await.unwrap();
  assert_eq!(proxy.state(), LifecycleState::Active);
  assert_eq!(proxy.store().keys().unwrap().len(), 2);
  assert_eq!(calls.lock().unwrap().len(), 2);

  // A precached page is served from the store with no network call.
  let home = proxy.intercept(&Request::get("/")).await.unwrap();
  assert_eq!(home.body, b"<html>home</html>");
  assert_eq!(count_for(&calls, "/"), 1);

  // A miss goes to the network exactly once and the result is forwarded
  // verbatim.
  let css = proxy.intercept(&Request::get("/missing.css")).await.unwrap();
  assert_eq!(css.body, b"body{}");
  assert_eq!(count_for(&calls, "/missing.css"), 1);

  // The miss did not populate the store.
  assert!(proxy
    .store()
    .match_request(&Request::get("/missing.css"))
    .unwrap()
    .is_none());
  assert_eq!(proxy.store().keys().unwrap().len(), 2);
}

#[tokio::test]
async fn failed_install_commits_nothing() {
  let fetcher = ScriptedFetcher::new().ok("/", b"home").fail("/a.js");

  let store = SqliteStore::open_in_memory("pages-v1").unwrap();
  let proxy = OfflineProxy::new(store, fetcher).with_manifest(["/", "/a.js"]);

  let err = proxy.install().await.unwrap_err();
  assert!(matches!(err, ProxyError::InstallFailed { ref url, .. } if url == "/a.js"));

  // The successful "/" fetch is not left behind.
  assert_eq!(proxy.store().keys().unwrap().len(), 0);
  assert_eq!(proxy.state(), LifecycleState::Uninitialized);
}

#[tokio::test]
async fn warm_store_survives_a_new_activation() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("pages-v1.db");

  {
    let fetcher = ScriptedFetcher::new().ok("/", b"home");
    let store = SqliteStore::open_at(&path, "pages-v1").unwrap();
    let proxy = OfflineProxy::new(store, fetcher).with_manifest(["/"]);
    proxy.install().await.unwrap();
  }

  // A later activation opens the same store and serves hits even with the
  // network gone.
  let offline = ScriptedFetcher::new();
  let store = SqliteStore::open_at(&path, "pages-v1").unwrap();
  let proxy = OfflineProxy::new(store, offline).with_manifest(["/"]);

  let home = proxy.intercept(&Request::get("/")).await.unwrap();
  assert_eq!(home.body, b"home");
}

#[tokio::test]
async fn event_driven_host_round_trip() {
  init_tracing();

  let fetcher = ScriptedFetcher::new().ok("/", b"home").ok("/a.js", b"js");

  let store = SqliteStore::open_in_memory("pages-v1").unwrap();
  let proxy = OfflineProxy::new(store, fetcher).with_manifest(["/", "/a.js"]);

  let (driver, host) = EventDriver::new(proxy);
  tokio::spawn(driver.run());

  host.install().await.unwrap();

  let (home, js) = tokio::join!(
    host.fetch(Request::get("/")),
    host.fetch(Request::get("/a.js"))
  );
  assert_eq!(home.unwrap().body, b"home");
  assert_eq!(js.unwrap().body, b"js");

  // A request nobody scripted and nobody cached fails exactly as it would
  // with no proxy present.
  let err = host.fetch(Request::get("/gone")).await.unwrap_err();
  assert!(matches!(err, ProxyError::NetworkUnavailable(_)));
}
