//! Host-runtime event plumbing.
//!
//! The host delivers two kinds of events: one `Install` when an activation
//! first comes up, and a `Fetch` per outgoing request for as long as it
//! stays up. The driver keeps the install reply open until warm-up settles
//! and handles fetches concurrently; distinct requests share nothing but
//! the read-only store handle, so they need no coordination.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::cache::CacheStore;
use crate::error::ProxyError;
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::proxy::OfflineProxy;

/// Events delivered by the host runtime.
#[derive(Debug)]
pub enum HostEvent {
  /// Fired once when this proxy version is first activated for the page.
  /// The sender resolves when warm-up settles; the host holds its
  /// lifecycle open until then.
  Install {
    done: oneshot::Sender<Result<(), ProxyError>>,
  },
  /// Fired for every outgoing request originated by the controlled page.
  /// The sender resolves with exactly one outcome: the cached response or
  /// whatever the network yielded.
  Fetch {
    request: Request,
    respond: oneshot::Sender<Result<Response, ProxyError>>,
  },
}

/// Clone-able handle the host runtime uses to deliver events.
#[derive(Clone)]
pub struct HostHandle {
  tx: mpsc::UnboundedSender<HostEvent>,
}

impl HostHandle {
  /// Deliver the install event and wait for warm-up to settle.
  pub async fn install(&self) -> Result<(), ProxyError> {
    let (done, settled) = oneshot::channel();
    self
      .tx
      .send(HostEvent::Install { done })
      .map_err(|_| ProxyError::Shutdown)?;
    settled.await.map_err(|_| ProxyError::Shutdown)?
  }

  /// Deliver one intercepted request and wait for its resolution.
  pub async fn fetch(&self, request: Request) -> Result<Response, ProxyError> {
    let (respond, resolution) = oneshot::channel();
    self
      .tx
      .send(HostEvent::Fetch { request, respond })
      .map_err(|_| ProxyError::Shutdown)?;
    resolution.await.map_err(|_| ProxyError::Shutdown)?
  }
}

/// Event loop binding a proxy to the host's event stream.
pub struct EventDriver<S, F> {
  proxy: Arc<OfflineProxy<S, F>>,
  rx: mpsc::UnboundedReceiver<HostEvent>,
}

impl<S, F> EventDriver<S, F>
where
  S: CacheStore + 'static,
  F: Fetcher + 'static,
{
  /// Wire a proxy to a fresh event channel.
  pub fn new(proxy: OfflineProxy<S, F>) -> (Self, HostHandle) {
    let (tx, rx) = mpsc::unbounded_channel();

    (
      Self {
        proxy: Arc::new(proxy),
        rx,
      },
      HostHandle { tx },
    )
  }

  /// Consume events until every [`HostHandle`] is dropped.
  ///
  /// Install is handled inline: no later event is consumed until warm-up
  /// settles, which is the only ordering guarantee the proxy makes. Fetch
  /// events are spawned onto independent tasks, so concurrently arriving
  /// requests resolve in no particular order.
  pub async fn run(mut self) {
    while let Some(event) = self.rx.recv().await {
      match event {
        HostEvent::Install { done } => {
          let result = self.proxy.install().await;
          if done.send(result).is_err() {
            debug!("install settled after the host stopped waiting");
          }
        }
        HostEvent::Fetch { request, respond } => {
          let proxy = Arc::clone(&self.proxy);
          tokio::spawn(async move {
            let resolution = proxy.intercept(&request).await;
            if respond.send(resolution).is_err() {
              debug!(url = %request.url, "requester went away before resolution");
            }
          });
        }
      }
    }
  }
}
