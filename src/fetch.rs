//! The network fetch primitive: the proxy's only collaborator besides the
//! cache store.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::FetchError;
use crate::http::{Method, Request, Response};

/// Issues one network request and settles with the response or a transport
/// error.
///
/// Any HTTP status counts as a settled response; only failing to produce a
/// response at all (offline, DNS, timeout) is an error. The proxy forwards
/// either outcome to the requester unchanged.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response, FetchError>> + Send;
}

/// Fetcher backed by a shared HTTP client.
///
/// Site-relative locators are resolved against the configured origin, the
/// way the controlled page itself would resolve them; absolute URLs pass
/// through untouched. Clone is cheap - the underlying client shares its
/// connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
  client: Client,
  origin: Url,
}

impl HttpFetcher {
  /// Build a fetcher for the origin named in `config`.
  pub fn new(config: &Config) -> Result<Self, FetchError> {
    let origin = Url::parse(&config.origin).map_err(|e| FetchError::InvalidUrl {
      url: config.origin.clone(),
      message: e.to_string(),
    })?;

    let client = Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .build()
      .map_err(|e| FetchError::Network {
        url: config.origin.clone(),
        message: e.to_string(),
      })?;

    Ok(Self { client, origin })
  }

  fn resolve(&self, locator: &str) -> Result<Url, FetchError> {
    self.origin.join(locator).map_err(|e| FetchError::InvalidUrl {
      url: locator.to_string(),
      message: e.to_string(),
    })
  }
}

impl Fetcher for HttpFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
    let url = self.resolve(&request.url)?;
    debug!(method = %request.method, url = %url, "forwarding to network");

    let mut builder = self.client.request(to_reqwest(request.method), url);
    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }

    let response = builder.send().await.map_err(|e| FetchError::Network {
      url: request.url.clone(),
      message: e.to_string(),
    })?;

    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .map(|(name, value)| {
        (
          name.as_str().to_string(),
          String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
      })
      .collect();

    let body = response.bytes().await.map_err(|e| FetchError::Network {
      url: request.url.clone(),
      message: e.to_string(),
    })?;

    Ok(Response {
      status,
      headers,
      body: body.to_vec(),
    })
  }
}

fn to_reqwest(method: Method) -> reqwest::Method {
  match method {
    Method::Get => reqwest::Method::GET,
    Method::Head => reqwest::Method::HEAD,
    Method::Post => reqwest::Method::POST,
    Method::Put => reqwest::Method::PUT,
    Method::Delete => reqwest::Method::DELETE,
    Method::Options => reqwest::Method::OPTIONS,
    Method::Patch => reqwest::Method::PATCH,
  }
}
