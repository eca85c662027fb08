//! HTTP transport for the library API.
//!
//! The store talks to the API through the [`Transport`] trait so tests can
//! substitute a scripted implementation; [`HttpTransport`] is the
//! reqwest-backed one used by the CLI.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;

use crate::error::{CatalogError, Result};

/// Request timeout for all API calls.
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// A JSON-over-HTTP GET transport.
///
/// `query` is a list of key/value pairs appended to the URL; repeated keys
/// are allowed (the vector endpoint takes `e=<rel-id>` once per
/// identifier).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value>;
}

/// reqwest-backed transport.
///
/// Sends `Accept: application/json` on every request. A non-2xx response
/// fails with [`CatalogError::Fetch`] carrying the numeric status and its
/// reason; there is no retry.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        tracing::debug!(%url, params = query.len(), "GET");

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|source| CatalogError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Fetch {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|source| CatalogError::Transport {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|source| CatalogError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
