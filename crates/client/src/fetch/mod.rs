//! HTTP implementation of the gateway's network seam.
//!
//! ### Response classification
//! - Responses whose final URL (after redirects) shares the site origin
//!   are `Basic` and eligible for the cache store.
//! - Everything else is `Cors`; this client never issues opaque fetches.
//!
//! ### Limits
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable)
//!
//! Transport failures map to [`Error::Network`]; HTTP error statuses are
//! returned as responses so the gateway can decide what to do with them.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};

use portico_core::{Error, Network, Request, Response, ResponseKind};

pub use self::url::{UrlError, resolve};

/// Configuration for the HTTP network client.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// User agent string (default: "portico/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            user_agent: "portico/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// HTTP network client bound to a site origin.
pub struct HttpNetwork {
    http: Client,
    config: NetConfig,
    origin: Url,
}

impl HttpNetwork {
    /// Create a new network client with the given origin and configuration.
    pub fn new(origin: Url, config: NetConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, origin })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    fn classify(&self, final_url: &Url) -> ResponseKind {
        if final_url.origin() == self.origin.origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::Network(format!("invalid method: {e}")))?;

        let response = self
            .http
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let kind = self.classify(&final_url);

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} -> {} [{} {}] in {}ms ({} bytes)",
            request.url,
            final_url,
            status,
            kind.as_str(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { status, kind, headers, body })
    }
}
