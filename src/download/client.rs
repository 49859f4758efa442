//! HTTP client shared by the manifest lookup and the image transfers.
//!
//! This module provides the `HttpClient` struct, built once per run from an
//! immutable [`ClientConfig`] and shared (cloned) by every worker. Cloning is
//! cheap: all clones use the same keep-alive connection pool and cookie store.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER,
};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::transport::{Transport, TransportResponse};
use crate::user_agent::{BROWSER_USER_AGENT, FRONTEND_ORIGIN, frontend_referer};

/// Immutable HTTP configuration for one run.
///
/// The header set is mandatory for the Antenati servers: requests without a
/// browser `User-Agent` and a front-end `Referer` are answered with 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `User-Agent` header value.
    pub user_agent: String,
    /// `Referer` header value.
    pub referer: String,
    /// `Origin` header value.
    pub origin: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout (headers and body).
    pub read_timeout: Duration,
    /// Idle keep-alive connections retained per host.
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            referer: frontend_referer(),
            origin: FRONTEND_ORIGIN.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            max_idle_per_host: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ClientConfig {
    /// Sizes the keep-alive pool for `max_connections` simultaneous transfers.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_idle_per_host = max_connections;
        self
    }

    /// Overrides connect and request timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: Duration, read_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
        self
    }

    fn default_headers(&self) -> Result<HeaderMap, DownloadError> {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, REFERER, "Referer", &self.referer)?;
        insert_header(&mut headers, ORIGIN, "Origin", &self.origin)?;
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/*,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("it-IT,it;q=0.9,en;q=0.8"),
        );
        Ok(headers)
    }
}

fn insert_header(
    headers: &mut HeaderMap,
    name: HeaderName,
    label: &'static str,
    value: &str,
) -> Result<(), DownloadError> {
    let parsed = HeaderValue::from_str(value).map_err(|_| DownloadError::InvalidHeader {
        name: label,
        value: value.to_string(),
    })?;
    headers.insert(name, parsed);
    Ok(())
}

/// HTTP client with browser headers, keep-alive and a cookie store.
///
/// TLS certificates are verified against the default trust store; cookies
/// set by the gallery page (firewall tokens) are replayed to image requests.
///
/// # Example
///
/// ```no_run
/// use antenati_core::download::{ClientConfig, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(&ClientConfig::default().with_max_connections(4))?;
/// let page = client.get_text("https://antenati.cultura.gov.it/").await?;
/// println!("{} bytes of HTML", page.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidHeader`] when a configured header value
    /// is not a valid HTTP header, or [`DownloadError::ClientBuild`] when the
    /// underlying client cannot be constructed.
    #[instrument(level = "debug", skip(config), fields(max_idle = config.max_idle_per_host))]
    pub fn new(config: &ClientConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(config.default_headers()?)
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .tcp_keepalive(Duration::from_secs(60))
            .cookie_store(true)
            .gzip(true)
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        debug!("HTTP client ready");
        Ok(Self { client })
    }

    /// Fetches `url` and returns the body as text.
    ///
    /// Used for the gallery HTML page and the manifest document.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for invalid URLs, transport failures and
    /// non-2xx statuses.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &str) -> Result<String, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;
        debug!(bytes = text.len(), "fetched text document");
        Ok(text)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<TransportResponse, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!(url = %url, status, content_type = ?content_type, "response received");

        let owned_url = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| DownloadError::from_reqwest(owned_url.as_str(), e)))
            .boxed();

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
