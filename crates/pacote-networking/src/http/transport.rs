//! The default transport, backed by `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use reqwest::redirect::Policy;

use super::body::FetchPayload;
use super::fetch::{FetchOptions, FetchRequest, FetchResponse, Transport, TransportError};
use super::request::{CacheMode, HttpHeaders};
use crate::error::{NetworkError, Result};

/// Configuration for [`ReqwestTransport`].
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Whether to enable cookie storage.
    pub cookies_enabled: bool,
    /// Default user agent.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            follow_redirects: true,
            max_redirects: 10,
            cookies_enabled: true,
            user_agent: Some(format!("pacote-networking/{}", env!("CARGO_PKG_VERSION"))),
            proxy: None,
        }
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    config: TransportConfig,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Disable redirect following, so 3xx responses reach the caller.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Disable cookie storage.
    pub fn no_cookies(mut self) -> Self {
        self.config.cookies_enabled = false;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = reqwest::Client::builder();

        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if self.config.follow_redirects {
            builder = builder.redirect(Policy::limited(self.config.max_redirects));
        } else {
            builder = builder.redirect(Policy::none());
        }

        if self.config.cookies_enabled {
            builder = builder.cookie_store(true);
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|e| NetworkError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(ReqwestTransport {
            inner: Arc::new(ReqwestTransportInner {
                client,
                config: self.config,
            }),
        })
    }
}

struct ReqwestTransportInner {
    client: reqwest::Client,
    config: TransportConfig,
}

/// A [`Transport`] that performs requests with a shared `reqwest` client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

impl ReqwestTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self> {
        ReqwestTransportBuilder::new().build()
    }

    /// Create a builder for configuring a transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    fn prepare(&self, request: FetchRequest, options: FetchOptions) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .client
            .request(request.method, request.url)
            .timeout(options.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        match request.cache {
            Some(CacheMode::NoStore) => builder = builder.header("cache-control", "no-store"),
            Some(CacheMode::NoCache | CacheMode::Reload) => {
                builder = builder.header("cache-control", "no-cache")
            }
            Some(mode) => {
                tracing::trace!(target: "pacote_networking::transport", ?mode, "Cache mode has no effect on this transport");
            }
            None => {}
        }
        if let Some(mode) = request.cors {
            tracing::trace!(target: "pacote_networking::transport", ?mode, "CORS mode has no effect on this transport");
        }

        match request.body {
            Some(FetchPayload::Text(text)) => builder.body(text),
            Some(FetchPayload::Binary(bytes)) => builder.body(bytes),
            None => builder,
        }
    }
}

impl Transport for ReqwestTransport {
    fn fetch(
        &self,
        request: FetchRequest,
        options: FetchOptions,
    ) -> BoxFuture<'static, std::result::Result<FetchResponse, TransportError>> {
        let builder = self.prepare(request, options);

        async move {
            let response = builder.send().await.map_err(|e| {
                tracing::debug!(target: "pacote_networking::transport", "Request failed: {}", e);
                TransportError::from(e)
            })?;

            let status = response.status().as_u16();
            let url = response.url().clone();
            let headers = collect_headers(response.headers());

            Ok(FetchResponse::new(status)
                .with_headers(headers)
                .with_url(url)
                .with_body_future(async move { response.bytes().await.map_err(TransportError::from) }))
        }
        .boxed()
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Lower-case header names; repeated headers are joined with `", "`.
fn collect_headers(map: &http::HeaderMap) -> HttpHeaders {
    let mut headers = HttpHeaders::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
}
