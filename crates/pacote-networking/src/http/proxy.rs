//! Clients that route requests through a proxy API.
//!
//! A [`ProxyNetworkingClient`] rewrites each request with the `on_send`
//! callback of its [`ProxyConfiguration`], then hands it to the proxied
//! client. Two rewrites are provided: [`ProxyConfiguration::relay`] sends
//! everything to a relay endpoint that forwards the call, and
//! [`ProxyConfiguration::host_swap`] moves the request onto another host.

use std::fmt;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use url::Url;

use super::client::{HttpService, SendResult};
use super::request::{HttpRequest, RequestChanges};
use super::urls::{QueryParameters, swap_url};

/// Header carrying the original destination of a relayed request.
pub const RELAY_URL_HEADER: &str = "x-relay-url";

/// Header asking the relay to forward the request body.
pub const INCLUDE_BODY_HEADER: &str = "x-include-body";

/// Header asking the relay to skip exposing response headers.
pub const BYPASS_EXPOSE_HEADERS_HEADER: &str = "x-bypass-expose-headers";

/// Rewrites a request before it reaches the proxied client.
pub type OnSend = Arc<dyn Fn(&HttpRequest) -> HttpRequest + Send + Sync>;

/// Options for a relay proxy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayOptions {
    /// Whether the relay forwards the request body.
    pub include_body: bool,
    /// Whether the relay skips exposing response headers.
    pub bypass_expose_headers: bool,
}

/// How requests are proxied.
#[derive(Clone)]
pub struct ProxyConfiguration {
    url: Url,
    client: Arc<dyn HttpService>,
    on_send: OnSend,
}

impl ProxyConfiguration {
    /// Proxy through `url` with a custom rewrite.
    pub fn new<F>(url: Url, client: impl HttpService + 'static, on_send: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpRequest + Send + Sync + 'static,
    {
        Self {
            url,
            client: Arc::new(client),
            on_send: Arc::new(on_send),
        }
    }

    /// Proxy through a relay endpoint.
    ///
    /// Every request is sent to `url`. The original destination, query
    /// included, travels in the `x-relay-url` header, next to the
    /// `x-include-body` and `x-bypass-expose-headers` flags.
    pub fn relay(url: Url, client: impl HttpService + 'static, options: RelayOptions) -> Self {
        let relay_url = url.clone();
        Self::new(url, client, move |request| {
            let mut headers = request.headers().clone();
            headers.insert(RELAY_URL_HEADER.to_string(), request.full_url().to_string());
            headers.insert(
                INCLUDE_BODY_HEADER.to_string(),
                options.include_body.to_string(),
            );
            headers.insert(
                BYPASS_EXPOSE_HEADERS_HEADER.to_string(),
                options.bypass_expose_headers.to_string(),
            );

            request.copy_with(RequestChanges {
                url: Some(relay_url.clone()),
                headers: Some(headers),
                query: Some(QueryParameters::new()),
                ..Default::default()
            })
        })
    }

    /// Proxy by moving each request onto `url`'s scheme, host and path.
    ///
    /// `https://github.com/abc` proxied through `https://google.com/def`
    /// becomes `https://google.com/def/abc`.
    pub fn host_swap(url: Url, client: impl HttpService + 'static) -> Self {
        let host = url.clone();
        Self::new(url, client, move |request| {
            request.copy_with(RequestChanges {
                url: Some(swap_url(request.url(), &host)),
                ..Default::default()
            })
        })
    }

    /// The proxy URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The proxied client.
    pub fn client(&self) -> &Arc<dyn HttpService> {
        &self.client
    }

    /// Apply the rewrite to a request.
    pub fn rewrite(&self, request: &HttpRequest) -> HttpRequest {
        (self.on_send)(request)
    }
}

impl fmt::Debug for ProxyConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfiguration")
            .field("url", &self.url.as_str())
            .field("client", &self.client.base_url().as_str())
            .finish_non_exhaustive()
    }
}

/// A client that rewrites requests and sends them with another client.
///
/// Endpoints are resolved against the proxied client's base URL, so the
/// rewrite sees the real destination.
#[derive(Clone, Debug)]
pub struct ProxyNetworkingClient {
    configuration: ProxyConfiguration,
}

impl ProxyNetworkingClient {
    /// Create a proxy client.
    pub fn new(configuration: ProxyConfiguration) -> Self {
        Self { configuration }
    }

    /// Get the proxy configuration.
    pub fn configuration(&self) -> &ProxyConfiguration {
        &self.configuration
    }

    /// Rewrite `request` and send it with the proxied client.
    pub async fn send(&self, request: HttpRequest) -> SendResult {
        let proxied = self.configuration.rewrite(&request);
        tracing::debug!(
            target: "pacote_networking::proxy",
            from = %request.full_url(),
            to = %proxied.full_url(),
            "Proxying request"
        );
        self.configuration.client.send_request(proxied).await
    }
}

impl HttpService for ProxyNetworkingClient {
    fn base_url(&self) -> &Url {
        self.configuration.client.base_url()
    }

    fn send_request(&self, request: HttpRequest) -> BoxFuture<'_, SendResult> {
        self.send(request).boxed()
    }
}
