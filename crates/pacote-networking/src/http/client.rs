//! The networking client and its send pipeline.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;
use url::Url;

use super::body::{Anything, HttpBody};
use super::errors::RequestError;
use super::fetch::{FetchOptions, Transport, TransportError};
use super::interceptor::Interceptor;
use super::media_type::MediaType;
use super::request::{CacheMode, CorsMode, HttpHeaders, HttpRequest, HttpVerb, RequestChanges};
use super::response::HttpResponse;
use super::transport::ReqwestTransport;
use super::urls::{QueryParameters, resolve_url};
use crate::error::{NetworkError, Result};

/// The outcome of a call: a classified response, or why there is none.
///
/// Error statuses (4xx, 5xx) are responses, not errors.
pub type SendResult = std::result::Result<HttpResponse, RequestError>;

/// Default deadline for a call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Something that sends [`HttpRequest`]s relative to a base URL.
///
/// Implemented by [`NetworkingClient`] and
/// [`ProxyNetworkingClient`](super::ProxyNetworkingClient), so callers can
/// hold either behind `Arc<dyn HttpService>`.
pub trait HttpService: Send + Sync {
    /// The URL endpoints are resolved against.
    fn base_url(&self) -> &Url;

    /// Send a request.
    fn send_request(&self, request: HttpRequest) -> BoxFuture<'_, SendResult>;

    /// Start a GET request to `endpoint`.
    fn get(&self, endpoint: &str) -> RequestBuilder<'_, NoBody>
    where
        Self: Sized,
    {
        RequestBuilder::new(self, HttpVerb::Get, endpoint)
    }

    /// Start a POST request to `endpoint`.
    fn post(&self, endpoint: &str) -> RequestBuilder<'_, WithBody>
    where
        Self: Sized,
    {
        RequestBuilder::new(self, HttpVerb::Post, endpoint)
    }

    /// Start a PUT request to `endpoint`.
    fn put(&self, endpoint: &str) -> RequestBuilder<'_, WithBody>
    where
        Self: Sized,
    {
        RequestBuilder::new(self, HttpVerb::Put, endpoint)
    }

    /// Start a PATCH request to `endpoint`.
    fn patch(&self, endpoint: &str) -> RequestBuilder<'_, WithBody>
    where
        Self: Sized,
    {
        RequestBuilder::new(self, HttpVerb::Patch, endpoint)
    }

    /// Start a DELETE request to `endpoint`.
    fn delete(&self, endpoint: &str) -> RequestBuilder<'_, NoBody>
    where
        Self: Sized,
    {
        RequestBuilder::new(self, HttpVerb::Delete, endpoint)
    }
}

impl<T: HttpService + ?Sized> HttpService for Arc<T> {
    fn base_url(&self) -> &Url {
        (**self).base_url()
    }

    fn send_request(&self, request: HttpRequest) -> BoxFuture<'_, SendResult> {
        (**self).send_request(request)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Whether a verb carries a body. Implemented by [`NoBody`] and [`WithBody`].
pub trait BodyState: sealed::Sealed {
    /// Media type used when none is set.
    const DEFAULT_MEDIA_TYPE: MediaType;
}

/// Marker for verbs without a body (GET, DELETE).
#[derive(Debug)]
pub enum NoBody {}

/// Marker for verbs with a body (POST, PUT, PATCH).
#[derive(Debug)]
pub enum WithBody {}

impl sealed::Sealed for NoBody {}
impl sealed::Sealed for WithBody {}

impl BodyState for NoBody {
    const DEFAULT_MEDIA_TYPE: MediaType = MediaType::Binary;
}

impl BodyState for WithBody {
    const DEFAULT_MEDIA_TYPE: MediaType = MediaType::Json;
}

/// Builder for a single call, created by the verb methods of [`HttpService`].
///
/// Body methods only exist on `RequestBuilder<WithBody>`, so a GET or DELETE
/// cannot carry a body.
///
/// # Example
///
/// ```ignore
/// let response = client
///     .post("repos")
///     .header("accept", "application/vnd.github+json")
///     .json(&serde_json::json!({"name": "networking"}))
///     .send()
///     .await?;
/// ```
#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder<'a, B: BodyState> {
    service: &'a dyn HttpService,
    verb: HttpVerb,
    endpoint: String,
    headers: HttpHeaders,
    query: QueryParameters,
    media_type: Option<MediaType>,
    body: HttpBody,
    cache: Option<CacheMode>,
    cors: Option<CorsMode>,
    _state: PhantomData<B>,
}

impl<'a, B: BodyState> RequestBuilder<'a, B> {
    fn new(service: &'a dyn HttpService, verb: HttpVerb, endpoint: &str) -> Self {
        Self {
            service,
            verb,
            endpoint: endpoint.to_string(),
            headers: HttpHeaders::new(),
            query: QueryParameters::new(),
            media_type: None,
            body: HttpBody::empty(),
            cache: None,
            cors: None,
            _state: PhantomData,
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add several headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add several query parameters.
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the cache mode.
    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the CORS mode.
    pub fn cors(mut self, cors: CorsMode) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Resolve the endpoint and build the request without sending it.
    pub fn build(self) -> Result<HttpRequest> {
        let url = resolve_url(self.service.base_url(), &self.endpoint, &QueryParameters::new())?;

        let mut builder = HttpRequest::builder(url, self.verb)
            .headers(self.headers)
            .query_pairs(self.query)
            .media_type(self.media_type.unwrap_or(B::DEFAULT_MEDIA_TYPE))
            .body(self.body);
        if let Some(cache) = self.cache {
            builder = builder.cache(cache);
        }
        if let Some(cors) = self.cors {
            builder = builder.cors(cors);
        }
        Ok(builder.build())
    }

    /// Build and send the request.
    ///
    /// An endpoint that does not resolve to a URL fails with
    /// [`RequestError::Unknown`].
    pub async fn send(self) -> SendResult {
        let service = self.service;
        let endpoint = self.endpoint.clone();
        let request = self.build().map_err(|e| {
            tracing::error!(target: "pacote_networking::client", "Invalid endpoint {:?}: {}", endpoint, e);
            RequestError::unknown(e.to_string())
        })?;
        service.send_request(request).await
    }
}

impl RequestBuilder<'_, WithBody> {
    /// Set the body.
    pub fn body(mut self, body: HttpBody) -> Self {
        self.body = body;
        self
    }

    /// Set a JSON body serialized from `value`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.body = HttpBody::json(value);
        self
    }

    /// Set a text body. Uses `text/plain` unless a media type is set.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = HttpBody::value(Anything::Text(text.into()));
        self.media_type.get_or_insert(MediaType::PlainText);
        self
    }

    /// Set a binary body. Uses `application/octet-stream` unless a media type is set.
    pub fn bytes(mut self, bytes: impl Into<bytes::Bytes>) -> Self {
        self.body = HttpBody::value(Anything::Binary(bytes.into()));
        self.media_type.get_or_insert(MediaType::Binary);
        self
    }

    /// Set the media type of the body.
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }
}

impl<B: BodyState> fmt::Debug for RequestBuilder<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("verb", &self.verb)
            .field("endpoint", &self.endpoint)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`NetworkingClient`].
pub struct NetworkingClientBuilder {
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
    timeout: Duration,
    interceptors: Vec<Arc<dyn Interceptor>>,
    default_headers: HttpHeaders,
    eager_bodies: bool,
}

impl NetworkingClientBuilder {
    /// Create a builder for a client rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: None,
            timeout: DEFAULT_TIMEOUT,
            interceptors: Vec::new(),
            default_headers: HttpHeaders::new(),
            eager_bodies: false,
        }
    }

    /// Use a custom transport. Defaults to [`ReqwestTransport`].
    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    /// Use a transport shared with other clients.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the deadline for each call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the deadline for each call, in milliseconds.
    pub fn timeout_ms(self, timeout_ms: u64) -> Self {
        self.timeout(Duration::from_millis(timeout_ms))
    }

    /// Add an interceptor. Interceptors run in insertion order.
    pub fn interceptor(self, interceptor: impl Interceptor + 'static) -> Self {
        self.shared_interceptor(Arc::new(interceptor))
    }

    /// Add an interceptor shared with other clients.
    pub fn shared_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Add a header sent with every request, unless the request sets it.
    pub fn default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        http::HeaderName::from_bytes(name.as_bytes())?;
        http::HeaderValue::from_str(&value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Read response bodies before `send` returns.
    ///
    /// By default bodies are read when first accessed.
    pub fn eager_bodies(mut self, eager: bool) -> Self {
        self.eager_bodies = eager;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<NetworkingClient> {
        let base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                self.base_url
            )));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(NetworkingClient {
            inner: Arc::new(NetworkingClientInner {
                base_url,
                transport,
                timeout: self.timeout,
                interceptors: self.interceptors,
                default_headers: self.default_headers,
                eager_bodies: self.eager_bodies,
            }),
        })
    }
}

impl fmt::Debug for NetworkingClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkingClientBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("interceptors", &self.interceptors.len())
            .field("default_headers", &self.default_headers)
            .field("eager_bodies", &self.eager_bodies)
            .finish_non_exhaustive()
    }
}

struct NetworkingClientInner {
    base_url: Url,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    interceptors: Vec<Arc<dyn Interceptor>>,
    default_headers: HttpHeaders,
    eager_bodies: bool,
}

/// A client that sends requests relative to a base URL through a transport.
///
/// The client is cheaply cloneable and thread-safe. Clones share the same
/// transport, interceptors and configuration.
///
/// # Example
///
/// ```ignore
/// use pacote_networking::http::{HttpService, NetworkingClient};
///
/// let client = NetworkingClient::new("https://api.github.com")?;
///
/// match client.get("repos/web-pacotes/networking").send().await {
///     Ok(response) if response.ok() => println!("{}", response.describe().await),
///     Ok(response) => println!("failed with {}", response.status_code()),
///     Err(error) => println!("no response: {error}"),
/// }
/// ```
#[derive(Clone)]
pub struct NetworkingClient {
    inner: Arc<NetworkingClientInner>,
}

impl NetworkingClient {
    /// Create a client with the default transport and timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        NetworkingClientBuilder::new(base_url).build()
    }

    /// Create a builder for configuring a client.
    pub fn builder(base_url: impl Into<String>) -> NetworkingClientBuilder {
        NetworkingClientBuilder::new(base_url)
    }

    /// Get the deadline for each call.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Get the number of interceptors.
    pub fn interceptor_count(&self) -> usize {
        self.inner.interceptors.len()
    }

    /// Get the headers added to every request.
    pub fn default_headers(&self) -> &HttpHeaders {
        &self.inner.default_headers
    }

    /// Send a request.
    ///
    /// Every interceptor's `on_request` sees the request as given here; their
    /// headers are merged onto it in interceptor order. The transport then
    /// runs under the client's deadline. Whatever the outcome, every
    /// interceptor is notified with `on_response` or `on_error`.
    ///
    /// Transport failures never panic; they come back as [`RequestError`].
    pub async fn send(&self, request: HttpRequest) -> SendResult {
        let request = self.with_default_headers(request);

        let candidates: Vec<HttpRequest> = self
            .inner
            .interceptors
            .iter()
            .map(|interceptor| interceptor.on_request(&request))
            .collect();
        let request = request.merge(&candidates);

        let result = self.perform(&request).await;

        match &result {
            Ok(response) => {
                for interceptor in &self.inner.interceptors {
                    interceptor.on_response(response);
                }
            }
            Err(error) => {
                tracing::warn!(
                    target: "pacote_networking::client",
                    verb = %request.verb(),
                    url = %request.url(),
                    "Request failed: {}",
                    error
                );
                for interceptor in &self.inner.interceptors {
                    interceptor.on_error(error);
                }
            }
        }

        result
    }

    fn with_default_headers(&self, request: HttpRequest) -> HttpRequest {
        if self.inner.default_headers.is_empty() {
            return request;
        }

        let mut headers = self.inner.default_headers.clone();
        headers.extend(
            request
                .headers()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        request.copy_with(RequestChanges {
            headers: Some(headers),
            ..Default::default()
        })
    }

    async fn perform(&self, request: &HttpRequest) -> SendResult {
        let fetch_request = request.to_fetch_request().await.map_err(|e| {
            tracing::error!(target: "pacote_networking::client", "Failed to prepare request body: {}", e);
            RequestError::unknown(e.to_string())
        })?;

        let timeout = self.inner.timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(
            target: "pacote_networking::client",
            method = %fetch_request.method,
            url = %fetch_request.url,
            "Sending request"
        );

        let pending = self
            .inner
            .transport
            .fetch(fetch_request, FetchOptions { timeout });
        let fetch_response = match tokio::time::timeout(timeout, pending).await {
            Err(_) => return Err(RequestError::timeout(timeout_ms)),
            Ok(Err(e)) => return Err(classify_failure(e, timeout_ms)),
            Ok(Ok(response)) => response,
        };

        let response = HttpResponse::from_fetch_response(fetch_response);
        tracing::debug!(
            target: "pacote_networking::client",
            status = response.status_code(),
            class = response.class().name(),
            "Received response"
        );

        if self.inner.eager_bodies {
            if let Err(e) = response.body().get().await {
                tracing::warn!(target: "pacote_networking::client", "Failed to read response body: {}", e);
            }
        }

        Ok(response)
    }
}

fn classify_failure(error: TransportError, timeout_ms: u64) -> RequestError {
    match error {
        TransportError::Unreachable(reason) => {
            tracing::debug!(target: "pacote_networking::client", "Network unreachable: {}", reason);
            RequestError::no_connectivity()
        }
        TransportError::TimedOut(reason) => RequestError::Timeout {
            cause: reason,
            timeout_ms,
        },
        TransportError::Other(e) => RequestError::unknown(e.to_string()),
    }
}

impl HttpService for NetworkingClient {
    fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn send_request(&self, request: HttpRequest) -> BoxFuture<'_, SendResult> {
        self.send(request).boxed()
    }
}

impl fmt::Debug for NetworkingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkingClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("interceptors", &self.inner.interceptors.len())
            .field("default_headers", &self.inner.default_headers)
            .field("eager_bodies", &self.inner.eager_bodies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fetch::{FetchResponse, transport_fn};

    fn stub_client(base_url: &str) -> NetworkingClient {
        NetworkingClient::builder(base_url)
            .transport(transport_fn(|_, _| async { Ok(FetchResponse::new(204)) }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = stub_client("https://api.github.com");
        assert_eq!(client.timeout(), Duration::from_millis(30_000));
        assert_eq!(client.interceptor_count(), 0);
        assert!(client.default_headers().is_empty());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = NetworkingClient::builder("not a url")
            .transport(transport_fn(|_, _| async { Ok(FetchResponse::new(204)) }))
            .build();
        assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));

        let result = NetworkingClient::builder("mailto:someone@example.com")
            .transport(transport_fn(|_, _| async { Ok(FetchResponse::new(204)) }))
            .build();
        assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_default_header() {
        let result = NetworkingClient::builder("https://api.github.com").default_header("bad header", "x");
        assert!(matches!(result, Err(NetworkError::InvalidHeader(_))));
    }

    #[test]
    fn test_get_builder_resolves_endpoint() {
        let client = stub_client("https://api.github.com/");
        let request = client
            .get("repos/web-pacotes")
            .query("per_page", "10")
            .cache(CacheMode::NoStore)
            .build()
            .unwrap();

        assert_eq!(request.verb(), HttpVerb::Get);
        assert_eq!(request.url().as_str(), "https://api.github.com/repos/web-pacotes");
        assert_eq!(
            request.full_url().as_str(),
            "https://api.github.com/repos/web-pacotes?per_page=10"
        );
        assert_eq!(request.media_type(), MediaType::Binary);
        assert!(request.body().is_empty());
        assert_eq!(request.cache(), Some(CacheMode::NoStore));
    }

    #[test]
    fn test_body_verbs_default_to_json() {
        let client = stub_client("https://api.github.com");

        let post = client.post("repos").build().unwrap();
        let put = client.put("repos").build().unwrap();
        let patch = client.patch("repos").build().unwrap();
        let delete = client.delete("repos").build().unwrap();

        assert_eq!(post.media_type(), MediaType::Json);
        assert_eq!(put.media_type(), MediaType::Json);
        assert_eq!(patch.media_type(), MediaType::Json);
        assert_eq!(delete.media_type(), MediaType::Binary);
    }

    #[test]
    fn test_text_body_uses_plain_text_unless_set() {
        let client = stub_client("https://api.github.com");

        let request = client.post("notes").text("hello").build().unwrap();
        assert_eq!(request.media_type(), MediaType::PlainText);

        let request = client
            .post("notes")
            .media_type(MediaType::Html)
            .text("<p>hello</p>")
            .build()
            .unwrap();
        assert_eq!(request.media_type(), MediaType::Html);
    }

    #[tokio::test]
    async fn test_default_headers_yield_to_request_headers() {
        let client = NetworkingClient::builder("https://api.github.com")
            .default_header("accept", "application/json")
            .unwrap()
            .default_header("user-agent", "pacote")
            .unwrap()
            .transport(transport_fn(|request: crate::http::FetchRequest, _| async move {
                assert_eq!(request.headers.get("accept").map(String::as_str), Some("text/html"));
                assert_eq!(request.headers.get("user-agent").map(String::as_str), Some("pacote"));
                Ok(FetchResponse::new(204))
            }))
            .build()
            .unwrap();

        let response = client.get("").header("accept", "text/html").send().await.unwrap();
        assert_eq!(response.status_code(), 204);
    }

    #[test]
    fn test_transport_failure_classification() {
        assert!(classify_failure(TransportError::Unreachable("dns".into()), 10).is_no_connectivity());
        assert_eq!(
            classify_failure(TransportError::TimedOut("slow".into()), 10),
            RequestError::Timeout {
                cause: "slow".to_string(),
                timeout_ms: 10
            }
        );
        assert_eq!(
            classify_failure(TransportError::other("boom"), 10),
            RequestError::unknown("boom")
        );
    }
}
