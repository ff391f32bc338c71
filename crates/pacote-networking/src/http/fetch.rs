//! The transport contract.
//!
//! A [`Transport`] performs one HTTP exchange: it takes a fully serialized
//! [`FetchRequest`] and yields a [`FetchResponse`] whose body is read at most
//! once. The client never talks to the network itself; it only drives a
//! transport. [`ReqwestTransport`](super::ReqwestTransport) is the default;
//! tests and embedders can plug in any closure with [`transport_fn`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use url::Url;

use super::body::{BodyError, FetchPayload};
use super::request::{CacheMode, CorsMode, HttpHeaders};

/// A request in the shape a transport consumes.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    /// Destination, query included.
    pub url: Url,
    /// Upper-case HTTP method.
    pub method: http::Method,
    /// Headers to send.
    pub headers: HttpHeaders,
    /// Serialized payload, if any.
    pub body: Option<FetchPayload>,
    /// Cache mode hint.
    pub cache: Option<CacheMode>,
    /// CORS mode hint.
    pub cors: Option<CorsMode>,
}

/// Per-call transport options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// Deadline for the whole exchange.
    pub timeout: Duration,
}

/// Failures reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The remote could not be reached.
    #[error("network unreachable: {0}")]
    Unreachable(String),
    /// The transport gave up waiting.
    #[error("timed out: {0}")]
    TimedOut(String),
    /// Anything else.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wrap an arbitrary error.
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::TimedOut(error.to_string())
        } else if error.is_connect() {
            Self::Unreachable(error.to_string())
        } else {
            Self::Other(Box::new(error))
        }
    }
}

type BodyFuture = BoxFuture<'static, Result<Bytes, TransportError>>;

/// A response produced by a transport.
///
/// Status and headers are available immediately. The body is a pending read
/// consumed by exactly one of [`bytes`](Self::bytes), [`text`](Self::text) or
/// [`json`](Self::json).
pub struct FetchResponse {
    status: u16,
    headers: HttpHeaders,
    url: Option<Url>,
    body: BodyFuture,
}

impl FetchResponse {
    /// Create a response with an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            url: None,
            body: futures_util::future::ready(Ok(Bytes::new())).boxed(),
        }
    }

    /// Add a header. Names are stored lower-cased.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Add several headers.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.with_header(name, value);
        }
        self
    }

    /// Set the URL the response was served from.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Set an already available body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = futures_util::future::ready(Ok(body)).boxed();
        self
    }

    /// Set a body that is read when first consumed.
    pub fn with_body_future<F>(mut self, body: F) -> Self
    where
        F: Future<Output = Result<Bytes, TransportError>> + Send + 'static,
    {
        self.body = body.boxed();
        self
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get a header value, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Get the URL the response was served from, when the transport knows it.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Read the body as raw bytes.
    pub async fn bytes(self) -> Result<Bytes, BodyError> {
        self.body
            .await
            .map_err(|e| BodyError::Read(e.to_string()))
    }

    /// Read the body as UTF-8 text. Invalid sequences are replaced.
    pub async fn text(self) -> Result<String, BodyError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, BodyError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BodyError::Json(e.to_string()))
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Something that can perform an HTTP exchange.
pub trait Transport: Send + Sync {
    /// Perform the exchange described by `request`.
    fn fetch(
        &self,
        request: FetchRequest,
        options: FetchOptions,
    ) -> BoxFuture<'static, Result<FetchResponse, TransportError>>;
}

/// A [`Transport`] backed by a closure. See [`transport_fn`].
#[derive(Clone)]
pub struct TransportFn<F> {
    f: F,
}

/// Turn a closure into a [`Transport`].
///
/// ```ignore
/// let transport = transport_fn(|_request, _options| async {
///     Ok(FetchResponse::new(204))
/// });
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(FetchRequest, FetchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse, TransportError>> + Send + 'static,
{
    TransportFn { f }
}

impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(FetchRequest, FetchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse, TransportError>> + Send + 'static,
{
    fn fetch(
        &self,
        request: FetchRequest,
        options: FetchOptions,
    ) -> BoxFuture<'static, Result<FetchResponse, TransportError>> {
        (self.f)(request, options).boxed()
    }
}

impl<F> fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportFn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_response_readers() {
        let response = FetchResponse::new(200)
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"name":"networking"}"#);

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));

        let value: serde_json::Value = response.json().await.unwrap();
        assert_eq!(value["name"], "networking");
    }

    #[tokio::test]
    async fn test_body_future_failure_becomes_read_error() {
        let response = FetchResponse::new(200).with_body_future(async {
            Err(TransportError::Unreachable("connection reset".to_string()))
        });

        let error = response.text().await.unwrap_err();
        assert!(matches!(error, BodyError::Read(_)));
    }

    #[tokio::test]
    async fn test_closure_transport() {
        let transport = transport_fn(|request: FetchRequest, options: FetchOptions| async move {
            assert_eq!(options.timeout, Duration::from_secs(1));
            Ok(FetchResponse::new(204).with_url(request.url))
        });

        let request = FetchRequest {
            url: Url::parse("https://github.com/web-pacotes").unwrap(),
            method: http::Method::GET,
            headers: HttpHeaders::new(),
            body: None,
            cache: None,
            cors: None,
        };
        let response = transport
            .fetch(
                request,
                FetchOptions {
                    timeout: Duration::from_secs(1),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 204);
        assert_eq!(
            response.url().map(Url::as_str),
            Some("https://github.com/web-pacotes")
        );
    }
}
