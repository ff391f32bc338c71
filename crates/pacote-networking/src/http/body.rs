//! Lazily computed request and response bodies.
//!
//! An [`HttpBody`] wraps a deferred computation of [`Anything`]. Nothing is
//! produced until the body is read or converted for the transport, so an
//! interceptor that only inspects a request never forces its payload.
//!
//! One canonical empty body exists per process. Emptiness is a matter of
//! identity: a body whose computation yields [`Anything::Null`] is still a
//! body, and [`HttpBody::is_empty`] returns `false` for it.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, LazyLock};

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::lazy::{AsyncLazy, Lazy};

/// Any value a body can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Anything {
    /// No value.
    Null,
    /// Plain text.
    Text(String),
    /// Raw binary data.
    Binary(Bytes),
    /// A JSON document (object, array or scalar).
    Json(serde_json::Value),
}

impl Anything {
    /// Whether this is a null value (`Null` or JSON `null`).
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(serde_json::Value::Null))
    }

    /// Render the value as text. Binary data is decoded lossily.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(text) => text.clone(),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Self::Json(value) => value.to_string(),
        }
    }

    /// Render the value as bytes.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Null => Bytes::new(),
            Self::Text(text) => Bytes::from(text.clone()),
            Self::Binary(bytes) => bytes.clone(),
            Self::Json(value) => Bytes::from(value.to_string()),
        }
    }

    /// Deserialize the value as JSON into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        let parsed = match self {
            Self::Null => serde_json::from_value(serde_json::Value::Null),
            Self::Text(text) => serde_json::from_str(text),
            Self::Binary(bytes) => serde_json::from_slice(bytes),
            Self::Json(value) => serde_json::from_value(value.clone()),
        };
        parsed.map_err(|e| BodyError::Json(e.to_string()))
    }
}

impl fmt::Display for Anything {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Text(text) => f.write_str(text),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Anything {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Anything {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Bytes> for Anything {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for Anything {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

impl From<serde_json::Value> for Anything {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Errors produced while computing or decoding a body.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    /// The payload could not be read from its source.
    #[error("failed to read body: {0}")]
    Read(String),
    /// The payload is not valid JSON for the requested type.
    #[error("invalid JSON body: {0}")]
    Json(String),
    /// A value could not be serialized into a JSON body.
    #[error("failed to serialize JSON body: {0}")]
    Serialize(String),
}

/// The outcome of computing a body.
pub type BodyResult = Result<Anything, BodyError>;

/// A body in the shape a transport sends it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchPayload {
    /// A text payload (plain text or serialized JSON).
    Text(String),
    /// A binary payload.
    Binary(Bytes),
}

impl FetchPayload {
    /// The payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

enum Source {
    Sync(Lazy<BodyResult>),
    Async(AsyncLazy<BodyResult>),
}

static EMPTY: LazyLock<HttpBody> = LazyLock::new(|| HttpBody {
    source: Arc::new(Source::Async(AsyncLazy::ready(Ok(Anything::Null)))),
});

/// A request or response payload, computed lazily and at most once.
///
/// Clones share the same computation.
#[derive(Clone)]
pub struct HttpBody {
    source: Arc<Source>,
}

impl HttpBody {
    /// The canonical empty body.
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    /// A body computed by a future, the first time it is read.
    pub fn of<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        Self {
            source: Arc::new(Source::Async(AsyncLazy::new(producer))),
        }
    }

    /// A body computed synchronously, the first time it is read.
    pub fn of_sync<F>(producer: F) -> Self
    where
        F: FnOnce() -> Anything + Send + 'static,
    {
        Self::from_result(move || Ok(producer()))
    }

    /// A body holding an already known value.
    pub fn value(value: impl Into<Anything>) -> Self {
        let value = value.into();
        Self::of_sync(move || value)
    }

    /// A JSON body serialized from `value`.
    ///
    /// Serialization happens immediately; a failure is kept and reported when
    /// the body is read.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        let serialized =
            serde_json::to_value(value).map_err(|e| BodyError::Serialize(e.to_string()));
        if let Err(e) = &serialized {
            tracing::error!(target: "pacote_networking::body", "Failed to serialize JSON body: {}", e);
        }
        Self::from_result(move || serialized.map(Anything::Json))
    }

    fn from_result<F>(producer: F) -> Self
    where
        F: FnOnce() -> BodyResult + Send + 'static,
    {
        Self {
            source: Arc::new(Source::Sync(Lazy::new(producer))),
        }
    }

    /// Whether this is the canonical empty body.
    pub fn is_empty(&self) -> bool {
        Arc::ptr_eq(&self.source, &EMPTY.source)
    }

    /// Compute (or reuse) the body value.
    pub async fn get(&self) -> BodyResult {
        match self.source.as_ref() {
            Source::Sync(lazy) => lazy.get().clone(),
            Source::Async(lazy) => lazy.get().await,
        }
    }

    /// The body value if it can be obtained without awaiting.
    ///
    /// Synchronous bodies are computed on demand; asynchronous bodies are only
    /// returned once they settled.
    pub fn peek(&self) -> Option<&BodyResult> {
        match self.source.as_ref() {
            Source::Sync(lazy) => Some(lazy.get()),
            Source::Async(lazy) => lazy.peek(),
        }
    }

    /// Read the body as text.
    pub async fn text(&self) -> Result<String, BodyError> {
        self.get().await.map(|value| value.to_text())
    }

    /// Read the body as bytes.
    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        self.get().await.map(|value| value.to_bytes())
    }

    /// Read the body as JSON and deserialize it into `T`.
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        self.get().await?.deserialize()
    }

    /// Resolve the body into a transport payload.
    ///
    /// Null values become no payload, binary data passes through, JSON is
    /// serialized to a string and text is kept as is.
    pub async fn convert(&self) -> Result<Option<FetchPayload>, BodyError> {
        let payload = match self.get().await? {
            value if value.is_null() => None,
            Anything::Binary(bytes) => Some(FetchPayload::Binary(bytes)),
            Anything::Json(value) => Some(FetchPayload::Text(value.to_string())),
            Anything::Text(text) => Some(FetchPayload::Text(text)),
            Anything::Null => None,
        };
        Ok(payload)
    }
}

impl Default for HttpBody {
    fn default() -> Self {
        Self::empty()
    }
}

/// Bodies are equal when they share the same computation.
impl PartialEq for HttpBody {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

impl fmt::Debug for HttpBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self.source.as_ref() {
            Source::Sync(_) => None,
            Source::Async(lazy) => lazy.peek(),
        };
        f.debug_struct("HttpBody")
            .field("empty", &self.is_empty())
            .field("value", &value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_is_canonical() {
        assert!(HttpBody::empty().is_empty());
        assert_eq!(HttpBody::empty(), HttpBody::empty());
        assert!(HttpBody::default().is_empty());
    }

    #[test]
    fn test_null_body_is_not_empty() {
        assert!(!HttpBody::of_sync(|| Anything::Null).is_empty());
        assert!(!HttpBody::of(|| async { Ok(Anything::Null) }).is_empty());
    }

    #[tokio::test]
    async fn test_convert_resolves_producer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let body = HttpBody::of(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Anything::from("hello world!"))
        });

        let first = body.convert().await.unwrap();
        let second = body.convert().await.unwrap();

        assert_eq!(first, Some(FetchPayload::Text("hello world!".to_string())));
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_convert_null_is_no_payload() {
        let body = HttpBody::of_sync(|| Anything::Null);
        assert_eq!(body.convert().await.unwrap(), None);

        let body = HttpBody::value(serde_json::Value::Null);
        assert_eq!(body.convert().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_convert_object_and_array_serialize_to_json() {
        let object = serde_json::json!({"username": "web-pacotes", "repo": "networking"});
        let body = HttpBody::value(object.clone());
        assert_eq!(
            body.convert().await.unwrap(),
            Some(FetchPayload::Text(object.to_string()))
        );

        let array = serde_json::json!([{"username": "web-pacotes"}]);
        let body = HttpBody::value(array.clone());
        assert_eq!(
            body.convert().await.unwrap(),
            Some(FetchPayload::Text(array.to_string()))
        );
    }

    #[tokio::test]
    async fn test_convert_keeps_text_and_binary() {
        let body = HttpBody::value("https://github.com/web-pacotes");
        assert_eq!(
            body.convert().await.unwrap(),
            Some(FetchPayload::Text("https://github.com/web-pacotes".to_string()))
        );

        let data = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]);
        let body = HttpBody::value(data.clone());
        assert_eq!(body.convert().await.unwrap(), Some(FetchPayload::Binary(data)));
    }

    #[tokio::test]
    async fn test_json_body_from_serializable() {
        #[derive(Serialize)]
        struct Repo {
            owner: &'static str,
            stars: u32,
        }

        let body = HttpBody::json(&Repo {
            owner: "web-pacotes",
            stars: 7,
        });
        let value: serde_json::Value = body.read_json().await.unwrap();

        assert_eq!(value["owner"], "web-pacotes");
        assert_eq!(value["stars"], 7);
    }

    #[tokio::test]
    async fn test_failure_is_reported_on_every_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let body = HttpBody::of(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(BodyError::Read("connection reset".to_string()))
        });

        assert!(body.convert().await.is_err());
        assert!(body.text().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_peek_only_returns_settled_async_values() {
        let body = HttpBody::of(|| async { Ok(Anything::from("later")) });
        assert!(body.peek().is_none());

        body.get().await.unwrap();
        assert_eq!(body.peek(), Some(&Ok(Anything::from("later"))));

        let body = HttpBody::value("now");
        assert_eq!(body.peek(), Some(&Ok(Anything::from("now"))));
    }

    #[test]
    fn test_anything_readers() {
        let value = Anything::from("{\"id\":1}");
        assert_eq!(value.to_text(), "{\"id\":1}");
        assert_eq!(value.to_bytes(), Bytes::from_static(b"{\"id\":1}"));

        let parsed: serde_json::Value = value.deserialize().unwrap();
        assert_eq!(parsed["id"], 1);

        assert!(Anything::from("not json").deserialize::<serde_json::Value>().is_err());
    }
}
