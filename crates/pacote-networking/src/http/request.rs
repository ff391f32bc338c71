//! HTTP request model.

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use super::body::{BodyError, HttpBody};
use super::fetch::FetchRequest;
use super::media_type::MediaType;
use super::urls::{QueryParameters, append_query};

/// HTTP headers, keyed by their exact (case-sensitive) name.
pub type HttpHeaders = BTreeMap<String, String>;

const CONTENT_TYPE: &str = "content-type";

/// HTTP verbs the client issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP PATCH method.
    Patch,
    /// HTTP DELETE method.
    Delete,
}

impl HttpVerb {
    /// Convert to the wire method.
    pub fn as_method(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Patch => http::Method::PATCH,
            Self::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// How the transport should interact with an HTTP cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheMode {
    /// Use the cache normally.
    Default,
    /// Bypass the cache entirely.
    NoStore,
    /// Fetch from the network and refresh the cache.
    Reload,
    /// Revalidate cached entries before use.
    NoCache,
    /// Prefer cached entries, even stale ones.
    ForceCache,
    /// Only use cached entries.
    OnlyIfCached,
}

/// Cross-origin policy hint for the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CorsMode {
    /// Cross-origin requests follow the CORS protocol.
    Cors,
    /// Cross-origin requests are sent without CORS.
    NoCors,
    /// Only same-origin requests are allowed.
    SameOrigin,
    /// Navigation request.
    Navigate,
}

/// An immutable HTTP request.
///
/// Every field is always set; construction fills in defaults (no headers,
/// no query, [`MediaType::Binary`] and the empty body). Changing a request
/// means building a new one with [`copy_with`](Self::copy_with) or
/// [`merge`](Self::merge).
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    url: Url,
    verb: HttpVerb,
    headers: HttpHeaders,
    query: QueryParameters,
    media_type: MediaType,
    body: HttpBody,
    cache: Option<CacheMode>,
    cors: Option<CorsMode>,
}

/// Field overrides for [`HttpRequest::copy_with`]. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct RequestChanges {
    /// New URL.
    pub url: Option<Url>,
    /// New verb.
    pub verb: Option<HttpVerb>,
    /// New headers, replacing all current ones.
    pub headers: Option<HttpHeaders>,
    /// New query parameters, replacing all current ones.
    pub query: Option<QueryParameters>,
    /// New media type.
    pub media_type: Option<MediaType>,
    /// New body.
    pub body: Option<HttpBody>,
    /// New cache mode.
    pub cache: Option<CacheMode>,
    /// New CORS mode.
    pub cors: Option<CorsMode>,
}

impl HttpRequest {
    /// Create a request with default headers, query, media type and body.
    pub fn new(url: Url, verb: HttpVerb) -> Self {
        Self {
            url,
            verb,
            headers: HttpHeaders::new(),
            query: QueryParameters::new(),
            media_type: MediaType::default(),
            body: HttpBody::empty(),
            cache: None,
            cors: None,
        }
    }

    /// Create a builder for a request.
    pub fn builder(url: Url, verb: HttpVerb) -> HttpRequestBuilder {
        HttpRequestBuilder {
            request: Self::new(url, verb),
        }
    }

    /// Get the URL, without query parameters.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the verb.
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// Get the headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get a header by its exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Get the query parameters.
    pub fn query(&self) -> &QueryParameters {
        &self.query
    }

    /// Get the media type of the body.
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Get the body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Get the cache mode.
    pub fn cache(&self) -> Option<CacheMode> {
        self.cache
    }

    /// Get the CORS mode.
    pub fn cors(&self) -> Option<CorsMode> {
        self.cors
    }

    /// The URL with query parameters attached.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        append_query(&mut url, &self.query);
        url
    }

    /// Build a new request, overriding the fields set in `changes`.
    pub fn copy_with(&self, changes: RequestChanges) -> Self {
        Self {
            url: changes.url.unwrap_or_else(|| self.url.clone()),
            verb: changes.verb.unwrap_or(self.verb),
            headers: changes.headers.unwrap_or_else(|| self.headers.clone()),
            query: changes.query.unwrap_or_else(|| self.query.clone()),
            media_type: changes.media_type.unwrap_or(self.media_type),
            body: changes.body.unwrap_or_else(|| self.body.clone()),
            cache: changes.cache.or(self.cache),
            cors: changes.cors.or(self.cors),
        }
    }

    /// Combine the headers of `others` into this request.
    ///
    /// Headers are applied in order (this request, then each of `others`) and
    /// the last value written for a name wins. Nothing but headers changes.
    pub fn merge(&self, others: &[HttpRequest]) -> Self {
        if others.is_empty() {
            return self.clone();
        }

        let mut headers = self.headers.clone();
        for other in others {
            headers.extend(other.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        self.copy_with(RequestChanges {
            headers: Some(headers),
            ..Default::default()
        })
    }

    /// Serialize into a transport request, resolving the body.
    ///
    /// The empty body becomes no payload. A `content-type` header derived from
    /// the media type replaces any header of the same name, in any case.
    pub async fn to_fetch_request(&self) -> Result<FetchRequest, BodyError> {
        let body = if self.body.is_empty() {
            None
        } else {
            self.body.convert().await?
        };

        let mut headers: HttpHeaders = self
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.insert(CONTENT_TYPE.to_string(), self.media_type.as_str().to_string());

        Ok(FetchRequest {
            url: self.full_url(),
            method: self.verb.as_method(),
            headers,
            body,
            cache: self.cache,
            cors: self.cors,
        })
    }
}

/// Builder for [`HttpRequest`].
#[derive(Clone, Debug)]
pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl HttpRequestBuilder {
    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(name.into(), value.into());
        self
    }

    /// Add several headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request
            .headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.insert(name.into(), value.into());
        self
    }

    /// Add several query parameters.
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request
            .query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the media type.
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.request.media_type = media_type;
        self
    }

    /// Set the body.
    pub fn body(mut self, body: HttpBody) -> Self {
        self.request.body = body;
        self
    }

    /// Set the cache mode.
    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.request.cache = Some(cache);
        self
    }

    /// Set the CORS mode.
    pub fn cors(mut self, cors: CorsMode) -> Self {
        self.request.cors = Some(cors);
        self
    }

    /// Build the request.
    pub fn build(self) -> HttpRequest {
        self.request
    }
}
