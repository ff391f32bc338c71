//! Interceptors.
//!
//! An [`Interceptor`] observes the three moments of a call: before the request
//! is sent, after a response arrives and after a request fails. Every hook has
//! an identity default, so an interceptor only overrides what it cares about.
//!
//! The client runs every `on_request` hook against the *original* request,
//! then merges the headers of all results. Hooks are not chained: one
//! interceptor never sees another's output. `on_response` and `on_error` are
//! notifications; their return values are not fed back into the result.
//!
//! Hooks are infallible. A hook that panics aborts the call.

use std::fmt;
use std::sync::Arc;

use base64::Engine;

use super::errors::RequestError;
use super::request::{HttpRequest, RequestChanges};
use super::response::HttpResponse;

/// Hooks around a client call.
pub trait Interceptor: Send + Sync {
    /// Transform a request before it is sent.
    fn on_request(&self, request: &HttpRequest) -> HttpRequest {
        request.clone()
    }

    /// Observe a response before it is returned.
    fn on_response(&self, response: &HttpResponse) -> HttpResponse {
        response.clone()
    }

    /// Observe a failure before it is returned.
    fn on_error(&self, error: &RequestError) -> RequestError {
        error.clone()
    }
}

/// Type alias for request hooks.
pub type RequestHook = Arc<dyn Fn(&HttpRequest) -> HttpRequest + Send + Sync>;

/// Type alias for response hooks.
pub type ResponseHook = Arc<dyn Fn(&HttpResponse) -> HttpResponse + Send + Sync>;

/// Type alias for error hooks.
pub type ErrorHook = Arc<dyn Fn(&RequestError) -> RequestError + Send + Sync>;

/// An interceptor that only transforms requests.
///
/// ```ignore
/// let tracing = RequestInterceptor::new(|request| {
///     request.copy_with(RequestChanges {
///         headers: Some(with_request_id(request.headers())),
///         ..Default::default()
///     })
/// });
/// ```
#[derive(Clone)]
pub struct RequestInterceptor {
    hook: RequestHook,
}

impl RequestInterceptor {
    /// Wrap a request hook.
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpRequest + Send + Sync + 'static,
    {
        Self {
            hook: Arc::new(hook),
        }
    }
}

impl Interceptor for RequestInterceptor {
    fn on_request(&self, request: &HttpRequest) -> HttpRequest {
        (self.hook)(request)
    }
}

/// An interceptor that only observes responses.
#[derive(Clone)]
pub struct ResponseInterceptor {
    hook: ResponseHook,
}

impl ResponseInterceptor {
    /// Wrap a response hook.
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&HttpResponse) -> HttpResponse + Send + Sync + 'static,
    {
        Self {
            hook: Arc::new(hook),
        }
    }
}

impl Interceptor for ResponseInterceptor {
    fn on_response(&self, response: &HttpResponse) -> HttpResponse {
        (self.hook)(response)
    }
}

/// An interceptor that only observes failures.
#[derive(Clone)]
pub struct ErrorInterceptor {
    hook: ErrorHook,
}

impl ErrorInterceptor {
    /// Wrap an error hook.
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&RequestError) -> RequestError + Send + Sync + 'static,
    {
        Self {
            hook: Arc::new(hook),
        }
    }
}

impl Interceptor for ErrorInterceptor {
    fn on_error(&self, error: &RequestError) -> RequestError {
        (self.hook)(error)
    }
}

macro_rules! opaque_debug {
    ($($name:ident),*) => {
        $(
            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($name)).finish_non_exhaustive()
                }
            }
        )*
    };
}

opaque_debug!(RequestInterceptor, ResponseInterceptor, ErrorInterceptor);

/// Sets an authorization header on every request.
///
/// The header value is `"{scheme} {parameters}"`. Only the configured header
/// is overwritten; every other header is left alone.
///
/// # Example
///
/// ```ignore
/// let client = NetworkingClient::builder("https://api.github.com")
///     .interceptor(AuthorizationInterceptor::new(token))
///     .build()?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationInterceptor {
    header: String,
    scheme: String,
    parameters: String,
}

impl AuthorizationInterceptor {
    /// Bearer authorization in the `Authorization` header.
    pub fn new(parameters: impl Into<String>) -> Self {
        Self {
            header: "Authorization".to_string(),
            scheme: "Bearer".to_string(),
            parameters: parameters.into(),
        }
    }

    /// HTTP Basic authorization.
    pub fn basic(username: &str, password: Option<&str>) -> Self {
        let credentials = format!("{}:{}", username, password.unwrap_or_default());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        Self::new(encoded).scheme("Basic")
    }

    /// Use a different header name.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Use a different scheme.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// The header value this interceptor writes.
    pub fn value(&self) -> String {
        format!("{} {}", self.scheme, self.parameters)
    }
}

impl Interceptor for AuthorizationInterceptor {
    fn on_request(&self, request: &HttpRequest) -> HttpRequest {
        let mut headers = request.headers().clone();
        headers.insert(self.header.clone(), self.value());

        request.copy_with(RequestChanges {
            headers: Some(headers),
            ..Default::default()
        })
    }
}
