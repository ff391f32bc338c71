//! HTTP requests, responses and the clients that send them.
//!
//! # Example
//!
//! ```ignore
//! use pacote_networking::http::{AuthorizationInterceptor, HttpService, NetworkingClient};
//!
//! let client = NetworkingClient::builder("https://api.github.com")
//!     .interceptor(AuthorizationInterceptor::new(token))
//!     .timeout_ms(5_000)
//!     .build()?;
//!
//! let response = client
//!     .get("repos/web-pacotes/networking")
//!     .query("per_page", "10")
//!     .send()
//!     .await?;
//!
//! if let Some(error) = response.to_http_error() {
//!     return Err(error.into());
//! }
//! let repo: Repo = response.body().read_json().await?;
//! ```

mod body;
mod client;
mod errors;
mod fetch;
mod interceptor;
mod media_type;
mod presets;
mod proxy;
mod request;
mod response;
mod transport;
mod urls;

pub use body::{Anything, BodyError, BodyResult, FetchPayload, HttpBody};
pub use client::{
    BodyState, DEFAULT_TIMEOUT, HttpService, NetworkingClient, NetworkingClientBuilder, NoBody,
    RequestBuilder, SendResult, WithBody,
};
pub use errors::{HttpError, RequestError};
pub use fetch::{
    FetchOptions, FetchRequest, FetchResponse, Transport, TransportError, TransportFn,
    transport_fn,
};
pub use interceptor::{
    AuthorizationInterceptor, ErrorHook, ErrorInterceptor, Interceptor, RequestHook,
    RequestInterceptor, ResponseHook, ResponseInterceptor,
};
pub use media_type::{MediaType, try_parse_content_type};
pub use presets::{GitHubRepository, ImgurApiVersion, imgur_client, raw_github_client};
pub use proxy::{
    BYPASS_EXPOSE_HEADERS_HEADER, INCLUDE_BODY_HEADER, OnSend, ProxyConfiguration,
    ProxyNetworkingClient, RELAY_URL_HEADER, RelayOptions,
};
pub use request::{
    CacheMode, CorsMode, HttpHeaders, HttpRequest, HttpRequestBuilder, HttpVerb, RequestChanges,
};
pub use response::{BodyKind, HttpResponse, ResponseClass, classify};
pub use transport::{ReqwestTransport, ReqwestTransportBuilder, TransportConfig};
pub use urls::{QueryParameters, resolve_url, swap_url};
