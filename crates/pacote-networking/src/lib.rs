//! Typed HTTP networking over a pluggable transport.
//!
//! This crate wraps a fetch-like [`Transport`](http::Transport) with:
//!
//! - **Typed requests**: immutable [`HttpRequest`] values with lazily
//!   computed bodies
//! - **Classified responses**: every [`HttpResponse`] is sorted into a status
//!   band (informational, successful, redirection, client error, server error)
//!   with a body extracted according to its media type
//! - **Interceptors**: request, response and error hooks, including
//!   authorization header injection
//! - **Proxy clients**: relay and host-swap rewrites in front of any client
//!
//! # Sending requests
//!
//! ```ignore
//! use pacote_networking::http::{HttpService, NetworkingClient};
//!
//! let client = NetworkingClient::new("https://api.github.com")?;
//!
//! let response = client.get("repos/web-pacotes/networking").send().await?;
//! println!("{}", response.describe().await);
//! ```
//!
//! `send` resolves to `Result<HttpResponse, RequestError>`. A 404 is still a
//! response; escalate it with
//! [`to_http_error`](HttpResponse::to_http_error) when it should be an error.
//! [`RequestError`] is reserved for calls that produced no response at all:
//! no connectivity, a timeout, or an unexpected failure.
//!
//! # Bodies
//!
//! ```ignore
//! // JSON body (media type defaults to application/json)
//! client.post("gists").json(&new_gist).send().await?;
//!
//! // Text body
//! client.put("notes/1").text("hello").send().await?;
//!
//! // Reading a response body
//! let repo: Repo = response.body().read_json().await?;
//! ```
//!
//! # Configuration
//!
//! ```ignore
//! let client = NetworkingClient::builder("https://api.github.com")
//!     .timeout_ms(5_000)
//!     .default_header("accept", "application/vnd.github+json")?
//!     .interceptor(AuthorizationInterceptor::new(token))
//!     .transport(ReqwestTransport::builder().no_redirects().build()?)
//!     .build()?;
//! ```
//!
//! # Proxies
//!
//! ```ignore
//! let relay = ProxyNetworkingClient::new(ProxyConfiguration::relay(
//!     Url::parse("https://relay.example.com")?,
//!     client,
//!     RelayOptions::default(),
//! ));
//! relay.get("users/octocat").send().await?;
//! ```

mod error;
pub mod http;
pub mod lazy;

pub use error::{NetworkError, Result};

// Re-export commonly used types at the crate root
pub use http::{
    AuthorizationInterceptor, HttpBody, HttpError, HttpRequest, HttpResponse, HttpService,
    Interceptor, MediaType, NetworkingClient, NetworkingClientBuilder, ProxyConfiguration,
    ProxyNetworkingClient, RequestError, ReqwestTransport, SendResult, Transport,
};
pub use lazy::{AsyncLazy, Lazy};
