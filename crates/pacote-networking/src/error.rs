//! Errors raised while configuring clients and transports.
//!
//! Failures of an actual call are reported as
//! [`RequestError`](crate::http::RequestError) instead.

use std::fmt;

/// Construction-time errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Invalid URL provided.
    InvalidUrl(String),
    /// Invalid header name or value.
    InvalidHeader(String),
    /// Proxy configuration error.
    Proxy(String),
    /// The underlying HTTP client could not be built.
    Transport(String),
    /// A JSON value could not be serialized.
    Json(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {msg}"),
            Self::InvalidHeader(msg) => write!(f, "Invalid header: {msg}"),
            Self::Proxy(msg) => write!(f, "Proxy error: {msg}"),
            Self::Transport(msg) => write!(f, "Transport error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
