//! Errors a request can end with.
//!
//! [`RequestError`] is what [`send`](super::NetworkingClient::send) returns for
//! failures: the network was unreachable, the deadline elapsed, or something
//! else went wrong. HTTP error statuses are *not* failures of `send`; they are
//! returned as responses and escalated on demand with
//! [`HttpResponse::to_http_error`](super::HttpResponse::to_http_error).

/// A response with a 4xx or 5xx status, escalated to an error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{cause}")]
pub struct HttpError {
    /// The HTTP status code.
    pub status_code: u16,
    /// Human-readable cause.
    pub cause: String,
}

impl HttpError {
    /// Create an error for a status code, with the default cause.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            cause: format!("status code: {status_code}"),
        }
    }

    /// Replace the default cause.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = cause.into();
        self
    }
}

/// Why a request did not produce a response.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The network could not be reached.
    #[error("{cause}")]
    NoConnectivity {
        /// Human-readable cause.
        cause: String,
    },
    /// The transport did not settle before the deadline.
    #[error("timeout (ms): {timeout_ms}\n{cause}")]
    Timeout {
        /// Human-readable cause.
        cause: String,
        /// The deadline that elapsed, in milliseconds.
        timeout_ms: u64,
    },
    /// Any other failure.
    #[error("{cause}")]
    Unknown {
        /// Human-readable cause.
        cause: String,
    },
    /// An HTTP error status escalated by the caller.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl RequestError {
    /// A connectivity failure with the default cause.
    pub fn no_connectivity() -> Self {
        Self::NoConnectivity {
            cause: "no internet connection available".to_string(),
        }
    }

    /// A timeout with the default cause.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout {
            cause: "request timed out".to_string(),
            timeout_ms,
        }
    }

    /// An unknown failure with the given cause.
    pub fn unknown(cause: impl Into<String>) -> Self {
        Self::Unknown {
            cause: cause.into(),
        }
    }

    /// The human-readable cause.
    pub fn cause(&self) -> &str {
        match self {
            Self::NoConnectivity { cause }
            | Self::Timeout { cause, .. }
            | Self::Unknown { cause } => cause,
            Self::Http(error) => &error.cause,
        }
    }

    /// Check if this is a connectivity failure.
    pub fn is_no_connectivity(&self) -> bool {
        matches!(self, Self::NoConnectivity { .. })
    }

    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl Default for RequestError {
    fn default() -> Self {
        Self::unknown("something really weird just happened")
    }
}
