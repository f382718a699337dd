//! Errors raised by authenticated service calls.

use thiserror::Error;

/// Errors raised by requests made through a [`super::ServiceClient`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the API answers `404 Not Found`.
    #[error("resource not found at {url}")]
    NotFound {
        /// URL that was requested.
        url: String,
    },
    /// Raised when the API answers with any other non-success status.
    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        /// URL that was requested.
        url: String,
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body, decoded lossily.
        body: String,
    },
    /// Raised when the request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// URL that was requested.
        url: String,
        /// Decoder error message.
        message: String,
    },
    /// Raised when a path segment, usually a resource identifier, cannot
    /// address a single resource.
    #[error("'{segment}' is not a usable resource path segment")]
    InvalidSegment {
        /// Rejected segment.
        segment: String,
    },
    /// Raised when the service endpoint is not a base URL.
    #[error("invalid service endpoint {url}: {message}")]
    InvalidEndpoint {
        /// Configured endpoint.
        url: String,
        /// Parser error message.
        message: String,
    },
}

impl ApiError {
    /// Returns `true` when the remote resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
