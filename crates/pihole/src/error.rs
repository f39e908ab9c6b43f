//! Error types for the Pi-hole client.

use thiserror::Error;

pub(crate) type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when creating a [`Client`](crate::Client) or fetching statistics.
///
/// `Config` and `Compatibility` errors can only be returned from [`Client::new()`](crate::Client::new())
/// and should be treated as fatal. `Network` and `Decode` errors can occur on each fetch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The endpoint is not a valid plain HTTP URL.
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    Config {
        /// Endpoint as supplied by the caller.
        endpoint: String,
        /// Human-readable reason.
        reason: String,
    },
    /// The appliance reports an API version this client doesn't understand.
    #[error("unsupported Pi-hole API version {version}, expected {expected}")]
    Compatibility {
        /// Version reported by the appliance.
        version: i64,
        /// The only supported version.
        expected: i64,
    },
    /// The request could not be sent or its response could not be received.
    #[error("request to `{uri}` failed: {source}")]
    Network {
        /// Requested URI.
        uri: String,
        /// Underlying transport error.
        #[source]
        source: BoxedError,
    },
    /// The response body could not be decoded.
    #[error("failed decoding response from `{uri}`: {source}")]
    Decode {
        /// Requested URI.
        uri: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn config(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::Config {
            endpoint: endpoint.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn network(uri: &hyper::Uri, source: impl Into<BoxedError>) -> Self {
        Self::Network {
            uri: uri.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn decode(uri: &hyper::Uri, source: serde_json::Error) -> Self {
        Self::Decode {
            uri: uri.to_string(),
            source,
        }
    }

    /// Checks whether this error can only occur during client construction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Compatibility { .. })
    }
}
