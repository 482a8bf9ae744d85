//! Error types shared by question provider implementations.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`ProviderError`] failures.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures that can occur while asking a provider for questions.
///
/// None of these reach the round: the acquisition pipeline substitutes the
/// fallback set whenever one is returned.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key is configured.
    #[error("missing provider credentials (`{var}` is not set)")]
    MissingCredentials {
        /// Environment variable that should hold the key.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build provider client")]
    ClientBuilder {
        /// Underlying builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or the connection dropped.
    #[error("failed to reach provider at `{url}`")]
    Transport {
        /// Endpoint that was called.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The provider answered with a non-success status.
    #[error("unexpected provider response status {status}")]
    Status {
        /// Status returned by the provider.
        status: StatusCode,
    },
    /// Response payload could not be parsed into the expected envelope.
    #[error("failed to decode provider response")]
    DecodeResponse {
        /// Underlying decoding failure.
        #[source]
        source: reqwest::Error,
    },
    /// The generated text did not hold a usable question document.
    #[error("malformed provider payload: {reason}")]
    Malformed {
        /// What was wrong with the payload.
        reason: String,
    },
    /// The provider did not answer within the configured limit.
    #[error("provider did not answer within {millis} ms")]
    Timeout {
        /// Limit that was exceeded, in milliseconds.
        millis: u128,
    },
}

impl ProviderError {
    /// Construct a malformed-payload error from any displayable cause.
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        ProviderError::Malformed {
            reason: reason.to_string(),
        }
    }
}
