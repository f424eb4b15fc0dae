use reqwest::StatusCode;
use thiserror::Error;

/// Failure kinds produced by the HTTP layer.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent, timed out, or its body could not be read.
    #[error("request to '{url}' failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status that is not retried, or retries ran out.
    #[error("request to '{url}' returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// The server kept rate-limiting the request past the configured bound.
    #[error("request to '{url}' still rate limited after {waits} wait(s)")]
    RateLimitExhausted { url: String, waits: u32 },

    /// The response body did not have the expected shape.
    #[error("malformed response from '{url}': {reason}")]
    MalformedResponse { url: String, reason: String },

    /// A request body could not be serialized.
    #[error("cannot encode request body for '{url}': {source}")]
    Encode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request URL could not be derived from the configured base URL.
    #[error("cannot build request URL from '{base}'")]
    InvalidUrl { base: String },
}

impl FetchError {
    pub(crate) fn malformed(url: impl Into<String>, reason: impl core::fmt::Display) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// The HTTP status attached to this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }
}
