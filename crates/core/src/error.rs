//! # Content Errors
//!
//! Failure taxonomy for everything that talks to the gateway.

use crate::state::Feature;
use thiserror::Error;

/// Errors raised by the gateway client and the content service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentError {
    /// The gateway could not be reached at all
    #[error("Could not reach the Weavewiki server: {0}")]
    Unreachable(String),

    /// The gateway is running but holds no API credential
    #[error("The server has no API key configured")]
    MissingCredential,

    /// The upstream service rejected the configured credential
    #[error("The configured API key was rejected: {0}")]
    InvalidCredential(String),

    /// A request exceeded its configured time limit
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Non-2xx response from the gateway
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The definition stream failed to open or broke mid-way
    #[error("Could not load the definition for \"{topic}\": {message}")]
    Stream { topic: String, message: String },

    /// A structured payload did not have the expected shape.
    /// `detail` is for logs only; `Display` stays generic.
    #[error("{}", feature.failure_message())]
    InvalidPayload { feature: Feature, detail: String },

    /// The gateway envelope itself was not decodable
    #[error("Malformed server response: {0}")]
    Decode(String),
}

impl ContentError {
    pub(crate) fn invalid(feature: Feature, detail: impl Into<String>) -> Self {
        ContentError::InvalidPayload {
            feature,
            detail: detail.into(),
        }
    }

    /// Re-tag any failure as a stream failure for `topic`.
    pub(crate) fn into_stream(self, topic: &str) -> Self {
        match self {
            err @ ContentError::Stream { .. } => err,
            other => ContentError::Stream {
                topic: topic.to_string(),
                message: other.to_string(),
            },
        }
    }
}
