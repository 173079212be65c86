//! # Connectivity Probe
//!
//! One minimal call at startup; failures map to messages an
//! administrator can act on.

use crate::error::ContentError;
use serde::{Deserialize, Serialize};

/// Outcome of the startup check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub valid: bool,
    /// Diagnostic shown on the configuration-error screen
    #[serde(default)]
    pub message: Option<String>,
}

impl ProbeOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn failed(err: &ContentError) -> Self {
        Self {
            valid: false,
            message: Some(diagnose(err)),
        }
    }
}

/// Generic message when the gateway cannot be reached at all
pub const UNREACHABLE_MESSAGE: &str =
    "Could not connect to the Weavewiki server. Check that it is running and reachable.";

/// Message for a gateway that has no credential configured
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "The Weavewiki server is running but has no API key. \
     Set GEMINI_API_KEY in the server environment (or its .env file) and restart it.";

pub fn diagnose(err: &ContentError) -> String {
    match err {
        ContentError::Unreachable(_) | ContentError::Timeout(_) => UNREACHABLE_MESSAGE.to_string(),
        ContentError::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
        ContentError::InvalidCredential(detail) => format!(
            "The API key configured on the server was rejected ({}). \
             Replace GEMINI_API_KEY with a valid key and restart the server.",
            detail
        ),
        ContentError::Server { status, message } => format!(
            "The server failed the connectivity check ({}): {}",
            status, message
        ),
        other => format!("Unexpected response during the connectivity check: {}", other),
    }
}
