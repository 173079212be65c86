//! Wire types shared by the gateway client and the proxy server.

use crate::models::GenerationConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Machine-readable failure codes in [`ErrorBody::code`]
pub mod codes {
    /// Server started without an API key
    pub const MISSING_CREDENTIAL: &str = "missing_credential";
    /// Upstream rejected the API key
    pub const INVALID_CREDENTIAL: &str = "invalid_credential";
    /// Request body did not parse
    pub const BAD_REQUEST: &str = "bad_request";
    /// Any other upstream failure
    pub const UPSTREAM_ERROR: &str = "upstream_error";
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GatewayRequest {
    /// Upstream model identifier
    pub model: String,
    /// Prompt text, or a full upstream `contents` array
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub contents: Value,
    /// Forwarded verbatim as the upstream `generationConfig`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub config: Option<Value>,
    #[serde(default)]
    pub stream: bool,
}

impl GatewayRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            contents: Value::String(prompt.into()),
            config: None,
            stream: false,
        }
    }

    pub fn with_config(mut self, config: &GenerationConfig) -> Self {
        self.config = serde_json::to_value(config).ok();
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// Non-streaming success envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TextEnvelope {
    pub text: String,
}

/// Failure envelope on any non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
        }
    }
}
