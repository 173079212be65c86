//! # Weavewiki Models
//!
//! Which generation model serves each feature, and the per-request
//! generation settings sent through the gateway.

use crate::state::Feature;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default model for every feature
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Model identifiers per feature.
///
/// ## Example
/// ```rust,ignore
/// use weavewiki_core::models::ModelConfig;
///
/// let models = ModelConfig::default().with_definition_model("gemini-2.5-flash");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Streamed definition
    pub definition: String,
    /// Art, related topics, facts, animation, difficulty
    pub structured: String,
    /// Translation overlay
    pub translation: String,
    /// Connectivity probe
    pub probe: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            definition: DEFAULT_MODEL.to_string(),
            structured: DEFAULT_MODEL.to_string(),
            translation: DEFAULT_MODEL.to_string(),
            probe: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn with_definition_model(mut self, model: impl Into<String>) -> Self {
        self.definition = model.into();
        self
    }

    /// Model used for a given feature
    pub fn for_feature(&self, feature: Feature) -> &str {
        match feature {
            Feature::Definition => &self.definition,
            Feature::Translation => &self.translation,
            _ => &self.structured,
        }
    }
}

/// `generationConfig` forwarded to the upstream service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<Value>,
}

impl GenerationConfig {
    /// Plain text output with thinking turned off
    pub fn fast_text() -> Self {
        Self::default().without_thinking()
    }

    /// JSON output constrained to `schema`, thinking off
    pub fn structured(schema: Value) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
            ..Self::default()
        }
        .without_thinking()
    }

    pub fn without_thinking(mut self) -> Self {
        self.thinking_config = Some(json!({ "thinkingBudget": 0 }));
        self
    }
}
