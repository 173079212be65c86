//! # Explorer Configuration
//!
//! Client-side settings for the orchestrator and gateway client.
//! Loaded from an optional JSON file; every field has a default.

use crate::models::ModelConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Topic shown when no journey is supplied
pub const DEFAULT_TOPIC: &str = "Weave";

/// Language the definitions are generated in
pub const BASE_LANGUAGE: &str = "en";

/// Frames in one ASCII animation
pub const ANIMATION_FRAMES: usize = 4;

/// Related topics kept per definition
pub const MAX_RELATED_TOPICS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Gateway endpoint, e.g. `http://127.0.0.1:8080/api/generate`
    pub gateway_url: String,
    /// Models per feature
    pub models: ModelConfig,
    /// Visual pause before fetches start on a topic change
    pub transition_delay_ms: u64,
    /// Total limit for single-shot calls
    pub request_timeout_secs: u64,
    /// Limit for establishing any connection, streams included
    pub connect_timeout_secs: u64,
    pub base_language: String,
    pub default_topic: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8080/api/generate".to_string(),
            models: ModelConfig::default(),
            transition_delay_ms: 300,
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            base_language: BASE_LANGUAGE.to_string(),
            default_topic: DEFAULT_TOPIC.to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No explorer config found, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid explorer config in {}", path.display()))
    }

    pub fn with_gateway(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    pub fn with_transition_delay(mut self, delay: Duration) -> Self {
        self.transition_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
