//! # View Events
//!
//! Change notifications for presentation layers. Every event carries the
//! generation it belongs to; stale generations never publish.

use super::generation::Generation;
use crate::state::Feature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of view change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewEventKind {
    /// State was reset for a new topic
    TransitionStarted,
    /// Another definition fragment was appended
    DefinitionUpdated,
    /// Definition stream finished successfully
    DefinitionCompleted,
    /// Definition stream failed; accumulated text discarded
    DefinitionFailed,
    /// An auxiliary feature stored its payload
    FeatureLoaded,
    /// An auxiliary feature stored its error
    FeatureFailed,
    /// Best-effort difficulty rating arrived
    DifficultyRated,
    /// Translation overlay stored
    TranslationUpdated,
    /// Translation overlay removed (back to the base language)
    TranslationCleared,
    /// Translation call failed
    TranslationFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEvent {
    pub timestamp: DateTime<Utc>,
    pub generation: Generation,
    pub topic: String,
    pub kind: ViewEventKind,
    #[serde(default)]
    pub feature: Option<Feature>,
    /// Kind-specific payload (accumulated text, error message, ...)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ViewEvent {
    pub fn new(kind: ViewEventKind, generation: Generation, topic: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            generation,
            topic: topic.to_string(),
            kind,
            feature: None,
            data: None,
        }
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
