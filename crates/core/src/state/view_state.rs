//! # View State
//!
//! Everything the presentation layer shows for the current topic.
//! Only the orchestrator writes to it; renderers get clones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fetchable piece of per-topic content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// The streamed primary definition
    Definition,
    /// Static ASCII art
    Art,
    /// Up to four related topics
    Related,
    /// A historical fact, or an explicit "none known"
    Fact,
    /// Animated ASCII frames
    Animation,
    /// Best-effort reading difficulty of the definition
    Difficulty,
    /// Translation overlay of the definition
    Translation,
}

impl Feature {
    /// The four auxiliary features fetched alongside every definition
    pub const AUXILIARY: [Feature; 4] = [
        Feature::Art,
        Feature::Related,
        Feature::Fact,
        Feature::Animation,
    ];

    /// Key used in logs and in the serialized error map
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Definition => "definition",
            Feature::Art => "art",
            Feature::Related => "related",
            Feature::Fact => "fact",
            Feature::Animation => "animation",
            Feature::Difficulty => "difficulty",
            Feature::Translation => "translation",
        }
    }

    /// Short user-facing message for a malformed payload
    pub fn failure_message(&self) -> &'static str {
        match self {
            Feature::Definition => "Could not load the definition.",
            Feature::Art => "Could not generate ASCII art for this topic.",
            Feature::Related => "Could not find related topics.",
            Feature::Fact => "Could not retrieve a historical fact.",
            Feature::Animation => "Could not generate the animation.",
            Feature::Difficulty => "Could not rate the difficulty.",
            Feature::Translation => "Could not translate the definition.",
        }
    }
}

/// Result of the historical-fact lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum HistoricalFact {
    Fact(String),
    /// The model explicitly reported no notable fact
    NoneKnown,
}

/// Difficulty bands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" | "easy" => Some(Self::Beginner),
            "intermediate" | "medium" => Some(Self::Intermediate),
            "advanced" | "hard" => Some(Self::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DifficultyRating {
    pub level: DifficultyLevel,
    pub reason: String,
}

/// A translated copy of the definition, preferred for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub language: String,
    pub text: String,
}

/// Aggregate view of the current topic
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewState {
    /// Topic this state belongs to
    pub topic: String,
    /// Definition text accumulated so far
    pub definition: String,
    /// True while the primary stream is in flight
    pub loading: bool,
    /// Per-feature error messages
    #[serde(default)]
    pub errors: BTreeMap<Feature, String>,
    pub art: Option<String>,
    pub animation: Option<Vec<String>>,
    pub related: Option<Vec<String>>,
    pub fact: Option<HistoricalFact>,
    pub difficulty: Option<DifficultyRating>,
    pub translation: Option<Translation>,
}

impl ViewState {
    /// Fresh state for a topic transition
    pub fn loading(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            loading: true,
            ..Self::default()
        }
    }

    /// Text the display layer should show: translation first, then the original.
    pub fn display_text(&self) -> &str {
        match &self.translation {
            Some(t) => &t.text,
            None => &self.definition,
        }
    }

    pub fn error(&self, feature: Feature) -> Option<&str> {
        self.errors.get(&feature).map(String::as_str)
    }

    /// True when the skeleton loader should be visible
    pub fn shows_skeleton(&self) -> bool {
        self.loading && self.definition.is_empty() && self.error(Feature::Definition).is_none()
    }
}
