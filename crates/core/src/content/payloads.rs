//! # Structured Payloads
//!
//! Decode-then-validate for every JSON-producing feature. The remote
//! shape is never trusted: each parser returns a typed value or an
//! `InvalidPayload` carrying the raw diagnostic for logs.

use crate::config::{ANIMATION_FRAMES, MAX_RELATED_TOPICS};
use crate::error::ContentError;
use crate::state::{DifficultyLevel, DifficultyRating, Feature, HistoricalFact};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::OnceLock;

/// Sentinel the fact prompt asks for when nothing notable exists
pub const NO_FACT: &str = "NO_FACT";

#[derive(Deserialize)]
struct ArtPayload {
    art: String,
}

#[derive(Deserialize)]
struct RelatedPayload {
    topics: Vec<String>,
}

#[derive(Deserialize)]
struct FactPayload {
    fact: Option<String>,
}

#[derive(Deserialize)]
struct AnimationPayload {
    frames: Vec<String>,
}

#[derive(Deserialize)]
struct DifficultyPayload {
    level: String,
    #[serde(default)]
    reason: String,
}

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$").ok())
        .as_ref()
}

/// Strip a surrounding markdown code fence, if any
pub fn strip_code_fence(text: &str) -> &str {
    match fence_pattern()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
    {
        Some(inner) => inner.as_str(),
        None => text,
    }
}

fn decode<T: DeserializeOwned>(feature: Feature, raw: &str) -> Result<T, ContentError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        tracing::debug!(feature = feature.as_str(), error = %e, "Payload failed to decode");
        ContentError::invalid(feature, e.to_string())
    })
}

fn reject(feature: Feature, detail: &str) -> ContentError {
    tracing::debug!(feature = feature.as_str(), detail, "Payload failed validation");
    ContentError::invalid(feature, detail)
}

pub fn parse_art(raw: &str) -> Result<String, ContentError> {
    let payload: ArtPayload = decode(Feature::Art, raw)?;
    let art = strip_code_fence(&payload.art).trim_end();
    if art.trim().is_empty() {
        return Err(reject(Feature::Art, "art field is blank"));
    }
    Ok(art.to_string())
}

/// Related topics, blanks dropped, capped at four.
pub fn parse_related(raw: &str) -> Result<Vec<String>, ContentError> {
    let payload: RelatedPayload = decode(Feature::Related, raw)?;
    let topics: Vec<String> = payload
        .topics
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(MAX_RELATED_TOPICS)
        .map(str::to_string)
        .collect();

    if topics.is_empty() {
        return Err(reject(Feature::Related, "topics array is empty"));
    }
    Ok(topics)
}

pub fn parse_fact(raw: &str) -> Result<HistoricalFact, ContentError> {
    let payload: FactPayload = decode(Feature::Fact, raw)?;
    match payload.fact.as_deref().map(str::trim) {
        None => Ok(HistoricalFact::NoneKnown),
        Some(f) if f.eq_ignore_ascii_case(NO_FACT) => Ok(HistoricalFact::NoneKnown),
        Some("") => Err(reject(Feature::Fact, "fact field is blank")),
        Some(f) => Ok(HistoricalFact::Fact(f.to_string())),
    }
}

/// Exactly [`ANIMATION_FRAMES`] non-blank frames.
pub fn parse_animation(raw: &str) -> Result<Vec<String>, ContentError> {
    let payload: AnimationPayload = decode(Feature::Animation, raw)?;
    if payload.frames.len() != ANIMATION_FRAMES {
        return Err(reject(
            Feature::Animation,
            &format!(
                "expected {} frames, got {}",
                ANIMATION_FRAMES,
                payload.frames.len()
            ),
        ));
    }
    if payload.frames.iter().any(|f| f.trim().is_empty()) {
        return Err(reject(Feature::Animation, "blank frame"));
    }
    Ok(payload.frames)
}

pub fn parse_difficulty(raw: &str) -> Result<DifficultyRating, ContentError> {
    let payload: DifficultyPayload = decode(Feature::Difficulty, raw)?;
    let level = DifficultyLevel::parse(&payload.level)
        .ok_or_else(|| reject(Feature::Difficulty, "unknown difficulty level"))?;
    Ok(DifficultyRating {
        level,
        reason: payload.reason.trim().to_string(),
    })
}
