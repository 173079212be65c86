//! Prompt templates bundled at compile time.
//!
//! Placeholders are `{topic}`, `{text}` and `{language}`.

use serde_json::{json, Value};

/// Streamed definition
pub const DEFINITION: &str = include_str!("defaults/definition.md");

/// Static ASCII art
pub const ASCII_ART: &str = include_str!("defaults/ascii_art.md");

/// Related topics
pub const RELATED: &str = include_str!("defaults/related.md");

/// Historical fact, with `NO_FACT` sentinel
pub const FACT: &str = include_str!("defaults/fact.md");

/// Animated ASCII frames
pub const ANIMATION: &str = include_str!("defaults/animation.md");

/// Difficulty rating of a finished definition
pub const DIFFICULTY: &str = include_str!("defaults/difficulty.md");

/// Translation overlay
pub const TRANSLATE: &str = include_str!("defaults/translate.md");

/// Startup connectivity probe
pub const PROBE: &str = include_str!("defaults/probe.md");

pub fn for_topic(template: &str, topic: &str) -> String {
    template.replace("{topic}", topic)
}

pub fn for_text(template: &str, text: &str) -> String {
    template.replace("{text}", text)
}

pub fn for_translation(text: &str, language: &str) -> String {
    TRANSLATE
        .replace("{language}", language)
        .replace("{text}", text)
}

/// Response schemas, in the upstream's OpenAPI-subset dialect
pub mod schemas {
    use super::*;

    fn object(field: &str, kind: Value) -> Value {
        json!({
            "type": "OBJECT",
            "properties": { field: kind },
            "required": [field]
        })
    }

    pub fn art() -> Value {
        object("art", json!({ "type": "STRING" }))
    }

    pub fn related() -> Value {
        object(
            "topics",
            json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
        )
    }

    pub fn fact() -> Value {
        object("fact", json!({ "type": "STRING" }))
    }

    pub fn animation() -> Value {
        object(
            "frames",
            json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
        )
    }

    pub fn difficulty() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "level": {
                    "type": "STRING",
                    "enum": ["beginner", "intermediate", "advanced"]
                },
                "reason": { "type": "STRING" }
            },
            "required": ["level", "reason"]
        })
    }
}

/// All templates with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("definition", DEFINITION),
        ("ascii_art", ASCII_ART),
        ("related", RELATED),
        ("fact", FACT),
        ("animation", ANIMATION),
        ("difficulty", DIFFICULTY),
        ("translate", TRANSLATE),
        ("probe", PROBE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_templates_have_placeholder() {
        for (slug, template) in all_defaults() {
            match slug {
                "difficulty" => assert!(template.contains("{text}")),
                "translate" => {
                    assert!(template.contains("{text}"));
                    assert!(template.contains("{language}"));
                }
                "probe" => {}
                _ => assert!(template.contains("{topic}"), "{} lacks {{topic}}", slug),
            }
        }
    }

    #[test]
    fn test_translation_fills_both() {
        let prompt = for_translation("A loom weaves.", "fr");
        assert!(prompt.contains("\"fr\""));
        assert!(prompt.contains("A loom weaves."));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_schema_requires_field() {
        assert_eq!(schemas::related()["required"][0], "topics");
        assert_eq!(schemas::art()["properties"]["art"]["type"], "STRING");
    }
}
