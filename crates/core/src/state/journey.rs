//! # Journey
//!
//! Browser-style history of visited topics. Moving to a new topic from
//! an earlier position discards everything ahead of it.

use serde::{Deserialize, Serialize};

/// Ordered topic history with a cursor.
///
/// Never empty; `index` always points at an existing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Journey {
    topics: Vec<String>,
    index: usize,
}

impl Journey {
    /// Start a journey at a single seed topic
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            topics: vec![seed.into()],
            index: 0,
        }
    }

    /// Rebuild a journey from its shareable form (`A,B%2CC`).
    ///
    /// Falls back to `seed` when nothing usable is encoded.
    /// The cursor lands on the last entry.
    pub fn from_shared(shared: &str, seed: impl Into<String>) -> Self {
        let topics: Vec<String> = shared
            .split(',')
            .filter_map(|part| {
                let decoded = urlencoding::decode(part)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| part.to_string());
                let trimmed = decoded.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect();

        if topics.is_empty() {
            return Self::new(seed);
        }

        let index = topics.len() - 1;
        Self { topics, index }
    }

    /// Shareable form: each topic percent-encoded, joined by commas
    pub fn to_shared(&self) -> String {
        self.topics
            .iter()
            .map(|t| urlencoding::encode(t).into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn current(&self) -> &str {
        &self.topics[self.index]
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Journeys always hold at least the seed topic
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Move to a new topic.
    ///
    /// Returns false (and changes nothing) when the trimmed input is empty
    /// or matches the current topic ignoring case.
    pub fn navigate(&mut self, input: &str) -> bool {
        let topic = input.trim();
        if topic.is_empty() || topic.to_lowercase() == self.current().to_lowercase() {
            return false;
        }

        self.topics.truncate(self.index + 1);
        self.topics.push(topic.to_string());
        self.index = self.topics.len() - 1;
        true
    }

    /// Point the cursor at an existing entry. Out-of-range or
    /// same-position jumps return false.
    pub fn jump(&mut self, index: usize) -> bool {
        if index >= self.topics.len() || index == self.index {
            return false;
        }
        self.index = index;
        true
    }
}
