//! Scripted [`ContentService`] for orchestrator and shell tests.

use super::probe::ProbeOutcome;
use super::service::ContentService;
use crate::error::ContentError;
use crate::gateway::TextStream;
use crate::state::{DifficultyLevel, DifficultyRating, HistoricalFact};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Canned answers for one topic
#[derive(Clone)]
pub struct TopicScript {
    pub open_error: Option<ContentError>,
    pub fragments: Vec<Result<String, ContentError>>,
    pub art: Result<String, ContentError>,
    pub related: Result<Vec<String>, ContentError>,
    pub fact: Result<HistoricalFact, ContentError>,
    pub animation: Result<Vec<String>, ContentError>,
    /// Held closed until [`Gate::open`]; every call for the topic waits on it
    pub gate: Option<Gate>,
    /// Holds back only the art call
    pub art_gate: Option<Gate>,
}

impl TopicScript {
    pub fn ok(topic: &str) -> Self {
        Self {
            open_error: None,
            fragments: vec![Ok(format!("{} is ", topic)), Ok("a thing.".to_string())],
            art: Ok(format!("[art:{}]", topic)),
            related: Ok(vec![format!("{} A", topic), format!("{} B", topic)]),
            fact: Ok(HistoricalFact::Fact(format!("{} has history.", topic))),
            animation: Ok(vec![format!("{}-1", topic), format!("{}-2", topic)]),
            gate: None,
            art_gate: None,
        }
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }
}

#[derive(Clone)]
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn closed() -> Self {
        Self(Arc::new(Semaphore::new(0)))
    }

    pub fn open(&self) {
        self.0.add_permits(1);
    }

    async fn pass(&self) {
        // The permit is returned on drop, so one opening lets every waiter through
        let _permit = self.0.acquire().await;
    }
}

pub struct ScriptedService {
    pub scripts: Mutex<HashMap<String, TopicScript>>,
    pub probe: ProbeOutcome,
    pub difficulty: Result<DifficultyRating, ContentError>,
    pub translation_error: Option<ContentError>,
    pub difficulty_calls: AtomicUsize,
    pub translate_calls: AtomicUsize,
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            probe: ProbeOutcome::ok(),
            difficulty: Ok(DifficultyRating {
                level: DifficultyLevel::Beginner,
                reason: "Plain words.".to_string(),
            }),
            translation_error: None,
            difficulty_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedService {
    pub fn with_script(self, topic: &str, script: TopicScript) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(topic.to_string(), script);
        self
    }

    fn script(&self, topic: &str) -> TopicScript {
        self.scripts
            .lock()
            .unwrap()
            .get(topic)
            .cloned()
            .unwrap_or_else(|| TopicScript::ok(topic))
    }

    async fn script_after_gate(&self, topic: &str) -> TopicScript {
        let script = self.script(topic);
        if let Some(gate) = &script.gate {
            gate.pass().await;
        }
        script
    }

    pub fn difficulty_calls(&self) -> usize {
        self.difficulty_calls.load(Ordering::SeqCst)
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentService for ScriptedService {
    async fn probe(&self) -> ProbeOutcome {
        self.probe.clone()
    }

    async fn stream_definition(&self, topic: &str) -> Result<TextStream, ContentError> {
        let script = self.script_after_gate(topic).await;
        if let Some(err) = script.open_error {
            return Err(err);
        }
        Ok(futures::stream::iter(script.fragments).boxed())
    }

    async fn ascii_art(&self, topic: &str) -> Result<String, ContentError> {
        let script = self.script_after_gate(topic).await;
        if let Some(gate) = &script.art_gate {
            gate.pass().await;
        }
        script.art
    }

    async fn related_topics(&self, topic: &str) -> Result<Vec<String>, ContentError> {
        self.script_after_gate(topic).await.related
    }

    async fn historical_fact(&self, topic: &str) -> Result<HistoricalFact, ContentError> {
        self.script_after_gate(topic).await.fact
    }

    async fn animation_frames(&self, topic: &str) -> Result<Vec<String>, ContentError> {
        self.script_after_gate(topic).await.animation
    }

    async fn rate_difficulty(&self, _text: &str) -> Result<DifficultyRating, ContentError> {
        self.difficulty_calls.fetch_add(1, Ordering::SeqCst);
        self.difficulty.clone()
    }

    async fn translate(&self, text: &str, language: &str) -> Result<String, ContentError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.translation_error {
            Some(err) => Err(err.clone()),
            None => Ok(format!("[{}] {}", language, text)),
        }
    }
}
