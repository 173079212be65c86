//! # Content Orchestrator
//!
//! Owns the per-topic fetch lifecycle and the journey.
//!
//! ```text
//! topic change ─▶ begin generation + reset view
//!               ─▶ transition delay (abandoned if superseded)
//!               ─┬▶ art ─┐
//!                ├▶ related ─┤ all-settle, errors isolated per feature
//!                ├▶ fact ─┤
//!                ├▶ animation ─┘
//!                └▶ definition stream ─▶ difficulty (best effort, not
//!                                         waiting on the auxiliaries)
//! ```
//!
//! Every write goes through the generation guard, so results from a
//! superseded topic are dropped even when their requests complete.

use super::events::{ViewEvent, ViewEventKind};
use super::generation::{Generation, GenerationGuard};
use crate::config::ExplorerConfig;
use crate::content::ContentService;
use crate::error::ContentError;
use crate::state::{Feature, Journey, Translation, ViewState};
use futures::StreamExt;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

struct Inner {
    service: Arc<dyn ContentService>,
    config: ExplorerConfig,
    view: GenerationGuard<ViewState>,
    journey: Mutex<Journey>,
    event_tx: broadcast::Sender<ViewEvent>,
}

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ContentOrchestrator {
    inner: Arc<Inner>,
}

impl ContentOrchestrator {
    pub fn new(service: Arc<dyn ContentService>, config: ExplorerConfig, journey: Journey) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                service,
                config,
                view: GenerationGuard::new(ViewState::default()),
                journey: Mutex::new(journey),
                event_tx,
            }),
        }
    }

    /// Receive view events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Snapshot of the current view
    pub fn view(&self) -> ViewState {
        self.inner.view.snapshot()
    }

    /// Snapshot of the journey
    pub fn journey(&self) -> Journey {
        self.lock_journey().clone()
    }

    pub fn current_topic(&self) -> String {
        self.lock_journey().current().to_string()
    }

    pub fn generation(&self) -> Generation {
        self.inner.view.current()
    }

    fn lock_journey(&self) -> std::sync::MutexGuard<'_, Journey> {
        self.inner
            .journey
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Navigate to a new topic and load it.
    ///
    /// Returns false without doing anything when the input is blank or
    /// names the current topic.
    pub async fn go_to(&self, input: &str) -> bool {
        let topic = {
            let mut journey = self.lock_journey();
            if !journey.navigate(input) {
                return false;
            }
            journey.current().to_string()
        };
        self.load(&topic).await;
        true
    }

    /// Move the journey cursor to `index` and load that topic.
    pub async fn jump_to(&self, index: usize) -> bool {
        let topic = {
            let mut journey = self.lock_journey();
            if !journey.jump(index) {
                return false;
            }
            journey.current().to_string()
        };
        self.load(&topic).await;
        true
    }

    /// Run one full topic transition. Returns once every fetch for this
    /// generation has settled or the generation was superseded.
    #[tracing::instrument(skip(self), fields(generation))]
    pub async fn load(&self, topic: &str) {
        let tx = &self.inner.event_tx;
        let generation = self.inner.view.begin_with(ViewState::loading(topic), |g, _| {
            let _ = tx.send(ViewEvent::new(ViewEventKind::TransitionStarted, g, topic));
        });
        tracing::Span::current().record("generation", generation.value());
        tracing::info!("Topic transition started");

        let delay = self.inner.config.transition_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if !self.inner.view.is_current(generation) {
            tracing::debug!("Superseded during transition delay");
            return;
        }

        // Difficulty follows the definition only; slow auxiliaries never hold it back
        let definition = async {
            if let Some(text) = self.stream_definition(generation, topic).await {
                self.rate_difficulty(generation, topic, &text).await;
            }
        };

        tokio::join!(self.load_auxiliary(generation, topic), definition);
    }

    /// Fire the four auxiliary fetches and wait for all of them.
    async fn load_auxiliary(&self, generation: Generation, topic: &str) {
        let service = &self.inner.service;

        let art = async {
            let result = service.ascii_art(topic).await;
            self.settle(generation, topic, Feature::Art, result, |view, art| {
                view.art = Some(art)
            });
        };
        let related = async {
            let result = service.related_topics(topic).await;
            self.settle(generation, topic, Feature::Related, result, |view, topics| {
                view.related = Some(topics)
            });
        };
        let fact = async {
            let result = service.historical_fact(topic).await;
            self.settle(generation, topic, Feature::Fact, result, |view, fact| {
                view.fact = Some(fact)
            });
        };
        let animation = async {
            let result = service.animation_frames(topic).await;
            self.settle(generation, topic, Feature::Animation, result, |view, frames| {
                view.animation = Some(frames)
            });
        };

        tokio::join!(art, related, fact, animation);
    }

    /// Store one auxiliary outcome: payload on success, message on failure.
    fn settle<T>(
        &self,
        generation: Generation,
        topic: &str,
        feature: Feature,
        result: Result<T, ContentError>,
        store: impl FnOnce(&mut ViewState, T),
    ) {
        let tx = &self.inner.event_tx;
        let applied = match result {
            Ok(value) => self.inner.view.apply(generation, |view| {
                store(view, value);
                let event = ViewEvent::new(ViewEventKind::FeatureLoaded, generation, topic)
                    .with_feature(feature);
                let _ = tx.send(event);
            }),
            Err(e) => {
                let message = e.to_string();
                self.inner.view.apply(generation, |view| {
                    tracing::warn!(feature = feature.as_str(), error = %message, "Auxiliary fetch failed");
                    view.errors.insert(feature, message.clone());
                    let event = ViewEvent::new(ViewEventKind::FeatureFailed, generation, topic)
                        .with_feature(feature)
                        .with_data(json!(message));
                    let _ = tx.send(event);
                })
            }
        };

        if applied.is_none() {
            tracing::debug!(feature = feature.as_str(), %generation, "Discarding stale result");
        }
    }

    /// Consume the definition stream. Returns the final text on success.
    async fn stream_definition(&self, generation: Generation, topic: &str) -> Option<String> {
        let mut stream = match self.inner.service.stream_definition(topic).await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail_definition(generation, topic, e);
                return None;
            }
        };

        let tx = &self.inner.event_tx;
        let mut buffer = String::new();

        while let Some(fragment) = stream.next().await {
            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(e) => {
                    self.fail_definition(generation, topic, e);
                    return None;
                }
            };

            buffer.push_str(&fragment);
            let applied = self.inner.view.apply(generation, |view| {
                view.definition.clone_from(&buffer);
                let event = ViewEvent::new(ViewEventKind::DefinitionUpdated, generation, topic)
                    .with_data(json!(buffer));
                let _ = tx.send(event);
            });

            if applied.is_none() {
                tracing::debug!(%generation, "Abandoning stale definition stream");
                return None;
            }
        }

        self.inner.view.apply(generation, |view| {
            view.loading = false;
            let _ = tx.send(ViewEvent::new(
                ViewEventKind::DefinitionCompleted,
                generation,
                topic,
            ));
        })?;

        tracing::info!(chars = buffer.chars().count(), "Definition complete");
        Some(buffer)
    }

    fn fail_definition(&self, generation: Generation, topic: &str, err: ContentError) {
        let message = err.to_string();
        let tx = &self.inner.event_tx;
        let applied = self.inner.view.apply(generation, |view| {
            tracing::warn!(error = %message, "Definition stream failed");
            view.definition.clear();
            view.loading = false;
            view.errors.insert(Feature::Definition, message.clone());
            let event = ViewEvent::new(ViewEventKind::DefinitionFailed, generation, topic)
                .with_feature(Feature::Definition)
                .with_data(json!(message));
            let _ = tx.send(event);
        });

        if applied.is_none() {
            tracing::debug!(%generation, "Discarding stale definition failure");
        }
    }

    /// Best effort: failures are logged, never shown.
    async fn rate_difficulty(&self, generation: Generation, topic: &str, text: &str) {
        if text.trim().is_empty() || !self.inner.view.is_current(generation) {
            return;
        }

        match self.inner.service.rate_difficulty(text).await {
            Ok(rating) => {
                let tx = &self.inner.event_tx;
                self.inner.view.apply(generation, |view| {
                    let event = ViewEvent::new(ViewEventKind::DifficultyRated, generation, topic)
                        .with_feature(Feature::Difficulty)
                        .with_data(json!(rating));
                    view.difficulty = Some(rating);
                    let _ = tx.send(event);
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Difficulty rating failed, ignoring");
            }
        }
    }

    /// Translate the current definition into `language`.
    ///
    /// Rejected (returns false) while the definition is still loading or
    /// before any text exists. The base language clears the overlay
    /// without a network call.
    pub async fn translate(&self, language: &str) -> bool {
        let (generation, (ready, topic, text)) = self.inner.view.read(|view| {
            (
                !view.loading && !view.definition.is_empty(),
                view.topic.clone(),
                view.definition.clone(),
            )
        });

        if !ready {
            tracing::debug!(language, "Translation rejected: no finished definition");
            return false;
        }

        let tx = &self.inner.event_tx;

        if language.eq_ignore_ascii_case(&self.inner.config.base_language) {
            self.inner.view.apply(generation, |view| {
                view.translation = None;
                view.errors.remove(&Feature::Translation);
                let _ = tx.send(ViewEvent::new(
                    ViewEventKind::TranslationCleared,
                    generation,
                    &topic,
                ));
            });
            return true;
        }

        let result = self.inner.service.translate(&text, language).await;
        let applied = match result {
            Ok(translated) => self.inner.view.apply(generation, |view| {
                view.errors.remove(&Feature::Translation);
                view.translation = Some(Translation {
                    language: language.to_string(),
                    text: translated,
                });
                let event = ViewEvent::new(ViewEventKind::TranslationUpdated, generation, &topic)
                    .with_feature(Feature::Translation)
                    .with_data(json!(language));
                let _ = tx.send(event);
            }),
            Err(e) => {
                let message = e.to_string();
                self.inner.view.apply(generation, |view| {
                    tracing::warn!(language, error = %message, "Translation failed");
                    view.errors.insert(Feature::Translation, message.clone());
                    let event =
                        ViewEvent::new(ViewEventKind::TranslationFailed, generation, &topic)
                            .with_feature(Feature::Translation)
                            .with_data(json!(message));
                    let _ = tx.send(event);
                })
            }
        };

        if applied.is_none() {
            tracing::debug!(language, %generation, "Discarding stale translation");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::testing::{Gate, ScriptedService, TopicScript};
    use crate::state::HistoricalFact;
    use std::time::Duration;

    fn config() -> ExplorerConfig {
        ExplorerConfig::default().with_transition_delay(Duration::ZERO)
    }

    fn orchestrator(service: ScriptedService) -> (ContentOrchestrator, Arc<ScriptedService>) {
        let service = Arc::new(service);
        let orchestrator =
            ContentOrchestrator::new(service.clone(), config(), Journey::new("Weave"));
        (orchestrator, service)
    }

    fn failure(message: &str) -> ContentError {
        ContentError::Server {
            status: 500,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_transition_populates_view() {
        let (orchestrator, service) = orchestrator(ScriptedService::default());
        orchestrator.load("Loom").await;

        let view = orchestrator.view();
        assert_eq!(view.topic, "Loom");
        assert_eq!(view.definition, "Loom is a thing.");
        assert!(!view.loading);
        assert_eq!(view.art.as_deref(), Some("[art:Loom]"));
        assert_eq!(view.related.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            view.fact,
            Some(HistoricalFact::Fact("Loom has history.".to_string()))
        );
        assert!(view.animation.is_some());
        assert!(view.difficulty.is_some());
        assert!(view.errors.is_empty());
        assert_eq!(service.difficulty_calls(), 1);
    }

    #[tokio::test]
    async fn test_streaming_applies_fragments_in_order() {
        let script = TopicScript {
            fragments: vec![Ok("Hel".to_string()), Ok("lo".to_string())],
            ..TopicScript::ok("X")
        };
        let (orchestrator, _) = orchestrator(ScriptedService::default().with_script("X", script));
        let mut events = orchestrator.subscribe();

        orchestrator.load("X").await;

        let mut updates = Vec::new();
        while let Ok(event) = events.try_recv() {
            if event.kind == ViewEventKind::DefinitionUpdated {
                updates.push(event.data.unwrap().as_str().unwrap().to_string());
            }
        }
        assert_eq!(updates, vec!["Hel", "Hello"]);
        assert_eq!(orchestrator.view().definition, "Hello");
    }

    #[tokio::test]
    async fn test_mixed_auxiliary_outcomes_stay_isolated() {
        let script = TopicScript {
            art: Err(failure("art broke")),
            fact: Err(failure("fact broke")),
            ..TopicScript::ok("Loom")
        };
        let (orchestrator, _) =
            orchestrator(ScriptedService::default().with_script("Loom", script));
        orchestrator.load("Loom").await;

        let view = orchestrator.view();
        assert!(view.art.is_none());
        assert!(view.fact.is_none());
        assert!(view.related.is_some());
        assert!(view.animation.is_some());
        assert_eq!(view.errors.len(), 2);
        assert!(view.error(Feature::Art).unwrap().contains("art broke"));
        assert!(view.error(Feature::Fact).unwrap().contains("fact broke"));
        assert!(view.error(Feature::Related).is_none());
        assert_eq!(view.definition, "Loom is a thing.");
    }

    #[tokio::test]
    async fn test_every_auxiliary_failing_still_streams_definition() {
        let script = TopicScript {
            art: Err(failure("a")),
            related: Err(failure("r")),
            fact: Err(failure("f")),
            animation: Err(failure("n")),
            ..TopicScript::ok("Loom")
        };
        let (orchestrator, _) =
            orchestrator(ScriptedService::default().with_script("Loom", script));
        orchestrator.load("Loom").await;

        let view = orchestrator.view();
        assert_eq!(view.errors.len(), 4);
        assert!(view.error(Feature::Definition).is_none());
        assert_eq!(view.definition, "Loom is a thing.");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_text() {
        let script = TopicScript {
            fragments: vec![
                Ok("Partial ".to_string()),
                Err(ContentError::Stream {
                    topic: "Loom".to_string(),
                    message: "connection reset".to_string(),
                }),
            ],
            ..TopicScript::ok("Loom")
        };
        let (orchestrator, service) =
            orchestrator(ScriptedService::default().with_script("Loom", script));
        orchestrator.load("Loom").await;

        let view = orchestrator.view();
        assert_eq!(view.definition, "");
        assert!(!view.loading);
        assert!(!view.shows_skeleton());
        assert!(view
            .error(Feature::Definition)
            .unwrap()
            .contains("connection reset"));
        assert_eq!(service.difficulty_calls(), 0);
    }

    #[tokio::test]
    async fn test_difficulty_failure_is_swallowed() {
        let service = ScriptedService {
            difficulty: Err(failure("rating down")),
            ..ScriptedService::default()
        };
        let (orchestrator, service) = orchestrator(service);
        orchestrator.load("Loom").await;

        let view = orchestrator.view();
        assert_eq!(service.difficulty_calls(), 1);
        assert!(view.difficulty.is_none());
        assert!(view.errors.is_empty());
    }

    #[tokio::test]
    async fn test_empty_definition_skips_difficulty() {
        let script = TopicScript {
            fragments: vec![],
            ..TopicScript::ok("Loom")
        };
        let (orchestrator, service) =
            orchestrator(ScriptedService::default().with_script("Loom", script));
        orchestrator.load("Loom").await;
        assert_eq!(service.difficulty_calls(), 0);
    }

    #[tokio::test]
    async fn test_late_results_from_old_generation_are_discarded() {
        let gate = Gate::closed();
        let service = ScriptedService::default()
            .with_script("Old", TopicScript::ok("Old").gated(&gate))
            .with_script("New", TopicScript::ok("New"));
        let (orchestrator, _) = orchestrator(service);
        let mut events = orchestrator.subscribe();

        let stale = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.load("Old").await })
        };
        let started = events.recv().await.unwrap();
        assert_eq!(started.topic, "Old");

        orchestrator.load("New").await;
        let settled = orchestrator.view();
        assert_eq!(settled.definition, "New is a thing.");

        // Old requests now complete on the wire
        gate.open();
        stale.await.unwrap();

        assert_eq!(orchestrator.view(), settled);

        let new_generation = orchestrator.generation();
        while let Ok(event) = events.try_recv() {
            if event.generation != new_generation {
                assert_eq!(event.kind, ViewEventKind::TransitionStarted);
            }
        }
    }

    #[tokio::test]
    async fn test_late_failures_from_old_generation_are_discarded() {
        let gate = Gate::closed();
        let old = TopicScript {
            open_error: Some(ContentError::Unreachable("socket closed".to_string())),
            art: Err(failure("old art")),
            related: Err(failure("old related")),
            fact: Err(failure("old fact")),
            animation: Err(failure("old animation")),
            ..TopicScript::ok("Old")
        }
        .gated(&gate);
        let service = ScriptedService::default()
            .with_script("Old", old)
            .with_script("New", TopicScript::ok("New"));
        let (orchestrator, service) = orchestrator(service);
        let mut events = orchestrator.subscribe();

        let stale = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.load("Old").await })
        };
        assert_eq!(events.recv().await.unwrap().topic, "Old");

        orchestrator.load("New").await;
        let settled = orchestrator.view();
        assert!(settled.errors.is_empty());

        gate.open();
        stale.await.unwrap();

        let view = orchestrator.view();
        assert_eq!(view, settled);
        assert!(view.errors.is_empty());
        assert_eq!(view.definition, "New is a thing.");
        assert_eq!(service.difficulty_calls(), 1);

        let new_generation = orchestrator.generation();
        while let Ok(event) = events.try_recv() {
            assert!(
                event.generation == new_generation
                    || event.kind == ViewEventKind::TransitionStarted,
                "stale {:?} event published",
                event.kind
            );
        }
    }

    #[tokio::test]
    async fn test_difficulty_does_not_wait_for_slow_auxiliary() {
        let art_gate = Gate::closed();
        let script = TopicScript {
            art_gate: Some(art_gate.clone()),
            ..TopicScript::ok("Loom")
        };
        let (orchestrator, service) =
            orchestrator(ScriptedService::default().with_script("Loom", script));
        let mut events = orchestrator.subscribe();

        let load = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.load("Loom").await })
        };

        let rated = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let event = events.recv().await.unwrap();
                if event.kind == ViewEventKind::DifficultyRated {
                    return event;
                }
            }
        })
        .await
        .expect("difficulty rated while art is still pending");
        assert_eq!(rated.topic, "Loom");

        let view = orchestrator.view();
        assert!(view.difficulty.is_some());
        assert!(view.art.is_none());
        assert_eq!(service.difficulty_calls(), 1);

        art_gate.open();
        load.await.unwrap();
        assert_eq!(orchestrator.view().art.as_deref(), Some("[art:Loom]"));
    }

    #[tokio::test]
    async fn test_superseded_during_delay_never_fetches() {
        let service = Arc::new(ScriptedService::default());
        let orchestrator = ContentOrchestrator::new(
            service.clone(),
            ExplorerConfig::default().with_transition_delay(Duration::from_millis(200)),
            Journey::new("Weave"),
        );

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.load("First").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.load("Second").await;
        first.await.unwrap();

        let view = orchestrator.view();
        assert_eq!(view.topic, "Second");
        assert_eq!(view.definition, "Second is a thing.");
        assert_eq!(service.difficulty_calls(), 1);
    }

    #[tokio::test]
    async fn test_go_to_current_topic_is_noop() {
        let (orchestrator, _) = orchestrator(ScriptedService::default());
        assert!(orchestrator.go_to("Loom").await);
        let generation = orchestrator.generation();

        assert!(!orchestrator.go_to(" LOOM ").await);
        assert_eq!(orchestrator.generation(), generation);
        assert_eq!(orchestrator.journey().len(), 2);
        assert_eq!(orchestrator.journey().index(), 1);
    }

    #[tokio::test]
    async fn test_jump_then_go_to_branches() {
        let (orchestrator, _) = orchestrator(ScriptedService::default());
        orchestrator.go_to("B").await;
        orchestrator.go_to("C").await;

        assert!(orchestrator.jump_to(0).await);
        assert_eq!(orchestrator.view().topic, "Weave");

        orchestrator.go_to("D").await;
        let journey = orchestrator.journey();
        assert_eq!(journey.topics(), &["Weave", "D"]);
        assert_eq!(journey.index(), 1);
        assert_eq!(orchestrator.view().topic, "D");
    }

    #[tokio::test]
    async fn test_translate_and_revert() {
        let (orchestrator, service) = orchestrator(ScriptedService::default());
        orchestrator.load("Loom").await;

        assert!(orchestrator.translate("fr").await);
        let view = orchestrator.view();
        assert_eq!(view.display_text(), "[fr] Loom is a thing.");
        assert_eq!(service.translate_calls(), 1);

        assert!(orchestrator.translate("en").await);
        let view = orchestrator.view();
        assert!(view.translation.is_none());
        assert_eq!(view.display_text(), "Loom is a thing.");
        assert_eq!(service.translate_calls(), 1);
    }

    #[tokio::test]
    async fn test_translate_failure_only_sets_translation_error() {
        let service = ScriptedService {
            translation_error: Some(failure("translator offline")),
            ..ScriptedService::default()
        };
        let (orchestrator, _) = orchestrator(service);
        orchestrator.load("Loom").await;
        let before = orchestrator.view();

        assert!(orchestrator.translate("de").await);
        let after = orchestrator.view();
        assert_eq!(after.definition, before.definition);
        assert_eq!(after.errors.len(), 1);
        assert!(after
            .error(Feature::Translation)
            .unwrap()
            .contains("translator offline"));
    }

    #[tokio::test]
    async fn test_translate_rejected_without_definition() {
        let (orchestrator, service) = orchestrator(ScriptedService::default());
        assert!(!orchestrator.translate("fr").await);
        assert_eq!(service.translate_calls(), 0);
    }
}
