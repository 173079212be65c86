//! # Content Service
//!
//! The seam between the orchestrator and the gateway. Each method is one
//! consumed contract: structured single-shot fetches, the incremental
//! definition stream, the translation transform and the startup probe.

use super::payloads;
use super::probe::ProbeOutcome;
use super::prompts::{self, schemas};
use crate::config::ExplorerConfig;
use crate::error::ContentError;
use crate::gateway::{GatewayClient, GatewayRequest, TextStream};
use crate::models::{GenerationConfig, ModelConfig};
use crate::state::{DifficultyRating, Feature, HistoricalFact};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

#[async_trait]
pub trait ContentService: Send + Sync {
    /// Startup connectivity check
    async fn probe(&self) -> ProbeOutcome;

    /// Definition text as an ordered, finite stream of fragments
    async fn stream_definition(&self, topic: &str) -> Result<TextStream, ContentError>;

    async fn ascii_art(&self, topic: &str) -> Result<String, ContentError>;

    /// At most four related topics
    async fn related_topics(&self, topic: &str) -> Result<Vec<String>, ContentError>;

    async fn historical_fact(&self, topic: &str) -> Result<HistoricalFact, ContentError>;

    async fn animation_frames(&self, topic: &str) -> Result<Vec<String>, ContentError>;

    async fn rate_difficulty(&self, text: &str) -> Result<DifficultyRating, ContentError>;

    /// Translate `text`; the base language returns it unchanged without a call
    async fn translate(&self, text: &str, language: &str) -> Result<String, ContentError>;
}

/// [`ContentService`] backed by the proxy gateway
#[derive(Debug, Clone)]
pub struct GatewayContentService {
    client: GatewayClient,
    models: ModelConfig,
    base_language: String,
}

impl GatewayContentService {
    pub fn new(client: GatewayClient, config: &ExplorerConfig) -> Self {
        Self {
            client,
            models: config.models.clone(),
            base_language: config.base_language.clone(),
        }
    }

    /// Build the client and service in one step
    pub fn from_config(config: &ExplorerConfig) -> anyhow::Result<Self> {
        Ok(Self::new(GatewayClient::new(config)?, config))
    }

    async fn structured(
        &self,
        feature: Feature,
        prompt: String,
        schema: Value,
    ) -> Result<String, ContentError> {
        let request = GatewayRequest::new(self.models.for_feature(feature), prompt)
            .with_config(&GenerationConfig::structured(schema));
        self.client.generate(&request).await
    }
}

#[async_trait]
impl ContentService for GatewayContentService {
    async fn probe(&self) -> ProbeOutcome {
        let request = GatewayRequest::new(&self.models.probe, prompts::PROBE)
            .with_config(&GenerationConfig::fast_text());

        match self.client.generate(&request).await {
            Ok(_) => {
                tracing::info!(gateway = self.client.url(), "Gateway connectivity confirmed");
                ProbeOutcome::ok()
            }
            Err(e) => {
                tracing::warn!(gateway = self.client.url(), error = %e, "Gateway probe failed");
                ProbeOutcome::failed(&e)
            }
        }
    }

    async fn stream_definition(&self, topic: &str) -> Result<TextStream, ContentError> {
        let request = GatewayRequest::new(
            self.models.for_feature(Feature::Definition),
            prompts::for_topic(prompts::DEFINITION, topic),
        )
        .with_config(&GenerationConfig::fast_text())
        .streaming();

        let stream = self
            .client
            .stream(&request)
            .await
            .map_err(|e| e.into_stream(topic))?;

        let topic = topic.to_string();
        Ok(stream
            .map(move |fragment| fragment.map_err(|e| e.into_stream(&topic)))
            .boxed())
    }

    async fn ascii_art(&self, topic: &str) -> Result<String, ContentError> {
        let raw = self
            .structured(
                Feature::Art,
                prompts::for_topic(prompts::ASCII_ART, topic),
                schemas::art(),
            )
            .await?;
        payloads::parse_art(&raw)
    }

    async fn related_topics(&self, topic: &str) -> Result<Vec<String>, ContentError> {
        let raw = self
            .structured(
                Feature::Related,
                prompts::for_topic(prompts::RELATED, topic),
                schemas::related(),
            )
            .await?;
        payloads::parse_related(&raw)
    }

    async fn historical_fact(&self, topic: &str) -> Result<HistoricalFact, ContentError> {
        let raw = self
            .structured(
                Feature::Fact,
                prompts::for_topic(prompts::FACT, topic),
                schemas::fact(),
            )
            .await?;
        payloads::parse_fact(&raw)
    }

    async fn animation_frames(&self, topic: &str) -> Result<Vec<String>, ContentError> {
        let raw = self
            .structured(
                Feature::Animation,
                prompts::for_topic(prompts::ANIMATION, topic),
                schemas::animation(),
            )
            .await?;
        payloads::parse_animation(&raw)
    }

    async fn rate_difficulty(&self, text: &str) -> Result<DifficultyRating, ContentError> {
        let raw = self
            .structured(
                Feature::Difficulty,
                prompts::for_text(prompts::DIFFICULTY, text),
                schemas::difficulty(),
            )
            .await?;
        payloads::parse_difficulty(&raw)
    }

    async fn translate(&self, text: &str, language: &str) -> Result<String, ContentError> {
        if language.eq_ignore_ascii_case(&self.base_language) {
            return Ok(text.to_string());
        }

        let request = GatewayRequest::new(
            self.models.for_feature(Feature::Translation),
            prompts::for_translation(text, language),
        )
        .with_config(&GenerationConfig::fast_text());

        let translated = self.client.generate(&request).await?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err(ContentError::invalid(
                Feature::Translation,
                "empty translation",
            ));
        }
        Ok(translated.to_string())
    }
}
