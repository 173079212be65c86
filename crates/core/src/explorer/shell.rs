//! # Application Shell
//!
//! `Validating ─▶ ConfigError (terminal) | Ready`
//!
//! The orchestrator only runs once the connectivity probe has passed.

use super::orchestrator::ContentOrchestrator;
use crate::config::ExplorerConfig;
use crate::content::ContentService;
use crate::state::Journey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ShellStatus {
    /// Startup probe not finished
    Validating,
    /// Probe failed; carries the administrator-facing diagnostic
    ConfigError(String),
    Ready,
}

pub struct AppShell {
    service: Arc<dyn ContentService>,
    orchestrator: ContentOrchestrator,
    status: RwLock<ShellStatus>,
}

impl AppShell {
    pub fn new(service: Arc<dyn ContentService>, config: ExplorerConfig, journey: Journey) -> Self {
        let orchestrator = ContentOrchestrator::new(service.clone(), config, journey);
        Self {
            service,
            orchestrator,
            status: RwLock::new(ShellStatus::Validating),
        }
    }

    pub async fn status(&self) -> ShellStatus {
        self.status.read().await.clone()
    }

    /// Event source and view snapshots for renderers
    pub fn orchestrator(&self) -> &ContentOrchestrator {
        &self.orchestrator
    }

    /// Run the startup probe once, then load the current topic if it passed.
    ///
    /// Calling again after the first run returns the settled status.
    pub async fn boot(&self) -> ShellStatus {
        {
            let status = self.status.read().await;
            if *status != ShellStatus::Validating {
                return status.clone();
            }
        }

        let outcome = self.service.probe().await;
        let status = if outcome.valid {
            ShellStatus::Ready
        } else {
            let message = outcome
                .message
                .unwrap_or_else(|| "The server configuration is invalid.".to_string());
            tracing::error!(%message, "Startup validation failed");
            ShellStatus::ConfigError(message)
        };
        *self.status.write().await = status.clone();

        if status == ShellStatus::Ready {
            let topic = self.orchestrator.current_topic();
            self.orchestrator.load(&topic).await;
        }
        status
    }

    async fn is_ready(&self) -> bool {
        *self.status.read().await == ShellStatus::Ready
    }

    pub async fn go_to(&self, input: &str) -> bool {
        self.is_ready().await && self.orchestrator.go_to(input).await
    }

    pub async fn jump_to(&self, index: usize) -> bool {
        self.is_ready().await && self.orchestrator.jump_to(index).await
    }

    pub async fn translate(&self, language: &str) -> bool {
        self.is_ready().await && self.orchestrator.translate(language).await
    }
}
