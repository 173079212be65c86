//! # Weavewiki Core
//!
//! The "Brain" of Weavewiki - topic journeys, per-topic content
//! orchestration, and the client for the credential-holding gateway.
//!
//! ## Architecture
//!
//! - `state/` - Journey history and the view state renderers read
//! - `content/` - Prompts, payload validation, probe, and the `ContentService` seam
//! - `gateway/` - HTTP client and wire types for the proxy
//! - `explorer/` - Generation guard, orchestrator, and application shell
//! - `models` / `config` - Model selection and client-side settings
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weavewiki_core::{config::ExplorerConfig, content::GatewayContentService};
//! use weavewiki_core::explorer::AppShell;
//! use weavewiki_core::state::Journey;
//!
//! let config = ExplorerConfig::default();
//! let service = Arc::new(GatewayContentService::from_config(&config)?);
//! let shell = AppShell::new(service, config, Journey::new("Weave"));
//! shell.boot().await;
//! shell.go_to("Jacquard loom").await;
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod explorer;
pub mod gateway;
pub mod models;
pub mod state;

pub use error::ContentError;
