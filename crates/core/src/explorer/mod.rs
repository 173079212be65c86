//! # Explorer
//!
//! Per-topic content orchestration and the application shell around it.
//!
//! ## Flow
//!
//! ```text
//! AppShell::boot ─▶ probe ─▶ Ready ─▶ ContentOrchestrator::load(current topic)
//!                        └─▶ ConfigError (terminal)
//! ```

pub mod events;
pub mod generation;
pub mod orchestrator;
pub mod shell;

pub use events::{ViewEvent, ViewEventKind};
pub use generation::{Generation, GenerationGuard};
pub use orchestrator::ContentOrchestrator;
pub use shell::{AppShell, ShellStatus};
