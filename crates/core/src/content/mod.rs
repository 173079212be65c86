//! # Content
//!
//! Everything fetched per topic: prompts, payload validation, the
//! connectivity probe and the [`ContentService`] seam.

pub mod payloads;
pub mod probe;
pub mod prompts;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use probe::{diagnose, ProbeOutcome};
pub use service::{ContentService, GatewayContentService};
