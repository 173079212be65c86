//! # Gateway
//!
//! Client side of the credential-holding proxy.
//!
//! ```text
//! GatewayClient ── POST /api/generate ──▶ Proxy Gateway ──▶ upstream model API
//!       ◀── {"text": ...} | chunked text | {"error", "code"} ──┘
//! ```

pub mod client;
pub mod utf8;
pub mod wire;

pub use client::{GatewayClient, TextStream};
pub use utf8::Utf8Decoder;
pub use wire::{ErrorBody, GatewayRequest, TextEnvelope};
