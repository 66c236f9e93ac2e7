//! Cross-platform message identity and relay correlation engine.
//!
//! This crate holds the platform-agnostic heart of the bridge: the bounded
//! correlation log that pairs native message ids across platforms, the
//! identity-proxy registry (one send-as handle per author per portal), the
//! portal map, and the orchestrator that composes them with the two
//! platform adapters. It has no platform SDK dependencies; adapters plug
//! in through the [`PortalAdapter`] trait.

pub mod adapter;
pub mod bridge;
pub mod log;
pub mod message;
pub mod portal;
pub mod proxy;
pub mod transcode;

pub use {
    adapter::PortalAdapter,
    bridge::{Bridge, DropReason, IgnoreReason, RelayOutcome},
    log::{CorrelationLog, DEFAULT_LOG_CAPACITY},
    message::{InboundMessage, RelayedMessage},
    portal::PortalMap,
    proxy::ProxyRegistry,
    transcode::{ContentTranscoder, PlainTranscoder},
};
