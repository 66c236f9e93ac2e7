//! Discord side of the bridge.
//!
//! Receives gateway events through serenity and mirrors messages from the
//! other platform into paired channels. Mirrors are posted through
//! per-author webhooks so each one carries the original author's name and
//! avatar instead of the bot identity.

pub mod handler;
pub mod outbound;

pub use {handler::DiscordHandler, outbound::DiscordPortal};
