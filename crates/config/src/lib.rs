//! Configuration for the tgcord bridge: schema, loading, env substitution,
//! and validation.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::ConfigError,
    loader::{discover_and_load, load_config},
    schema::{BridgeConfig, DiscordConfig, PortalEntry, TelegramConfig},
    validate::{Diagnostic, Severity, has_errors, validate},
};
