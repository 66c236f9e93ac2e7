//! Startup validation for the bridge configuration.

use std::collections::HashSet;

use secrecy::ExposeSecret;

use crate::{env_subst::has_placeholder, schema::BridgeConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "telegram.chat_id".
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(path: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.to_owned(),
            message: message.into(),
        }
    }

    fn warning(path: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.to_owned(),
            message: message.into(),
        }
    }
}

/// Check a loaded config for startup-blocking problems.
///
/// Any `Severity::Error` diagnostic means the bridge cannot run.
#[must_use]
pub fn validate(config: &BridgeConfig) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    check_token("discord.token", config.discord.token.expose_secret(), &mut diags);
    check_token("telegram.token", config.telegram.token.expose_secret(), &mut diags);

    if config.telegram.chat_id == 0 {
        diags.push(Diagnostic::error(
            "telegram.chat_id",
            "bridged supergroup chat id is not set",
        ));
    }

    if config.portals.is_empty() {
        diags.push(Diagnostic::error("portals", "no portals configured"));
    }

    let mut discord_seen = HashSet::new();
    let mut telegram_seen = HashSet::new();
    for (i, portal) in config.portals.iter().enumerate() {
        if portal.discord_channel.is_empty() || portal.telegram_topic.is_empty() {
            diags.push(Diagnostic::error(
                &format!("portals[{i}]"),
                "portal entries need both a discord_channel and a telegram_topic",
            ));
            continue;
        }
        if !discord_seen.insert(portal.discord_channel.clone()) {
            diags.push(Diagnostic::error(
                &format!("portals[{i}].discord_channel"),
                format!("duplicate discord channel {}", portal.discord_channel),
            ));
        }
        if !telegram_seen.insert(portal.telegram_topic.clone()) {
            diags.push(Diagnostic::error(
                &format!("portals[{i}].telegram_topic"),
                format!("duplicate telegram topic {}", portal.telegram_topic),
            ));
        }
    }

    if config.log_capacity == 0 {
        diags.push(Diagnostic::error(
            "log_capacity",
            "correlation window must hold at least one message",
        ));
    } else if config.log_capacity > 10_000 {
        // Lookups are linear scans; very large windows get slow.
        diags.push(Diagnostic::warning(
            "log_capacity",
            format!("{} is unusually large for a linear-scan window", config.log_capacity),
        ));
    }

    diags
}

fn check_token(path: &str, token: &str, diags: &mut Vec<Diagnostic>) {
    if token.is_empty() {
        diags.push(Diagnostic::error(path, "token is not set"));
    } else if has_placeholder(token) {
        diags.push(Diagnostic::error(
            path,
            format!("unresolved environment placeholder: {token}"),
        ));
    }
}

/// Returns `true` if any diagnostic is an error.
#[must_use]
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.severity == Severity::Error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {
        super::*,
        crate::schema::{PortalEntry, TelegramConfig},
        secrecy::Secret,
    };

    fn valid_config() -> BridgeConfig {
        BridgeConfig {
            discord: crate::schema::DiscordConfig {
                token: Secret::new("d-tok".into()),
            },
            telegram: TelegramConfig {
                token: Secret::new("123:ABC".into()),
                chat_id: -1002236257203,
            },
            portals: vec![PortalEntry {
                discord_channel: "1272631543034023948".into(),
                telegram_topic: "240".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(!has_errors(&validate(&valid_config())));
    }

    #[test]
    fn empty_tokens_are_errors() {
        let diags = validate(&BridgeConfig::default());
        assert!(has_errors(&diags));
        assert!(diags.iter().any(|d| d.path == "discord.token"));
        assert!(diags.iter().any(|d| d.path == "telegram.token"));
    }

    #[test]
    fn unresolved_placeholder_is_error() {
        let mut cfg = valid_config();
        cfg.discord.token = Secret::new("${DISCORD_BOT_TOKEN}".into());
        let diags = validate(&cfg);
        assert!(diags.iter().any(|d| {
            d.path == "discord.token" && d.message.contains("placeholder")
        }));
    }

    #[test]
    fn duplicate_portal_ids_are_errors() {
        let mut cfg = valid_config();
        cfg.portals.push(cfg.portals[0].clone());
        let diags = validate(&cfg);
        assert!(diags.iter().any(|d| d.path.ends_with("discord_channel")));
        assert!(diags.iter().any(|d| d.path.ends_with("telegram_topic")));
    }

    #[test]
    fn zero_capacity_is_error() {
        let mut cfg = valid_config();
        cfg.log_capacity = 0;
        assert!(has_errors(&validate(&cfg)));
    }

    #[test]
    fn huge_capacity_is_warning_only() {
        let mut cfg = valid_config();
        cfg.log_capacity = 100_000;
        let diags = validate(&cfg);
        assert!(!has_errors(&diags));
        assert!(diags.iter().any(|d| d.severity == Severity::Warning));
    }
}
