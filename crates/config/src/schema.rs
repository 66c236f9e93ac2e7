use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default correlation-log capacity when the config omits it.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bounded window of relayed messages kept for reply/edit/delete
    /// correlation.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    pub discord: DiscordConfig,
    pub telegram: TelegramConfig,

    /// Paired channels: one entry per bridged conversation.
    pub portals: Vec<PortalEntry>,
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

/// Discord bot credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

/// Telegram bot credentials and the bridged supergroup.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// The forum supergroup whose topics are bridged.
    pub chat_id: i64,
}

/// One portal: a Discord channel paired with a Telegram forum topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalEntry {
    pub discord_channel: String,
    pub telegram_topic: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            chat_id: 0,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.log_capacity, DEFAULT_LOG_CAPACITY);
        assert!(cfg.portals.is_empty());
        assert_eq!(cfg.telegram.chat_id, 0);
    }

    #[test]
    fn deserialize_from_toml() {
        let toml = r#"
            log_capacity = 50

            [discord]
            token = "d-tok"

            [telegram]
            token = "123:ABC"
            chat_id = -1002236257203

            [[portals]]
            discord_channel = "1272631543034023948"
            telegram_topic  = "240"
        "#;
        let cfg: BridgeConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.log_capacity, 50);
        assert_eq!(cfg.discord.token.expose_secret(), "d-tok");
        assert_eq!(cfg.telegram.chat_id, -1002236257203);
        assert_eq!(cfg.portals.len(), 1);
        assert_eq!(cfg.portals[0].telegram_topic, "240");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.log_capacity, DEFAULT_LOG_CAPACITY);
        assert!(cfg.discord.token.expose_secret().is_empty());
    }

    #[test]
    fn debug_redacts_tokens() {
        let cfg: BridgeConfig = toml::from_str("[discord]\ntoken = \"hunter2\"").unwrap();
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn serialize_roundtrip() {
        let cfg = BridgeConfig {
            telegram: TelegramConfig {
                token: Secret::new("tok".into()),
                chat_id: -42,
            },
            ..Default::default()
        };
        let toml_str = toml::to_string(&cfg).unwrap();
        let cfg2: BridgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(cfg2.telegram.chat_id, -42);
        assert_eq!(cfg2.telegram.token.expose_secret(), "tok");
    }
}
