//! Discord event handler for serenity.
//!
//! Normalizes gateway events into relay events and feeds them to the
//! bridge.

use std::sync::Arc;

use {
    serenity::{
        all::{
            ChannelId, Context, EventHandler, GatewayIntents, GuildId, Message, MessageId,
            MessageUpdateEvent, Ready,
        },
        async_trait,
    },
    tracing::{debug, info},
};

use {
    tgcord_common::{Attachment, Attachments, Author, Platform, media::classify_mime},
    tgcord_relay::{Bridge, InboundMessage},
};

/// Handler for Discord gateway events.
pub struct DiscordHandler {
    bridge: Arc<Bridge>,
}

impl DiscordHandler {
    #[must_use]
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    /// Required gateway intents for the bridge.
    #[must_use]
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let inbound = normalize_message(&msg);
        let outcome = self.bridge.handle_create(inbound).await;
        debug!(message_id = %msg.id, outcome = ?outcome, "discord message handled");
    }

    async fn message_update(
        &self,
        _ctx: Context,
        _old_if_available: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        // Our own webhook edits come back through the gateway; relaying
        // them again would bounce every edit once more.
        if event.author.as_ref().is_some_and(|a| a.bot) {
            return;
        }
        let Some(content) = &event.content else {
            // Embed/pin updates carry no content change.
            return;
        };
        let outcome = self
            .bridge
            .handle_edit(Platform::Discord, &event.id.to_string(), content)
            .await;
        debug!(message_id = %event.id, outcome = ?outcome, "discord edit handled");
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        _channel_id: ChannelId,
        deleted_message_id: MessageId,
        _guild_id: Option<GuildId>,
    ) {
        let outcome = self
            .bridge
            .handle_delete(Platform::Discord, &deleted_message_id.to_string())
            .await;
        debug!(message_id = %deleted_message_id, outcome = ?outcome, "discord delete handled");
    }
}

fn normalize_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        source: Platform::Discord,
        channel: msg.channel_id.to_string(),
        native_id: msg.id.to_string(),
        content: msg.content.clone(),
        reply_to: msg
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(|id| id.to_string()),
        author: author_of(msg),
        // Covers bots and webhooks, including our own mirrors.
        from_automated: msg.author.bot,
        attachments: attachments_of(msg),
    }
}

fn author_of(msg: &Message) -> Author {
    let display_name = msg
        .author
        .global_name
        .clone()
        .unwrap_or_else(|| msg.author.name.clone());
    let mut author = Author::new(msg.author.id.to_string(), display_name);
    author.avatar_url = msg.author.avatar_url();
    author
}

fn attachments_of(msg: &Message) -> Attachments {
    let mut attachments = Attachments::default();
    for attachment in &msg.attachments {
        // Voice messages are the one attachment type that ships a
        // waveform.
        if attachment.waveform.is_some() {
            attachments.voice = Some(attachment.url.clone());
            continue;
        }
        let kind = classify_mime(attachment.content_type.as_deref().unwrap_or_default());
        attachments.media.push(Attachment {
            kind,
            url: attachment.url.clone(),
        });
    }
    attachments
}
