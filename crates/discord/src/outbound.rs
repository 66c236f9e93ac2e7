use std::sync::Arc;

use {
    anyhow::{Context as _, Result},
    async_trait::async_trait,
    serenity::all::{
        ChannelId, CreateAttachment, CreateMessage, CreateWebhook, EditMessage,
        EditWebhookMessage, ExecuteWebhook, Http, MessageId, Webhook, WebhookId,
    },
    tracing::{debug, warn},
};

use {
    tgcord_common::{Author, Platform},
    tgcord_relay::{PortalAdapter, ProxyRegistry, RelayedMessage},
};

// Discord caps incoming webhooks per channel; prune before creating past
// this point.
const MAX_CHANNEL_WEBHOOKS: usize = 10;

const REPLY_QUOTE_MAX_CHARS: usize = 80;

/// Outbound adapter posting mirrored messages through per-author channel
/// webhooks. A failed or missing webhook degrades to a bot send with the
/// author's name inlined.
pub struct DiscordPortal {
    http: Arc<Http>,
    registry: Arc<ProxyRegistry>,
}

impl DiscordPortal {
    #[must_use]
    pub fn new(http: Arc<Http>, registry: Arc<ProxyRegistry>) -> Self {
        Self { http, registry }
    }

    /// Fetch the webhook behind `handle`, recreating it when the stored
    /// handle turns out stale (deleted server-side). A recreated webhook
    /// replaces the stale registry entry.
    async fn webhook_for(
        &self,
        channel: ChannelId,
        handle: &str,
        message: &RelayedMessage,
    ) -> Result<Webhook> {
        let id = parse_webhook_handle(handle)?;
        match Webhook::from_id(&self.http, id).await {
            Ok(webhook) => Ok(webhook),
            Err(error) => {
                warn!(
                    webhook_id = %id,
                    error = %error,
                    "stored webhook is stale, recreating"
                );
                let fresh = self.create_webhook(channel, &message.author).await?;
                self.registry
                    .update(&message.portal, &message.author.id, fresh.id.to_string());
                Ok(fresh)
            },
        }
    }

    async fn create_webhook(&self, channel: ChannelId, author: &Author) -> Result<Webhook> {
        let existing = channel.webhooks(&self.http).await?;
        if existing.len() >= MAX_CHANNEL_WEBHOOKS {
            // Evict one of ours to stay under the per-channel cap. Webhooks
            // without a token belong to other integrations.
            if let Some(victim) = existing.into_iter().find(|w| w.token.is_some()) {
                warn!(channel = %channel, webhook_id = %victim.id, "webhook cap reached, pruning");
                victim.delete(&self.http).await?;
            }
        }

        let mut builder = CreateWebhook::new(&author.display_name);
        let avatar = match &author.avatar_url {
            Some(url) => CreateAttachment::url(&self.http, url).await.ok(),
            None => None,
        };
        if let Some(avatar) = &avatar {
            builder = builder.avatar(avatar);
        }
        let webhook = channel.create_webhook(&self.http, builder).await?;
        debug!(channel = %channel, author = %author.id, webhook_id = %webhook.id, "created webhook");
        Ok(webhook)
    }

    /// Webhooks cannot use native replies, so a reply renders as a short
    /// quote of the target message above the content.
    async fn reply_quote(&self, channel: ChannelId, reply_to: &str) -> Option<String> {
        let id = reply_to.parse::<u64>().ok()?;
        let replied = channel.message(&self.http, MessageId::new(id)).await.ok()?;
        Some(quote_line(&replied.content))
    }

    async fn collect_files(&self, message: &RelayedMessage) -> Vec<CreateAttachment> {
        let mut files = Vec::new();
        let urls = message
            .attachments
            .voice
            .iter()
            .chain(message.attachments.media.iter().map(|a| &a.url));
        for url in urls {
            // The http client fetches the bytes and re-uploads them, so
            // token-scoped source urls never appear in the channel.
            match CreateAttachment::url(&self.http, url).await {
                Ok(file) => files.push(file),
                Err(error) => {
                    warn!(url, error = %error, "failed to fetch attachment for re-upload");
                },
            }
        }
        files
    }

    async fn post_via_webhook(
        &self,
        channel: ChannelId,
        handle: &str,
        message: &RelayedMessage,
        content: &str,
    ) -> Result<String> {
        let webhook = self.webhook_for(channel, handle, message).await?;

        let mut builder = ExecuteWebhook::new()
            .content(content)
            .username(&message.author.display_name);
        if let Some(avatar) = &message.author.avatar_url {
            builder = builder.avatar_url(avatar);
        }
        for file in self.collect_files(message).await {
            builder = builder.add_file(file);
        }

        let sent = webhook
            .execute(&self.http, true, builder)
            .await?
            .context("webhook execution returned no message")?;
        Ok(sent.id.to_string())
    }

    async fn post_via_bot(
        &self,
        channel: ChannelId,
        message: &RelayedMessage,
        content: &str,
    ) -> Result<String> {
        let mut builder =
            CreateMessage::new().content(bot_send_body(&message.author.display_name, content));
        if let Some(reply_id) = parse_message_id(message.discord_reply_to.as_deref()) {
            builder = builder.reference_message((channel, reply_id));
        }
        for file in self.collect_files(message).await {
            builder = builder.add_file(file);
        }

        let sent = channel.send_message(&self.http, builder).await?;
        Ok(sent.id.to_string())
    }
}

#[async_trait]
impl PortalAdapter for DiscordPortal {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    fn uses_identity_proxies(&self) -> bool {
        true
    }

    async fn post_message(&self, message: &RelayedMessage, proxy: Option<&str>) -> Result<String> {
        let channel = parse_channel(&message.portal)?;

        let content = match &message.discord_reply_to {
            // Native replies only exist on the bot path; webhook replies
            // become a quote prefix.
            Some(reply_to) if proxy.is_some() => {
                match self.reply_quote(channel, reply_to).await {
                    Some(quote) => format!("{quote}{}", message.content),
                    None => message.content.clone(),
                }
            },
            _ => message.content.clone(),
        };

        if let Some(handle) = proxy {
            match self.post_via_webhook(channel, handle, message, &content).await {
                Ok(id) => return Ok(id),
                Err(error) => {
                    warn!(
                        channel = %channel,
                        error = %error,
                        "webhook send failed, falling back to bot send"
                    );
                },
            }
        }
        self.post_via_bot(channel, message, &content).await
    }

    async fn edit_message(&self, message: &RelayedMessage, proxy: Option<&str>) -> Result<()> {
        let channel = parse_channel(&message.portal)?;
        let id = parse_message_id(message.discord_id.as_deref())
            .context("message has no discord-side id")?;

        match proxy {
            Some(handle) => {
                let webhook = self.webhook_for(channel, handle, message).await?;
                webhook
                    .edit_message(
                        &self.http,
                        id,
                        EditWebhookMessage::new().content(&message.content),
                    )
                    .await?;
            },
            // Proxyless mirrors were bot-sent with an inlined author name;
            // keep the prefix consistent on edit.
            None => {
                channel
                    .edit_message(
                        &self.http,
                        id,
                        EditMessage::new().content(bot_send_body(
                            &message.author.display_name,
                            &message.content,
                        )),
                    )
                    .await?;
            },
        }
        Ok(())
    }

    async fn delete_message(&self, message: &RelayedMessage) -> Result<()> {
        let channel = parse_channel(&message.portal)?;
        let id = parse_message_id(message.discord_id.as_deref())
            .context("message has no discord-side id")?;
        channel.delete_message(&self.http, id).await?;
        Ok(())
    }

    async fn create_identity_proxy(&self, portal: &str, author: &Author) -> Result<String> {
        let channel = parse_channel(portal)?;
        let webhook = self.create_webhook(channel, author).await?;
        Ok(webhook.id.to_string())
    }
}

// Serenity id constructors reject zero, so parse and check before
// converting.
fn parse_channel(portal: &str) -> Result<ChannelId> {
    portal
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
        .with_context(|| format!("invalid discord channel id: {portal}"))
}

fn parse_webhook_handle(handle: &str) -> Result<WebhookId> {
    handle
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(WebhookId::new)
        .with_context(|| format!("invalid webhook handle: {handle}"))
}

fn parse_message_id(raw: Option<&str>) -> Option<MessageId> {
    raw.and_then(|id| id.parse::<u64>().ok())
        .filter(|id| *id != 0)
        .map(MessageId::new)
}

fn bot_send_body(name: &str, content: &str) -> String {
    format!("`{name}`: {content}")
}

fn quote_line(replied_content: &str) -> String {
    let snippet: String = replied_content
        .chars()
        .take(REPLY_QUOTE_MAX_CHARS)
        .collect();
    // Quotes end at a newline, so the snippet must stay on one line.
    let snippet = snippet.replace('\n', " ");
    format!("> Re: {snippet}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn channel_ids_must_be_numeric() {
        assert!(parse_channel("123456789").is_ok());
        assert!(parse_channel("general").is_err());
        assert!(parse_channel("").is_err());
    }

    #[test]
    fn message_id_parsing_is_lenient() {
        assert_eq!(parse_message_id(Some("42")), Some(MessageId::new(42)));
        assert_eq!(parse_message_id(Some("nope")), None);
        assert_eq!(parse_message_id(None), None);
    }

    #[test]
    fn bot_send_inlines_author_name() {
        assert_eq!(bot_send_body("alice", "hi"), "`alice`: hi");
    }

    #[test]
    fn quote_stays_on_one_line_and_truncates() {
        assert_eq!(quote_line("short\nmultiline"), "> Re: short multiline\n");
        let long = "x".repeat(200);
        let quote = quote_line(&long);
        assert_eq!(quote.chars().count(), REPLY_QUOTE_MAX_CHARS + "> Re: \n".chars().count());
    }
}
