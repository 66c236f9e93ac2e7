use std::{future::Future, time::Duration};

use {
    anyhow::{Context, Result},
    async_trait::async_trait,
    teloxide::{
        ApiError, RequestError,
        payloads::{
            EditMessageCaptionSetters, EditMessageTextSetters, SendMediaGroupSetters,
            SendMessageSetters, SendVoiceSetters,
        },
        prelude::*,
        types::{
            ChatId, InputFile, InputMedia, InputMediaAudio, InputMediaDocument, InputMediaPhoto,
            InputMediaVideo, MessageId, ParseMode, ReplyParameters, ThreadId,
        },
    },
    tracing::warn,
};

use {
    tgcord_common::{Attachment, AttachmentKind, Platform},
    tgcord_relay::{PortalAdapter, RelayedMessage},
};

use crate::markdown;

const RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Outbound adapter posting mirrored messages into forum topics of the
/// bridged supergroup. All mirrors are sent by the one bot identity; the
/// original author is carried in a bold name prefix instead of a proxy.
pub struct TelegramPortal {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramPortal {
    #[must_use]
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl PortalAdapter for TelegramPortal {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn post_message(
        &self,
        message: &RelayedMessage,
        _proxy: Option<&str>,
    ) -> Result<String> {
        let thread = thread_of(&message.portal);
        let rp = parse_reply_params(message.telegram_reply_to.as_deref());
        let body = formatted_body(message);

        if let Some(voice_url) = &message.attachments.voice {
            let input_url: url::Url = voice_url.parse()?;
            let caption = format!("{}:", message.author.display_name);
            let sent = with_retry("send voice", || {
                let mut req = self
                    .bot
                    .send_voice(self.chat_id, InputFile::url(input_url.clone()))
                    .caption(caption.clone());
                if let Some(thread) = thread {
                    req = req.message_thread_id(thread);
                }
                if let Some(rp) = &rp {
                    req = req.reply_parameters(rp.clone());
                }
                async move { req.await }
            })
            .await?;
            return Ok(sent.id.0.to_string());
        }

        if !message.attachments.media.is_empty() {
            let group = build_media_group(&message.attachments.media, &body)?;
            let sent = with_retry("send media group", || {
                let mut req = self.bot.send_media_group(self.chat_id, group.clone());
                if let Some(thread) = thread {
                    req = req.message_thread_id(thread);
                }
                if let Some(rp) = &rp {
                    req = req.reply_parameters(rp.clone());
                }
                async move { req.await }
            })
            .await?;
            let first = sent.first().context("media group send returned no messages")?;
            return Ok(first.id.0.to_string());
        }

        let sent = with_retry("send message", || {
            let mut req = self
                .bot
                .send_message(self.chat_id, body.clone())
                .parse_mode(ParseMode::Html);
            if let Some(thread) = thread {
                req = req.message_thread_id(thread);
            }
            if let Some(rp) = &rp {
                req = req.reply_parameters(rp.clone());
            }
            async move { req.await }
        })
        .await?;
        Ok(sent.id.0.to_string())
    }

    async fn edit_message(&self, message: &RelayedMessage, _proxy: Option<&str>) -> Result<()> {
        let id = counterpart_id(message)?;
        let body = formatted_body(message);

        // Media mirrors carry their text as a caption; Telegram rejects
        // editMessageText on them.
        let result = if message.attachments.is_empty() {
            with_retry("edit message text", || {
                let req = self
                    .bot
                    .edit_message_text(self.chat_id, id, body.clone())
                    .parse_mode(ParseMode::Html);
                async move { req.await.map(|_| ()) }
            })
            .await
        } else {
            with_retry("edit message caption", || {
                let req = self
                    .bot
                    .edit_message_caption(self.chat_id, id)
                    .caption(body.clone())
                    .parse_mode(ParseMode::Html);
                async move { req.await.map(|_| ()) }
            })
            .await
        };
        result.or_else(ignore_not_modified)?;
        Ok(())
    }

    async fn delete_message(&self, message: &RelayedMessage) -> Result<()> {
        let id = counterpart_id(message)?;
        self.bot.delete_message(self.chat_id, id).await?;
        Ok(())
    }

    async fn create_identity_proxy(
        &self,
        _portal: &str,
        _author: &tgcord_common::Author,
    ) -> Result<String> {
        anyhow::bail!("telegram mirrors are posted by the shared bot, not per-author proxies")
    }
}

/// `<b>name</b>: content`, with the name HTML-escaped. The content arrives
/// already transcoded to Telegram HTML.
fn formatted_body(message: &RelayedMessage) -> String {
    format!(
        "<b>{}</b>: {}",
        markdown::escape_html(&message.author.display_name),
        message.content
    )
}

/// Forum topic ids are message ids of the topic opener. The general topic
/// has no thread id on the wire; it is configured as "0" or left unmapped.
fn thread_of(portal: &str) -> Option<ThreadId> {
    portal
        .parse::<i32>()
        .ok()
        .filter(|n| *n > 0)
        .map(|n| ThreadId(MessageId(n)))
}

/// Telegram message ids are i32; anything else means the id never came
/// from Telegram and the reply link is dropped.
fn parse_reply_params(reply_to: Option<&str>) -> Option<ReplyParameters> {
    reply_to
        .and_then(|id| id.parse::<i32>().ok())
        .map(|id| ReplyParameters::new(MessageId(id)).allow_sending_without_reply())
}

fn counterpart_id(message: &RelayedMessage) -> Result<MessageId> {
    let raw = message
        .telegram_id
        .as_deref()
        .context("message has no telegram-side id")?;
    let id = raw
        .parse::<i32>()
        .with_context(|| format!("invalid telegram message id: {raw}"))?;
    Ok(MessageId(id))
}

/// One media group per relayed message; the formatted body rides as the
/// caption of the first item only.
fn build_media_group(media: &[Attachment], caption: &str) -> Result<Vec<InputMedia>> {
    let mut group = Vec::with_capacity(media.len());
    for (i, attachment) in media.iter().enumerate() {
        let input = InputFile::url(attachment.url.parse()?);
        let captioned = i == 0;
        let item = match attachment.kind {
            AttachmentKind::Photo => {
                let mut m = InputMediaPhoto::new(input);
                if captioned {
                    m = m.caption(caption).parse_mode(ParseMode::Html);
                }
                InputMedia::Photo(m)
            },
            AttachmentKind::Video => {
                let mut m = InputMediaVideo::new(input);
                if captioned {
                    m = m.caption(caption).parse_mode(ParseMode::Html);
                }
                InputMedia::Video(m)
            },
            AttachmentKind::Audio => {
                let mut m = InputMediaAudio::new(input);
                if captioned {
                    m = m.caption(caption).parse_mode(ParseMode::Html);
                }
                InputMedia::Audio(m)
            },
            AttachmentKind::Document => {
                let mut m = InputMediaDocument::new(input);
                if captioned {
                    m = m.caption(caption).parse_mode(ParseMode::Html);
                }
                InputMedia::Document(m)
            },
        };
        group.push(item);
    }
    Ok(group)
}

async fn with_retry<T, F, Fut>(
    operation: &'static str,
    mut request: F,
) -> std::result::Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    let mut retries = 0usize;
    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };
                if retries >= RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }
                retries += 1;
                warn!(
                    operation,
                    retries,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn ignore_not_modified(error: RequestError) -> std::result::Result<(), RequestError> {
    if matches!(&error, RequestError::Api(ApiError::MessageNotModified)) {
        Ok(())
    } else {
        Err(error)
    }
}
