use std::sync::Arc;

use {
    anyhow::Result,
    chrono::{DateTime, Utc},
    secrecy::{ExposeSecret, Secret},
    teloxide::{
        ApiError, RequestError,
        payloads::GetUserProfilePhotosSetters,
        prelude::*,
        types::{
            AllowedUpdate, ChatId, MediaKind, Message, MessageKind, UpdateKind, User, UserId,
        },
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use {
    tgcord_common::{Attachment, Attachments, Author, Platform, media::classify_mime},
    tgcord_relay::{Bridge, InboundMessage},
};

/// Build a bot with a client timeout longer than the long-polling timeout
/// (30s) so the HTTP client doesn't abort the request before Telegram
/// responds.
pub fn connect(token: &Secret<String>) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    Ok(Bot::with_client(token.expose_secret(), client))
}

/// Start long polling the bridged supergroup.
///
/// Spawns a background task that feeds message and edit updates into the
/// bridge until the returned `CancellationToken` is cancelled. Updates
/// predating startup are skipped so a backlog accumulated while the bridge
/// was down is not replayed.
pub async fn start_polling(bot: Bot, chat_id: i64, bridge: Arc<Bridge>) -> Result<CancellationToken> {
    let me = bot.get_me().await?;
    let bot_id = me.id;

    // Long polling and webhooks are mutually exclusive.
    bot.delete_webhook().send().await?;

    info!(username = ?me.username, chat_id, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let chat_id = ChatId(chat_id);
    let started_at = Utc::now();

    tokio::spawn(async move {
        info!("starting telegram manual polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::EditedMessage])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                if skip_update(&msg, chat_id, started_at) {
                                    continue;
                                }
                                handle_message(&bot, bot_id, &bridge, &msg).await;
                            },
                            UpdateKind::EditedMessage(msg) => {
                                if skip_update(&msg, chat_id, started_at) {
                                    continue;
                                }
                                handle_edit(&bridge, &msg).await;
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another process polling with the same token wins;
                    // back off permanently instead of fighting over updates.
                    let is_conflict =
                        matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates));
                    if is_conflict {
                        warn!("telegram polling disabled: another instance is already running with this token");
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}

fn skip_update(msg: &Message, chat_id: ChatId, started_at: DateTime<Utc>) -> bool {
    if msg.chat.id != chat_id {
        debug!(chat_id = msg.chat.id.0, "ignoring message outside the bridged group");
        return true;
    }
    if msg.date < started_at {
        debug!(message_id = msg.id.0, "ignoring message predating startup");
        return true;
    }
    false
}

async fn handle_message(bot: &Bot, bot_id: UserId, bridge: &Bridge, msg: &Message) {
    let Some(inbound) = normalize_message(bot, bot_id, msg).await else {
        debug!(message_id = msg.id.0, "ignoring service message");
        return;
    };
    let outcome = bridge.handle_create(inbound).await;
    debug!(message_id = msg.id.0, outcome = ?outcome, "telegram message handled");
}

async fn handle_edit(bridge: &Bridge, msg: &Message) {
    let Some(content) = message_text(msg) else {
        debug!(message_id = msg.id.0, "ignoring edit without text or caption");
        return;
    };
    let outcome = bridge
        .handle_edit(Platform::Telegram, &msg.id.0.to_string(), content)
        .await;
    debug!(message_id = msg.id.0, outcome = ?outcome, "telegram edit handled");
}

/// Turn a Telegram message into a platform-agnostic relay event. Service
/// messages (topic created, member joined, ...) have no author and yield
/// `None`.
async fn normalize_message(bot: &Bot, bot_id: UserId, msg: &Message) -> Option<InboundMessage> {
    let from = msg.from.as_ref()?;

    // Every message in a topic "replies" to the topic opener; only an
    // explicit reply to another message is a real reply.
    let reply_to = msg.reply_to_message().and_then(|replied| {
        if msg.thread_id.is_some_and(|t| t.0 == replied.id) {
            None
        } else {
            Some(replied.id.0.to_string())
        }
    });

    Some(InboundMessage {
        source: Platform::Telegram,
        channel: topic_of(msg),
        native_id: msg.id.0.to_string(),
        content: message_text(msg).unwrap_or_default().to_owned(),
        reply_to,
        author: author_of(bot, from).await,
        from_automated: from.is_bot || from.id == bot_id,
        attachments: collect_attachments(bot, msg).await,
    })
}

/// Forum topic id as a string, empty for the general topic.
fn topic_of(msg: &Message) -> String {
    msg.thread_id.map(|t| t.0.0.to_string()).unwrap_or_default()
}

fn message_text(msg: &Message) -> Option<&str> {
    msg.text().or_else(|| msg.caption())
}

async fn author_of(bot: &Bot, from: &User) -> Author {
    let mut author = Author::new(from.id.to_string(), from.full_name());
    // Best effort; a missing avatar only means the proxy falls back to the
    // platform default.
    match avatar_url(bot, from).await {
        Ok(url) => author.avatar_url = url,
        Err(error) => {
            debug!(user_id = from.id.0, error = %error, "failed to resolve avatar");
        },
    }
    author
}

async fn avatar_url(bot: &Bot, from: &User) -> Result<Option<String>> {
    let photos = bot.get_user_profile_photos(from.id).limit(1).await?;
    let Some(best) = photos.photos.first().and_then(|sizes| sizes.last()) else {
        return Ok(None);
    };
    Ok(Some(file_url(bot, &best.file.id).await?))
}

async fn collect_attachments(bot: &Bot, msg: &Message) -> Attachments {
    let mut attachments = Attachments::default();
    let MessageKind::Common(common) = &msg.kind else {
        return attachments;
    };

    let resolved: Result<()> = async {
        match &common.media_kind {
            MediaKind::Voice(v) => {
                attachments.voice = Some(file_url(bot, &v.voice.file.id).await?);
            },
            MediaKind::Photo(p) => {
                // Largest size is last in the array.
                if let Some(size) = p.photo.last() {
                    attachments.media.push(Attachment {
                        kind: classify_mime("image/jpeg"),
                        url: file_url(bot, &size.file.id).await?,
                    });
                }
            },
            MediaKind::Video(v) => {
                attachments.media.push(Attachment {
                    kind: classify_mime("video/mp4"),
                    url: file_url(bot, &v.video.file.id).await?,
                });
            },
            MediaKind::VideoNote(v) => {
                attachments.media.push(Attachment {
                    kind: classify_mime("video/mp4"),
                    url: file_url(bot, &v.video_note.file.id).await?,
                });
            },
            MediaKind::Animation(a) => {
                attachments.media.push(Attachment {
                    kind: classify_mime("video/mp4"),
                    url: file_url(bot, &a.animation.file.id).await?,
                });
            },
            MediaKind::Audio(a) => {
                let mime = a
                    .audio
                    .mime_type
                    .as_ref()
                    .map_or("audio/mpeg".to_owned(), |m| m.essence_str().to_owned());
                attachments.media.push(Attachment {
                    kind: classify_mime(&mime),
                    url: file_url(bot, &a.audio.file.id).await?,
                });
            },
            MediaKind::Document(d) => {
                let mime = d
                    .document
                    .mime_type
                    .as_ref()
                    .map_or("application/octet-stream".to_owned(), |m| {
                        m.essence_str().to_owned()
                    });
                attachments.media.push(Attachment {
                    kind: classify_mime(&mime),
                    url: file_url(bot, &d.document.file.id).await?,
                });
            },
            MediaKind::Sticker(s) => {
                attachments.media.push(Attachment {
                    kind: classify_mime("image/webp"),
                    url: file_url(bot, &s.sticker.file.id).await?,
                });
            },
            _ => {},
        }
        Ok(())
    }
    .await;

    if let Err(error) = resolved {
        warn!(message_id = msg.id.0, error = %error, "failed to resolve attachment file url");
    }
    attachments
}

/// Bot API file downloads go through a token-scoped URL.
async fn file_url(bot: &Bot, file_id: &str) -> Result<String> {
    let file = bot.get_file(file_id).await?;
    Ok(format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    ))
}
