//! Discord adapter (serenity).
//!
//! This crate implements the `crossbot-core` ChatPort over the Discord HTTP
//! API and feeds gateway events into the core dispatcher.

use std::sync::Arc;

use async_trait::async_trait;

use serenity::builder::{CreateAllowedMentions, CreateMessage, EditMessage};
use serenity::http::{Http, HttpError};
use serenity::model::channel::{Message, MessageFlags};

pub mod handlers;
pub mod permissions;
pub mod router;

use crossbot_core::{
    domain::{ChannelId, GuildId, MessageId, UserId},
    errors::Error,
    ports::{AttachmentRef, ChatPort, EmbedRef, FetchedMessage, MentionPolicy},
    Result,
};

/// Uploads named like this render behind a spoiler overlay.
const SPOILER_PREFIX: &str = "SPOILER_";

pub struct DiscordChat {
    http: Arc<Http>,
}

impl DiscordChat {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn channel(id: ChannelId) -> serenity::model::id::ChannelId {
        serenity::model::id::ChannelId::new(id.0)
    }

    fn message(id: MessageId) -> serenity::model::id::MessageId {
        serenity::model::id::MessageId::new(id.0)
    }

    fn map_err(e: serenity::Error) -> Error {
        if is_not_found(&e) {
            Error::NotFound
        } else {
            Error::Platform(format!("discord error: {e}"))
        }
    }
}

fn is_not_found(e: &serenity::Error) -> bool {
    matches!(
        e,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp))
            if resp.status_code.as_u16() == 404
    )
}

fn allowed_mentions(mentions: MentionPolicy) -> CreateAllowedMentions {
    match mentions {
        MentionPolicy::Suppress => CreateAllowedMentions::new().replied_user(false),
        MentionPolicy::AllowUser(user) => CreateAllowedMentions::new()
            .users(vec![serenity::model::id::UserId::new(user.0)]),
    }
}

fn is_spoiler_filename(name: &str) -> bool {
    name.starts_with(SPOILER_PREFIX)
}

fn to_fetched_message(m: &Message) -> FetchedMessage {
    let suppressed = m
        .flags
        .map(|f| f.contains(MessageFlags::SUPPRESS_EMBEDS))
        .unwrap_or(false);

    FetchedMessage {
        id: MessageId(m.id.get()),
        channel_id: ChannelId(m.channel_id.get()),
        guild_id: m.guild_id.map(|g| GuildId(g.get())),
        author: UserId(m.author.id.get()),
        content: m.content.clone(),
        attachments: m
            .attachments
            .iter()
            .map(|a| AttachmentRef {
                url: a.url.clone(),
                spoiler: is_spoiler_filename(&a.filename),
            })
            .collect(),
        embeds: m
            .embeds
            .iter()
            .map(|e| EmbedRef {
                url: e.url.clone(),
                has_video: e.video.is_some(),
                suppressed,
            })
            .collect(),
    }
}

#[async_trait]
impl ChatPort for DiscordChat {
    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<Option<FetchedMessage>> {
        match self
            .http
            .get_message(Self::channel(channel), Self::message(message))
            .await
        {
            Ok(msg) => Ok(Some(to_fetched_message(&msg))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
        mentions: MentionPolicy,
    ) -> Result<MessageId> {
        let builder = CreateMessage::new()
            .content(text)
            .allowed_mentions(allowed_mentions(mentions));

        let msg = Self::channel(channel)
            .send_message(&*self.http, builder)
            .await
            .map_err(Self::map_err)?;

        Ok(MessageId(msg.id.get()))
    }

    async fn reply_to_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        text: &str,
        mentions: MentionPolicy,
    ) -> Result<MessageId> {
        let builder = CreateMessage::new()
            .content(text)
            .allowed_mentions(allowed_mentions(mentions))
            .reference_message((Self::channel(channel), Self::message(message)));

        let msg = Self::channel(channel)
            .send_message(&*self.http, builder)
            .await
            .map_err(Self::map_err)?;

        Ok(MessageId(msg.id.get()))
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        Self::channel(channel)
            .delete_message(&*self.http, Self::message(message))
            .await
            .map_err(Self::map_err)
    }

    async fn suppress_embeds(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        let builder = EditMessage::new().suppress_embeds(true);
        Self::channel(channel)
            .edit_message(&*self.http, Self::message(message), builder)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoiler_detection_follows_the_filename_convention() {
        assert!(is_spoiler_filename("SPOILER_art.png"));
        assert!(!is_spoiler_filename("art.png"));
        assert!(!is_spoiler_filename("spoiler_art.png"));
    }
}
