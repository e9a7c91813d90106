use async_trait::async_trait;

use crate::{
    domain::{ChannelId, GuildId, MessageId, UserId},
    Result,
};

/// A message as returned by a follow-up fetch, with any platform-generated
/// embeds materialized.
#[derive(Clone, Debug)]
pub struct FetchedMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author: UserId,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    pub embeds: Vec<EmbedRef>,
}

#[derive(Clone, Debug)]
pub struct AttachmentRef {
    pub url: String,
    /// The uploader marked the file spoiler (filename convention).
    pub spoiler: bool,
}

#[derive(Clone, Debug)]
pub struct EmbedRef {
    pub url: Option<String>,
    pub has_video: bool,
    /// Embed rendering was already suppressed on the message.
    pub suppressed: bool,
}

/// Who an outgoing message may ping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MentionPolicy {
    /// Mentions render but resolve to no ping.
    Suppress,
    /// Only the named user may be pinged.
    AllowUser(UserId),
}

/// Port over the chat platform's HTTP surface.
///
/// Discord is the first implementation; the relay logic only ever talks to
/// this trait.
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Re-fetch a message by id. `Ok(None)` when it no longer exists.
    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<Option<FetchedMessage>>;

    async fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
        mentions: MentionPolicy,
    ) -> Result<MessageId>;

    /// Send `text` as a threaded reply to an existing message.
    async fn reply_to_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        text: &str,
        mentions: MentionPolicy,
    ) -> Result<MessageId>;

    /// Returns `Err(Error::NotFound)` when the message was already gone.
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Hide the platform's auto-generated embeds on a message. Best-effort.
    async fn suppress_embeds(&self, channel: ChannelId, message: MessageId) -> Result<()>;
}

/// Durable source-message → relayed-message table.
///
/// Single-row operations, each individually atomic at the storage layer.
pub trait MappingStore: Send + Sync {
    fn lookup(&self, source: MessageId) -> Result<Option<MessageId>>;
    fn insert(&self, source: MessageId, linked: MessageId) -> Result<()>;
    fn remove(&self, source: MessageId) -> Result<()>;
}
