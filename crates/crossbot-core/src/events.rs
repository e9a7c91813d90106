use crate::classify::PermissionLevel;
use crate::domain::{ChannelId, GuildId, MessageId, UserId};

/// Inbound gateway events, with platform fields already mapped to core types.
///
/// The adapter produces one of these per delivery; each is consumed
/// independently, with no cross-event ordering requirement.
#[derive(Clone, Debug)]
pub enum InboundEvent {
    Created(MessageEvent),
    Deleted {
        message_id: MessageId,
        channel_id: ChannelId,
    },
    MemberLeft {
        guild_id: GuildId,
        user: DepartedUser,
    },
}

/// A freshly created message as seen in the gateway payload.
///
/// Embeds are deliberately absent here: the platform materializes link
/// previews asynchronously, so the dispatcher re-fetches by id after a delay
/// instead of trusting this snapshot.
#[derive(Clone, Debug)]
pub struct MessageEvent {
    pub id: MessageId,
    pub author: UserId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub content: String,
    pub has_attachments: bool,
    /// Resolved by the adapter from the author's guild roles.
    pub author_level: PermissionLevel,
}

#[derive(Clone, Debug)]
pub struct DepartedUser {
    pub id: UserId,
    pub display_name: String,
}
