//! Gateway event handlers.
//!
//! Serenity dispatches each event on its own task, so the delayed relay paths
//! suspend without holding up other events. Handlers convert serenity payloads
//! into core events and hand them to the dispatcher; only command execution
//! comes back here.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Member;
use serenity::model::user::User;
use serenity::prelude::*;

use tracing::info;

use crossbot_core::classify::PermissionLevel;
use crossbot_core::config::EditPolicy;
use crossbot_core::domain::{ChannelId, GuildId, MessageId, UserId};
use crossbot_core::events::{DepartedUser, InboundEvent, MessageEvent};
use crossbot_core::relay::Dispatch;

use crate::permissions;
use crate::router::AppState;

mod commands;

pub struct Handler {
    state: Arc<AppState>,
}

impl Handler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("connected as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Never process our own messages.
        if msg.author.id == self.state.self_id {
            return;
        }

        let event = to_message_event(&ctx, &self.state, &msg).await;
        match self.state.dispatcher.dispatch(InboundEvent::Created(event)).await {
            Dispatch::Command { event, body_start } => {
                commands::execute(&ctx, &msg, &event.content[body_start..]).await;
            }
            Dispatch::Handled => {}
        }
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: serenity::model::id::ChannelId,
        deleted_message_id: serenity::model::id::MessageId,
        _guild_id: Option<serenity::model::id::GuildId>,
    ) {
        self.state
            .dispatcher
            .dispatch(InboundEvent::Deleted {
                message_id: MessageId(deleted_message_id.get()),
                channel_id: ChannelId(channel_id.get()),
            })
            .await;
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: serenity::model::id::GuildId,
        user: User,
        _member_data: Option<Member>,
    ) {
        // Scope to the configured guild when one is set.
        if let Some(scoped) = self.state.cfg.guild_id {
            if scoped.0 != guild_id.get() {
                return;
            }
        }

        let display_name = user.global_name.clone().unwrap_or_else(|| user.name.clone());
        self.state
            .dispatcher
            .dispatch(InboundEvent::MemberLeft {
                guild_id: GuildId(guild_id.get()),
                user: DepartedUser {
                    id: UserId(user.id.get()),
                    display_name,
                },
            })
            .await;
    }
}

async fn to_message_event(ctx: &Context, state: &AppState, msg: &Message) -> MessageEvent {
    // Role lookups cost two HTTP calls, so only resolve the author's level
    // for command-shaped content, and not at all when everyone may command;
    // everything else classifies as Member.
    let needs_level = state.cfg.edit_policy != EditPolicy::Everyone;
    let author_level = match (state.classifier.command_body_start(&msg.content), msg.guild_id) {
        (Some(_), Some(guild_id)) if needs_level => {
            permissions::member_level(&ctx.http, guild_id, msg.author.id).await
        }
        _ => PermissionLevel::Member,
    };

    MessageEvent {
        id: MessageId(msg.id.get()),
        author: UserId(msg.author.id.get()),
        channel_id: ChannelId(msg.channel_id.get()),
        guild_id: msg.guild_id.map(|g| GuildId(g.get())),
        content: msg.content.clone(),
        has_attachments: !msg.attachments.is_empty(),
        author_level,
    }
}
