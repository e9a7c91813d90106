//! Decides what, if anything, to do with an inbound message.

use std::sync::Arc;

use crate::{
    config::{Config, EditPolicy},
    domain::{ChannelId, UserId},
    events::MessageEvent,
    rewrite,
};

/// The author's standing in the guild, resolved by the adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionLevel {
    Admin,
    Moderator,
    Member,
}

impl EditPolicy {
    pub fn permits(self, level: PermissionLevel) -> bool {
        match self {
            EditPolicy::Everyone => true,
            EditPolicy::ModOrAdmin => {
                matches!(level, PermissionLevel::Admin | PermissionLevel::Moderator)
            }
            EditPolicy::AdminOnly => matches!(level, PermissionLevel::Admin),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Command text begins at byte offset `body_start` of the content.
    Command { body_start: usize },
    /// Relay this message's media to the routed destination channel.
    Crosspost { destination: ChannelId },
    /// A tracked link outside any route; candidate for an embed-fix reply.
    PassiveLink,
    Ignore,
}

/// Domains whose links are reaction gifs rather than relay-worthy media.
const NOISE_DOMAINS: [&str; 2] = ["tenor.com", "giphy.com"];

pub struct Classifier {
    cfg: Arc<Config>,
    /// Both mention forms Discord emits for the bot user.
    self_mentions: [String; 2],
}

impl Classifier {
    pub fn new(cfg: Arc<Config>, self_id: UserId) -> Self {
        Self {
            cfg,
            self_mentions: [format!("<@{}>", self_id.0), format!("<@!{}>", self_id.0)],
        }
    }

    /// Byte offset where command text starts, when the content leads with the
    /// configured prefix or a mention of the bot user.
    pub fn command_body_start(&self, content: &str) -> Option<usize> {
        if content.starts_with(&self.cfg.prefix) && !self.cfg.prefix.is_empty() {
            return Some(self.cfg.prefix.len());
        }

        for mention in &self.self_mentions {
            if let Some(rest) = content.strip_prefix(mention.as_str()) {
                let body = rest.trim_start();
                return Some(content.len() - body.len());
            }
        }

        None
    }

    pub fn classify(&self, msg: &MessageEvent) -> Classification {
        // Everyone short-circuits the permission lookup entirely.
        if let Some(body_start) = self.command_body_start(&msg.content) {
            if self.cfg.edit_policy == EditPolicy::Everyone
                || self.cfg.edit_policy.permits(msg.author_level)
            {
                return Classification::Command { body_start };
            }
        }

        if let Some(&destination) = self.cfg.routes.get(&msg.channel_id) {
            let carries_media = msg.has_attachments || msg.content.contains("http");
            if carries_media && !is_reaction_gif(&msg.content) {
                return Classification::Crosspost { destination };
            }
        }

        if msg.content.contains(rewrite::TWITTER_URL) {
            return Classification::PassiveLink;
        }

        Classification::Ignore
    }
}

fn is_reaction_gif(content: &str) -> bool {
    NOISE_DOMAINS.iter().any(|d| content.contains(d))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::domain::{GuildId, MessageId};

    fn test_config(edit_policy: EditPolicy) -> Config {
        let mut routes = HashMap::new();
        routes.insert(ChannelId(10), ChannelId(20));

        Config {
            token: "t".to_string(),
            guild_id: Some(GuildId(1)),
            prefix: "!".to_string(),
            edit_policy,
            routes,
            mod_channel: None,
            crosspost_delay: Duration::ZERO,
            passive_delay: Duration::ZERO,
            database_path: PathBuf::from("/tmp/unused.db"),
        }
    }

    fn classifier(edit_policy: EditPolicy) -> Classifier {
        Classifier::new(Arc::new(test_config(edit_policy)), UserId(999))
    }

    fn message(channel: u64, content: &str) -> MessageEvent {
        MessageEvent {
            id: MessageId(1),
            author: UserId(5),
            channel_id: ChannelId(channel),
            guild_id: Some(GuildId(1)),
            content: content.to_string(),
            has_attachments: false,
            author_level: PermissionLevel::Member,
        }
    }

    #[test]
    fn prefix_makes_a_command() {
        let c = classifier(EditPolicy::Everyone);
        assert_eq!(
            c.classify(&message(1, "!test")),
            Classification::Command { body_start: 1 }
        );
    }

    #[test]
    fn mention_prefix_makes_a_command() {
        let c = classifier(EditPolicy::Everyone);
        let got = c.classify(&message(1, "<@999> repeat hello"));
        assert_eq!(got, Classification::Command { body_start: 7 });
    }

    #[test]
    fn command_without_permission_falls_through() {
        let c = classifier(EditPolicy::AdminOnly);
        assert_eq!(c.classify(&message(1, "!test")), Classification::Ignore);
    }

    #[test]
    fn admin_passes_admin_only_policy() {
        let c = classifier(EditPolicy::AdminOnly);
        let mut msg = message(1, "!test");
        msg.author_level = PermissionLevel::Admin;
        assert_eq!(
            c.classify(&msg),
            Classification::Command { body_start: 1 }
        );
    }

    #[test]
    fn moderator_passes_mod_policy_but_not_admin_policy() {
        let mut msg = message(1, "!test");
        msg.author_level = PermissionLevel::Moderator;

        assert_eq!(
            classifier(EditPolicy::ModOrAdmin).classify(&msg),
            Classification::Command { body_start: 1 }
        );
        assert_eq!(
            classifier(EditPolicy::AdminOnly).classify(&msg),
            Classification::Ignore
        );
    }

    #[test]
    fn routed_channel_with_link_is_crossposted() {
        let c = classifier(EditPolicy::Everyone);
        assert_eq!(
            c.classify(&message(10, "look https://example.com/art.png")),
            Classification::Crosspost {
                destination: ChannelId(20)
            }
        );
    }

    #[test]
    fn routed_channel_with_attachment_is_crossposted() {
        let c = classifier(EditPolicy::Everyone);
        let mut msg = message(10, "fresh drawing");
        msg.has_attachments = true;
        assert_eq!(
            c.classify(&msg),
            Classification::Crosspost {
                destination: ChannelId(20)
            }
        );
    }

    #[test]
    fn plain_chatter_in_routed_channel_is_ignored() {
        let c = classifier(EditPolicy::Everyone);
        assert_eq!(c.classify(&message(10, "nice work!")), Classification::Ignore);
    }

    #[test]
    fn reaction_gifs_are_not_crossposted() {
        let c = classifier(EditPolicy::Everyone);
        assert_eq!(
            c.classify(&message(10, "https://tenor.com/view/lol-123")),
            Classification::Ignore
        );
    }

    #[test]
    fn tracked_link_outside_routes_is_passive() {
        let c = classifier(EditPolicy::Everyone);
        assert_eq!(
            c.classify(&message(1, "check https://twitter.com/a/status/1")),
            Classification::PassiveLink
        );
    }

    #[test]
    fn unrelated_message_is_ignored() {
        let c = classifier(EditPolicy::Everyone);
        assert_eq!(c.classify(&message(1, "hello")), Classification::Ignore);
    }
}
