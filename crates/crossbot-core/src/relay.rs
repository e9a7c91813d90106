//! Relay dispatcher: crossposting, embed-fix replies, cascading deletes,
//! departure notices.
//!
//! Discord materializes link previews asynchronously, so both relay paths
//! sleep before re-fetching the message by id; acting on the original gateway
//! payload would usually see zero embeds. The sleeps are plain awaits, so
//! other events keep flowing while a relay is pending.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    classify::{Classification, Classifier},
    config::Config,
    domain::{ChannelId, MessageId},
    events::{DepartedUser, InboundEvent, MessageEvent},
    ports::{ChatPort, FetchedMessage, MappingStore, MentionPolicy},
    rewrite, Error,
};

/// Outcome of dispatching one inbound event.
#[derive(Debug)]
pub enum Dispatch {
    /// The message is a command; execution belongs to the platform command
    /// layer. Command text starts at `body_start` of the event content.
    Command {
        event: MessageEvent,
        body_start: usize,
    },
    Handled,
}

pub struct RelayDispatcher {
    cfg: Arc<Config>,
    classifier: Arc<Classifier>,
    chat: Arc<dyn ChatPort>,
    store: Arc<dyn MappingStore>,
}

impl RelayDispatcher {
    pub fn new(
        cfg: Arc<Config>,
        classifier: Arc<Classifier>,
        chat: Arc<dyn ChatPort>,
        store: Arc<dyn MappingStore>,
    ) -> Self {
        Self {
            cfg,
            classifier,
            chat,
            store,
        }
    }

    /// Single entry point for gateway events.
    ///
    /// Everything except command execution is handled here; failures are
    /// logged, never surfaced to the posting user.
    pub async fn dispatch(&self, event: InboundEvent) -> Dispatch {
        match event {
            InboundEvent::Created(msg) => match self.classifier.classify(&msg) {
                Classification::Command { body_start } => {
                    return Dispatch::Command {
                        event: msg,
                        body_start,
                    }
                }
                Classification::Crosspost { destination } => {
                    self.relay_crosspost(&msg, destination).await;
                }
                Classification::PassiveLink => self.relay_passive_link(&msg).await,
                Classification::Ignore => {}
            },
            InboundEvent::Deleted {
                message_id,
                channel_id,
            } => self.on_deleted(message_id, channel_id).await,
            InboundEvent::MemberLeft { user, .. } => self.on_member_left(&user).await,
        }

        Dispatch::Handled
    }

    /// Relay a gallery message's media to its destination channel.
    pub async fn relay_crosspost(&self, msg: &MessageEvent, destination: ChannelId) {
        sleep(self.cfg.crosspost_delay).await;

        let Some(fetched) = self.refetch(msg).await else {
            return;
        };

        // Only post when there's something to show.
        if fetched.attachments.is_empty() && fetched.embeds.is_empty() {
            return;
        }

        let mut candidate = RelayCandidate::new();
        candidate.push_line(format!("Posted by <@{}>", msg.author.0));

        // Files first, then links.
        for attachment in &fetched.attachments {
            if attachment.spoiler {
                candidate.push_line(format!("||{}||", attachment.url));
            } else {
                candidate.push_line(attachment.url.clone());
            }
        }

        for embed in &fetched.embeds {
            let Some(url) = &embed.url else { continue };
            let line = if rewrite::is_tracked(url) {
                rewrite::rewrite(url)
            } else {
                url.clone()
            };
            candidate.push_url(line);
        }

        if let Some(guild) = msg.guild_id {
            candidate.push_line(format!(
                "https://discord.com/channels/{}/{}/{}",
                guild.0, msg.channel_id.0, msg.id.0
            ));
        }

        match self
            .chat
            .send_message(
                destination,
                &candidate.text(),
                MentionPolicy::AllowUser(msg.author),
            )
            .await
        {
            Ok(sent) => self.record_mapping(msg.id, sent),
            Err(e) => warn!(
                source = msg.id.0,
                error = %e,
                "crosspost send failed, no mapping recorded"
            ),
        }
    }

    /// Reply to a tracked link whose native embed is unreliable, then hide
    /// the original embed.
    pub async fn relay_passive_link(&self, msg: &MessageEvent) {
        sleep(self.cfg.passive_delay).await;

        let Some(fetched) = self.refetch(msg).await else {
            return;
        };

        // A prior pass already handled this message; gateway deliveries can repeat.
        if fetched.embeds.iter().any(|e| e.suppressed) {
            debug!(message = msg.id.0, "embeds already suppressed, skipping");
            return;
        }

        let candidate = build_link_reply(&fetched);
        if !candidate.should_post {
            return;
        }

        match self
            .chat
            .reply_to_message(
                msg.channel_id,
                msg.id,
                &candidate.text(),
                MentionPolicy::Suppress,
            )
            .await
        {
            Ok(sent) => {
                self.record_mapping(msg.id, sent);

                let chat = Arc::clone(&self.chat);
                let (channel, original) = (msg.channel_id, msg.id);
                tokio::spawn(async move {
                    if let Err(e) = chat.suppress_embeds(channel, original).await {
                        warn!(message = original.0, error = %e, "failed to suppress original embeds");
                    }
                });
            }
            Err(e) => warn!(
                source = msg.id.0,
                error = %e,
                "link reply send failed, no mapping recorded"
            ),
        }
    }

    /// Cascade a source deletion onto the relayed copy.
    ///
    /// The mapping row is cleared even when the downstream delete fails, so a
    /// permanently broken link can't cause retry storms.
    pub async fn on_deleted(&self, message_id: MessageId, channel_id: ChannelId) {
        let linked = match self.store.lookup(message_id) {
            Ok(Some(linked)) => linked,
            Ok(None) => return,
            Err(e) => {
                error!(source = message_id.0, error = %e, "mapping lookup failed");
                return;
            }
        };

        // Routed sources map to their gallery destination; passive-link
        // replies live in the same channel as their source.
        let target = self
            .cfg
            .routes
            .get(&channel_id)
            .copied()
            .unwrap_or(channel_id);

        match self.chat.delete_message(target, linked).await {
            Ok(()) => {}
            Err(Error::NotFound) => {
                info!(linked = linked.0, "linked message already deleted");
            }
            Err(e) => error!(linked = linked.0, error = %e, "failed to delete linked message"),
        }

        if let Err(e) = self.store.remove(message_id) {
            error!(source = message_id.0, error = %e, "failed to clear mapping");
        }
    }

    /// Post a notice to the moderation channel when a member leaves.
    pub async fn on_member_left(&self, user: &DepartedUser) {
        let Some(channel) = self.cfg.mod_channel else {
            return;
        };

        let text = format!("{} has left.", user.display_name);
        if let Err(e) = self
            .chat
            .send_message(channel, &text, MentionPolicy::Suppress)
            .await
        {
            warn!(user = user.id.0, error = %e, "failed to post departure notice");
        }
    }

    async fn refetch(&self, msg: &MessageEvent) -> Option<FetchedMessage> {
        match self.chat.fetch_message(msg.channel_id, msg.id).await {
            Ok(Some(fetched)) => Some(fetched),
            Ok(None) => {
                info!(message = msg.id.0, "message vanished before relay");
                None
            }
            Err(e) => {
                error!(message = msg.id.0, error = %e, "refetch failed");
                None
            }
        }
    }

    fn record_mapping(&self, source: MessageId, sent: MessageId) {
        if let Err(e) = self.store.insert(source, sent) {
            error!(source = source.0, linked = sent.0, error = %e, "failed to record mapping");
        }
    }
}

/// Compose the reply body for a passive tracked link.
///
/// Zero embeds after the wait means embed generation failed outright: fall
/// back to scanning the raw text for tracked tokens. Otherwise only a tracked
/// video embed is worth duplicating; image embeds render fine natively.
fn build_link_reply(fetched: &FetchedMessage) -> RelayCandidate {
    let mut candidate = RelayCandidate::new();

    if fetched.embeds.is_empty() {
        for token in fetched.content.split_whitespace() {
            if rewrite::is_tracked(token) {
                candidate.push_url(rewrite::rewrite(token));
                candidate.should_post = true;
            }
        }
        return candidate;
    }

    for embed in &fetched.embeds {
        let Some(url) = &embed.url else { continue };
        if rewrite::is_tracked(url) {
            candidate.push_url(rewrite::rewrite(url));
            if embed.has_video {
                candidate.should_post = true;
            }
        } else {
            // Carried through unchanged so the reply is self-contained.
            candidate.push_url(url.clone());
        }
    }

    candidate
}

/// In-flight state while composing one outgoing relay body.
struct RelayCandidate {
    lines: Vec<String>,
    seen_urls: HashSet<String>,
    should_post: bool,
}

impl RelayCandidate {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            seen_urls: HashSet::new(),
            should_post: false,
        }
    }

    fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Append a URL line unless the exact string was already appended.
    /// First-seen order is preserved.
    fn push_url(&mut self, url: String) {
        if self.seen_urls.insert(url.clone()) {
            self.lines.push(url);
        }
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }
}
