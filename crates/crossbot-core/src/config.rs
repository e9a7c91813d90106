use std::{collections::HashMap, env, path::PathBuf, time::Duration};

use tracing::warn;

use crate::{
    domain::{ChannelId, GuildId},
    errors::Error,
    Result,
};

/// Who is allowed to drive the bot's commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditPolicy {
    AdminOnly,
    ModOrAdmin,
    Everyone,
}

impl EditPolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "admin" | "0" => Some(Self::AdminOnly),
            "mod" | "1" => Some(Self::ModOrAdmin),
            "everyone" | "2" => Some(Self::Everyone),
            _ => None,
        }
    }
}

/// Typed configuration for the relay.
///
/// Built once at startup and never mutated afterwards; handlers share it
/// behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub guild_id: Option<GuildId>,
    pub prefix: String,
    pub edit_policy: EditPolicy,
    /// Crosspost routes: messages in a key channel are relayed to its value channel.
    pub routes: HashMap<ChannelId, ChannelId>,
    pub mod_channel: Option<ChannelId>,
    pub crosspost_delay: Duration,
    pub passive_delay: Duration,
    pub database_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let token = env_str("DISCORD_BOT_TOKEN").unwrap_or_default();
        if token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let guild_id = parse_id_entry("GUILD_ID", env_str("GUILD_ID")).map(GuildId);
        let mod_channel =
            parse_id_entry("MOD_CHANNEL_ID", env_str("MOD_CHANNEL_ID")).map(ChannelId);

        let prefix = env_str("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string());

        let edit_policy = match env_str("EDITABLE_BY") {
            None => EditPolicy::Everyone,
            Some(raw) => EditPolicy::parse(&raw).unwrap_or_else(|| {
                warn!("unrecognized EDITABLE_BY value {raw:?}, restricting commands to admins");
                EditPolicy::AdminOnly
            }),
        };

        let routes = parse_routes(&env_str("CROSSPOST_ROUTES").unwrap_or_default());

        let crosspost_delay =
            Duration::from_millis(env_u64("CROSSPOST_DELAY_MS").unwrap_or(5_000));
        let passive_delay = Duration::from_millis(env_u64("PASSIVE_DELAY_MS").unwrap_or(2_000));

        let database_path =
            PathBuf::from(env_str("DATABASE_PATH").unwrap_or_else(|| "crossbot.db".to_string()));

        Ok(Self {
            token,
            guild_id,
            prefix,
            edit_policy,
            routes,
            mod_channel,
            crosspost_delay,
            passive_delay,
            database_path,
        })
    }
}

/// Parse `source:destination` channel id pairs from a comma-separated list.
///
/// A pair with an unparseable id is dropped (that route is disabled) instead
/// of failing startup.
fn parse_routes(raw: &str) -> HashMap<ChannelId, ChannelId> {
    let mut routes = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((source, destination)) = entry.split_once(':') else {
            warn!("dropping malformed crosspost route entry {entry:?}");
            continue;
        };

        let source = parse_id_entry("crosspost route source", Some(source.to_string()));
        let destination = parse_id_entry("crosspost route destination", Some(destination.to_string()));

        if let (Some(source), Some(destination)) = (source, destination) {
            routes.insert(ChannelId(source), ChannelId(destination));
        }
    }

    routes
}

/// Parse a configured snowflake. Unparseable values disable the entry with a
/// warning rather than crashing startup.
fn parse_id_entry(what: &str, raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.parse::<u64>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("failed to parse {what}: {trimmed:?}; entry disabled");
            None
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_route_pairs() {
        let routes = parse_routes("1:2, 30:40");
        assert_eq!(routes.len(), 2);
        assert_eq!(routes.get(&ChannelId(1)), Some(&ChannelId(2)));
        assert_eq!(routes.get(&ChannelId(30)), Some(&ChannelId(40)));
    }

    #[test]
    fn drops_invalid_route_entries_and_keeps_the_rest() {
        let routes = parse_routes("1:2,abc:3,4:def,5");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes.get(&ChannelId(1)), Some(&ChannelId(2)));
    }

    #[test]
    fn empty_route_list_is_empty() {
        assert!(parse_routes("").is_empty());
        assert!(parse_routes(" , ,").is_empty());
    }

    #[test]
    fn edit_policy_accepts_names_and_legacy_digits() {
        assert_eq!(EditPolicy::parse("admin"), Some(EditPolicy::AdminOnly));
        assert_eq!(EditPolicy::parse("0"), Some(EditPolicy::AdminOnly));
        assert_eq!(EditPolicy::parse("MOD"), Some(EditPolicy::ModOrAdmin));
        assert_eq!(EditPolicy::parse("1"), Some(EditPolicy::ModOrAdmin));
        assert_eq!(EditPolicy::parse("everyone"), Some(EditPolicy::Everyone));
        assert_eq!(EditPolicy::parse("2"), Some(EditPolicy::Everyone));
        assert_eq!(EditPolicy::parse("nobody"), None);
    }

    #[test]
    fn unparseable_ids_are_disabled() {
        assert_eq!(parse_id_entry("test", Some("123".to_string())), Some(123));
        assert_eq!(parse_id_entry("test", Some("12x".to_string())), None);
        assert_eq!(parse_id_entry("test", Some("  ".to_string())), None);
        assert_eq!(parse_id_entry("test", None), None);
    }
}
