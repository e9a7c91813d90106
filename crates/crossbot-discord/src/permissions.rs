//! Resolution of a member's standing from their guild roles.

use serenity::http::Http;
use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::model::Permissions;

use tracing::warn;

use crossbot_core::classify::PermissionLevel;

/// Compute the author's permission level from guild ownership and role
/// permissions. Lookup failures degrade to the lowest level rather than
/// erroring; a command from an unresolvable member is just not privileged.
pub async fn member_level(http: &Http, guild_id: GuildId, user_id: UserId) -> PermissionLevel {
    let guild = match http.get_guild(guild_id).await {
        Ok(guild) => guild,
        Err(e) => {
            warn!(guild = guild_id.get(), error = %e, "failed to fetch guild for permission check");
            return PermissionLevel::Member;
        }
    };

    if guild.owner_id == user_id {
        return PermissionLevel::Admin;
    }

    let member = match http.get_member(guild_id, user_id).await {
        Ok(member) => member,
        Err(e) => {
            warn!(user = user_id.get(), error = %e, "failed to fetch member for permission check");
            return PermissionLevel::Member;
        }
    };

    let mut perms = Permissions::empty();

    // The @everyone role shares the guild's id.
    if let Some(everyone) = guild.roles.get(&RoleId::new(guild_id.get())) {
        perms |= everyone.permissions;
    }
    for role_id in &member.roles {
        if let Some(role) = guild.roles.get(role_id) {
            perms |= role.permissions;
        }
    }

    if perms.contains(Permissions::ADMINISTRATOR) {
        PermissionLevel::Admin
    } else if perms.contains(Permissions::MANAGE_CHANNELS) {
        PermissionLevel::Moderator
    } else {
        PermissionLevel::Member
    }
}
