//! Gateway models to engine inputs.

use poise::serenity_prelude as serenity;
use throttler_common::{ChannelId, MessageId, RoleId, UserId};
use throttler_engine::{Author, IncomingMessage, ReferencedMessage};

/// Author of a message.
pub fn author(user: &serenity::User) -> Author {
    Author {
        id: UserId(user.id.get()),
        bot: user.bot,
    }
}

/// Role IDs of a member.
pub fn role_ids(roles: &[serenity::RoleId]) -> Vec<RoleId> {
    roles.iter().map(|role| RoleId(role.get())).collect()
}

/// Snapshot of a message as the engine sees it.
///
/// The creation time comes from the snowflake, member roles from the
/// partial member attached to gateway events (empty on fetched messages).
pub fn incoming_message(message: &serenity::Message) -> IncomingMessage {
    let id = MessageId(message.id.get());
    IncomingMessage {
        id,
        channel_id: ChannelId(message.channel_id.get()),
        author: author(&message.author),
        member_roles: message
            .member
            .as_ref()
            .map(|member| role_ids(&member.roles))
            .unwrap_or_default(),
        content: message.content.clone(),
        embed_count: message.embeds.len(),
        embeds_suppressed: message
            .flags
            .is_some_and(|flags| flags.contains(serenity::MessageFlags::SUPPRESS_EMBEDS)),
        created_at: id.created_at(),
        referenced: message
            .referenced_message
            .as_deref()
            .map(|referenced| ReferencedMessage {
                id: MessageId(referenced.id.get()),
                author: author(&referenced.author),
            }),
    }
}
