//! Role quota overrides.

use poise::serenity_prelude as serenity;
use throttler_common::RoleId;
use throttler_engine::RoleQuota;
use throttler_i18n::FluentArgs;

use crate::framework::{Context, Error};
use crate::reply;

/// Set the daily embed quota for members holding a role in this channel.
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    default_member_permissions = "MANAGE_CHANNELS",
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn set_role_quota(
    ctx: Context<'_>,
    #[description = "Role the quota applies to"] role: serenity::Role,
    #[description = "Embeds per day, -1 to use the default"]
    #[min = -1]
    quota: i64,
    #[description = "Higher priority wins when a member holds several roles"] priority: i64,
) -> Result<(), Error> {
    let role_quota = RoleQuota {
        role_id: RoleId(role.id.get()),
        channel_id: reply::channel(ctx),
        quota,
        priority,
    };
    ctx.data().engine.set_role_quota(role_quota).await?;

    let mut args = FluentArgs::new();
    args.set("role", role.id.get().to_string());
    args.set("quota", quota);
    args.set("priority", priority);
    reply::send_best_effort(ctx, reply::text_with(ctx, "role-quota-set", &args)).await;
    Ok(())
}

/// List the role quotas configured for this channel.
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    default_member_permissions = "MANAGE_CHANNELS"
)]
pub async fn list_role_quotas(ctx: Context<'_>) -> Result<(), Error> {
    let quotas = ctx.data().engine.role_quotas(reply::channel(ctx)).await?;

    if quotas.is_empty() {
        reply::send_best_effort(ctx, reply::text(ctx, "role-quota-list-empty")).await;
        return Ok(());
    }

    let mut lines = vec![reply::text(ctx, "role-quota-list-header")];
    for quota in &quotas {
        let mut args = FluentArgs::new();
        args.set("role", quota.role_id.get().to_string());
        args.set("quota", quota.quota);
        args.set("priority", quota.priority);
        lines.push(reply::text_with(ctx, "role-quota-list-item", &args));
    }
    reply::send_best_effort(ctx, lines.join("\n")).await;
    Ok(())
}
