// Guild mutations that follow from spells and potions.
//
// Everything here is best-effort: if Hedwig lacks Manage Roles or Manage
// Nicknames (or the target outranks her), we log and carry on. A failed
// role change must never fail the command that paid for it.

use crate::config::{BotConfig, RoleRef};
use crate::core::house_points::House;
use crate::core::magic::{
    ActiveEffect, EffectApplied, EffectsRemoved, MemberSnapshot, NicknameChange, RoleKey,
};
use crate::discord::{Context, Magic};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const AUDIT_REASON: &str = "Hedwig: spell or potion effect";

/// The parts of a member the core cares about.
pub async fn snapshot(
    http: &serenity::Http,
    config: &BotConfig,
    member: &serenity::Member,
) -> MemberSnapshot {
    let keys = [RoleKey::Alohomora, RoleKey::Lumos, RoleKey::Amortentia]
        .into_iter()
        .chain(House::ALL.into_iter().map(RoleKey::House));

    let mut held_roles = Vec::new();
    for key in keys {
        if let Some(role_id) = resolve_role(http, member.guild_id, config.roles.resolve(key)).await {
            if member.roles.contains(&role_id) {
                held_roles.push(key);
            }
        }
    }

    MemberSnapshot {
        user_id: member.user.id.get(),
        display_name: member.display_name().to_string(),
        nickname: member.nick.clone(),
        held_roles,
    }
}

/// Prefects and Heads of House.
pub async fn is_staff(ctx: Context<'_>) -> bool {
    let staff = ctx.data().config.roles.staff_roles();
    match ctx.author_member().await {
        Some(member) => member.roles.iter().any(|role| staff.contains(&role.get())),
        None => false,
    }
}

async fn resolve_role(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    role: RoleRef,
) -> Option<serenity::RoleId> {
    match role {
        RoleRef::Id(0) => None,
        RoleRef::Id(id) => Some(serenity::RoleId::new(id)),
        RoleRef::Named(name) => match guild_id.roles(http).await {
            Ok(roles) => roles.values().find(|r| r.name == name).map(|r| r.id),
            Err(e) => {
                tracing::warn!("Failed to list roles for guild {}: {}", guild_id, e);
                None
            }
        },
    }
}

pub async fn grant_role(
    http: &serenity::Http,
    config: &BotConfig,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    key: RoleKey,
) {
    let Some(role_id) = resolve_role(http, guild_id, config.roles.resolve(key)).await else {
        tracing::warn!(?key, "No role configured or found; skipping grant");
        return;
    };

    if let Err(e) = http
        .add_member_role(guild_id, user_id, role_id, Some(AUDIT_REASON))
        .await
    {
        tracing::warn!("Missing permissions to add role {} to {}: {}", role_id, user_id, e);
    }
}

pub async fn revoke_role(
    http: &serenity::Http,
    config: &BotConfig,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    key: RoleKey,
) {
    let Some(role_id) = resolve_role(http, guild_id, config.roles.resolve(key)).await else {
        return;
    };

    if let Err(e) = http
        .remove_member_role(guild_id, user_id, role_id, Some(AUDIT_REASON))
        .await
    {
        tracing::warn!(
            "Missing permissions to remove role {} from {}: {}",
            role_id,
            user_id,
            e
        );
    }
}

pub async fn set_nickname(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    change: &NicknameChange,
) {
    // An empty nickname clears it, which is how "no nickname" is restored.
    let nickname = match change {
        NicknameChange::Set(name) => name.clone(),
        NicknameChange::Restore(original) => original.clone().unwrap_or_default(),
    };

    if let Err(e) = guild_id
        .edit_member(http, user_id, serenity::EditMember::new().nickname(nickname))
        .await
    {
        tracing::warn!("Missing Manage Nicknames for {}: {}", user_id, e);
    }
}

/// Push a freshly applied effect out to the guild.
pub async fn sync_applied(
    http: &serenity::Http,
    config: &BotConfig,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    applied: &EffectApplied,
) {
    if let Some(key) = applied.grant_role {
        grant_role(http, config, guild_id, user_id, key).await;
    }
    set_nickname(http, guild_id, user_id, &applied.nickname).await;
}

/// Undo whatever a set of lifted effects did.
pub async fn sync_removed(
    http: &serenity::Http,
    config: &BotConfig,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    removed: &EffectsRemoved,
) {
    for key in &removed.revoke_roles {
        revoke_role(http, config, guild_id, user_id, *key).await;
    }
    set_nickname(http, guild_id, user_id, &removed.nickname).await;
}

/// Lift an effect when its time is up.
///
/// Fire-and-forget: if the effect was cancelled early the ledger returns
/// nothing and the task ends quietly.
pub fn schedule_expiry(
    http: Arc<serenity::Http>,
    config: Arc<BotConfig>,
    magic: Arc<Magic>,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    effect: &ActiveEffect,
) {
    let Some(expires_at) = effect.expires_at else {
        return;
    };
    let effect_id = effect.id;

    tokio::spawn(async move {
        let delay = (expires_at - chrono::Utc::now())
            .to_std()
            .unwrap_or_default();
        tokio::time::sleep(delay).await;

        if let Some(removed) = magic.expire(user_id.get(), guild_id.get(), effect_id) {
            sync_removed(&http, &config, guild_id, user_id, &removed).await;
        }
    });
}
