// Discord commands for spells and potions
//
// The core decides prices, cooldowns and effects. This file turns members
// into snapshots, hands the result to guild_ops so the roles and nicknames
// actually change, and schedules the expiry.

use crate::core::economy::EconomyError;
use crate::core::magic::{
    CastOutcome, EffectOutcome, Enchantment, EnchantmentId, MagicError, School,
};
use crate::discord::commands::galleons::format_number;
use crate::discord::guild_ops::{self, snapshot};
use crate::discord::room_channel;
use crate::discord::{guild_id, Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::sync::Arc;

/// See every spell and potion for sale
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn shop(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("🪄 Diagon Alley")
        .description("Cast spells with `!cast <spell> @member`, brew with `!drink <potion> [@member]`.")
        .field("✨ Spells", catalogue(School::Spell), false)
        .field("🧪 Potions", catalogue(School::Potion), false)
        .color(0x7B2CBF);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn catalogue(school: School) -> String {
    Enchantment::by_school(school)
        .iter()
        .map(|e| {
            format!(
                "{} **{}** (`{}`) — {} galleons\n{}",
                e.emoji,
                e.name,
                e.id.as_str(),
                format_number(e.cost),
                e.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cast a spell on another member
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn cast(
    ctx: Context<'_>,
    #[description = "Spell to cast"]
    #[autocomplete = "autocomplete_spells"]
    spell: String,
    #[description = "Who to cast it on"] member: serenity::Member,
) -> Result<(), Error> {
    if ctx.author().bot {
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;
    let target = snapshot(ctx.http(), &ctx.data().config, &member).await;

    let outcome = match ctx
        .data()
        .magic
        .cast(ctx.author().id.get(), guild_id, &target, &spell)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return reply_magic_error(ctx, e).await,
    };

    apply_outcome(ctx, &member, &outcome).await;

    if outcome.enchantment.id == EnchantmentId::Alohomora {
        let data = ctx.data();
        data.room
            .start_challenge(member.user.id.get(), guild_id, ctx.author().id.get());
        if let Err(e) = room_channel::announce(ctx.http(), &data.config, member.user.id).await {
            tracing::warn!("Failed to open the Room of Requirement: {}", e);
        }
    }

    ctx.say(format!(
        "{} {} cast **{}** on {}! ({} galleons left)",
        outcome.enchantment.emoji,
        ctx.author().mention(),
        outcome.enchantment.name,
        member.mention(),
        format_number(outcome.buyer_balance)
    ))
    .await?;
    Ok(())
}

/// Drink a potion, or slip one to someone else
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn drink(
    ctx: Context<'_>,
    #[description = "Potion to drink"]
    #[autocomplete = "autocomplete_potions"]
    potion: String,
    #[description = "Who drinks it (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    if ctx.author().bot {
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;
    let member = match member {
        Some(m) => m,
        None => match ctx.author_member().await {
            Some(m) => m.into_owned(),
            None => return Err("Couldn't find you in this server".into()),
        },
    };
    let target = snapshot(ctx.http(), &ctx.data().config, &member).await;

    let outcome = match ctx
        .data()
        .magic
        .drink(ctx.author().id.get(), guild_id, &target, &potion)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return reply_magic_error(ctx, e).await,
    };

    apply_outcome(ctx, &member, &outcome).await;

    let message = match &outcome.outcome {
        EffectOutcome::Cleansed(None) => format!(
            "{} {} swallowed a **{}**, but there was nothing to cure.",
            outcome.enchantment.emoji,
            member.mention(),
            outcome.enchantment.name
        ),
        EffectOutcome::Cleansed(Some(removed)) => format!(
            "{} {} swallowed a **{}** and shook off {} potion effect(s)!",
            outcome.enchantment.emoji,
            member.mention(),
            outcome.enchantment.name,
            removed.removed.len()
        ),
        EffectOutcome::Applied(_) => format!(
            "{} {} drank **{}**! ({} galleons left)",
            outcome.enchantment.emoji,
            member.mention(),
            outcome.enchantment.name,
            format_number(outcome.buyer_balance)
        ),
    };

    ctx.say(message).await?;
    Ok(())
}

/// Lift a spell or potion effect from a member
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn finite(
    ctx: Context<'_>,
    #[description = "Member to free"] member: serenity::Member,
    #[description = "Which effect (defaults to the latest)"]
    #[autocomplete = "autocomplete_all"]
    effect: Option<String>,
) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    let data = ctx.data();

    let removed = match data
        .magic
        .finite(member.user.id.get(), guild_id, effect.as_deref())
    {
        Ok(removed) => removed,
        Err(e) => return reply_magic_error(ctx, e).await,
    };

    guild_ops::sync_removed(
        ctx.http(),
        &data.config,
        serenity::GuildId::new(guild_id),
        member.user.id,
        &removed,
    )
    .await;

    let names: Vec<&str> = removed
        .removed
        .iter()
        .map(|e| Enchantment::get(e.enchantment).name)
        .collect();
    ctx.say(format!(
        "✨ Finite Incantatem! {} is free of {}.",
        member.display_name(),
        names.join(", ")
    ))
    .await?;
    Ok(())
}

/// Show the spells and potions affecting a member
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn effects(
    ctx: Context<'_>,
    #[description = "Member to inspect (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    let (user_id, name) = match &member {
        Some(m) => (m.user.id.get(), m.display_name().to_string()),
        None => (
            ctx.author().id.get(),
            crate::discord::commands::galleons::author_display_name(ctx).await,
        ),
    };

    let active = ctx.data().magic.active_effects(user_id, guild_id);
    if active.is_empty() {
        ctx.say(format!("🪶 {} is free of any magic.", name)).await?;
        return Ok(());
    }

    let lines: Vec<String> = active
        .iter()
        .map(|effect| {
            let enchantment = Enchantment::get(effect.enchantment);
            match effect.expires_at {
                Some(at) => format!(
                    "{} **{}**, wears off <t:{}:R>",
                    enchantment.emoji,
                    enchantment.name,
                    at.timestamp()
                ),
                None => format!("{} **{}**", enchantment.emoji, enchantment.name),
            }
        })
        .collect();

    let embed = serenity::CreateEmbed::new()
        .title(format!("🔮 Magic on {}", name))
        .description(lines.join("\n"))
        .color(0x7B2CBF);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Push a cast or drink out to the guild and arm its expiry.
async fn apply_outcome(ctx: Context<'_>, member: &serenity::Member, outcome: &CastOutcome) {
    let data = ctx.data();
    let guild = member.guild_id;
    let user = member.user.id;

    match &outcome.outcome {
        EffectOutcome::Applied(applied) => {
            guild_ops::sync_applied(ctx.http(), &data.config, guild, user, applied).await;
            guild_ops::schedule_expiry(
                Arc::clone(&ctx.serenity_context().http),
                Arc::clone(&data.config),
                Arc::clone(&data.magic),
                guild,
                user,
                &applied.effect,
            );
        }
        EffectOutcome::Cleansed(Some(removed)) => {
            guild_ops::sync_removed(ctx.http(), &data.config, guild, user, removed).await;
        }
        EffectOutcome::Cleansed(None) => {}
    }
}

async fn reply_magic_error(ctx: Context<'_>, error: MagicError) -> Result<(), Error> {
    let message = match error {
        MagicError::Silenced { until: Some(at) } => format!(
            "🤫 You are silenced and can't cast spells until <t:{}:R>.",
            at.timestamp()
        ),
        MagicError::Silenced { until: None } => {
            "🤫 You are silenced and can't cast spells.".to_string()
        }
        MagicError::UnknownSpell(name) => {
            format!("❓ There's no spell called `{}`. Try `!shop`.", name)
        }
        MagicError::UnknownPotion(name) => {
            format!("❓ There's no potion called `{}`. Try `!shop`.", name)
        }
        MagicError::OnCooldown {
            enchantment,
            available_at,
        } => format!(
            "⏳ {} was used on that member recently. Try again <t:{}:R>.",
            Enchantment::get(enchantment).name,
            available_at.timestamp()
        ),
        MagicError::Economy(EconomyError::InsufficientFunds {
            required,
            available,
        }) => format!(
            "🚫 You need **{}** galleons but only have **{}**.",
            format_number(required),
            format_number(available)
        ),
        MagicError::NoActiveEffects => "🪶 There's no magic to lift.".to_string(),
        MagicError::EffectNotFound(name) => {
            format!("❓ `{}` isn't affecting that member.", name)
        }
        MagicError::Economy(e) => return Err(e.into()),
    };

    ctx.say(message).await?;
    Ok(())
}

fn matching<'a>(school: Option<School>, partial: &'a str) -> impl Iterator<Item = String> + 'a {
    let partial = partial.to_lowercase();
    EnchantmentId::all()
        .into_iter()
        .map(Enchantment::get)
        .filter(move |e| school.map_or(true, |s| e.school == s))
        .filter(move |e| {
            e.id.as_str().contains(&partial) || e.name.to_lowercase().contains(&partial)
        })
        .map(|e| e.id.as_str().to_string())
}

async fn autocomplete_spells<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    matching(Some(School::Spell), partial)
}

async fn autocomplete_potions<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    matching(Some(School::Potion), partial)
}

async fn autocomplete_all<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    matching(None, partial)
}
