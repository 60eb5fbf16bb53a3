// Discord commands for the galleon economy
//
// Same pattern as the other command files:
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response

use crate::core::economy::EconomyError;
use crate::discord::guild_ops::is_staff;
use crate::discord::{guild_id, Context, Error};
use poise::serenity_prelude as serenity;

/// Members shown on the rich list.
const LEADERBOARD_SIZE: usize = 10;

/// Check your galleons (or someone else's)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn balance(
    ctx: Context<'_>,
    #[description = "Member to check (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    let (user_id, name) = match &member {
        Some(m) => (m.user.id.get(), m.display_name().to_string()),
        None => (ctx.author().id.get(), author_display_name(ctx).await),
    };

    let balance = ctx.data().economy.get_balance(user_id, guild_id).await?;
    ctx.say(format!(
        "💰 {} has **{}** galleons.",
        name,
        format_number(balance)
    ))
    .await?;
    Ok(())
}

/// Collect your daily pocket money from Gringotts
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn daily(ctx: Context<'_>) -> Result<(), Error> {
    let user = ctx.author();
    if user.bot {
        ctx.say("Bots don't need pocket money! 🤖").await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;

    match ctx.data().economy.claim_daily(user.id.get(), guild_id).await {
        Ok(claim) => {
            let name = author_display_name(ctx).await;
            match ctx.data().config.channels.gringotts {
                Some(channel) => {
                    serenity::ChannelId::new(channel.get())
                        .say(
                            ctx.http(),
                            format!(
                                "💰 {} collected their daily allowance of {} and now has {} galleons!",
                                name,
                                claim.galleons_awarded,
                                format_number(claim.new_balance)
                            ),
                        )
                        .await?;
                    if ctx.channel_id().get() != channel.get() {
                        ctx.say(format!(
                            "💰 You collected **{}** galleons! Next allowance <t:{}:R>.",
                            claim.galleons_awarded,
                            claim.next_claim_time.timestamp()
                        ))
                        .await?;
                    }
                }
                None => {
                    ctx.say(format!(
                        "💰 You collected **{}** galleons! You now have {}.",
                        claim.galleons_awarded,
                        format_number(claim.new_balance)
                    ))
                    .await?;
                }
            }
        }
        Err(EconomyError::OnCooldown { available_at }) => {
            let remaining = available_at - chrono::Utc::now();
            ctx.say(format!(
                "⏳ You already collected daily. Try again in {}h {}m.",
                remaining.num_hours(),
                remaining.num_minutes() % 60
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Pay galleons to another member
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn pay(
    ctx: Context<'_>,
    #[description = "Who to pay"] member: serenity::Member,
    #[description = "How many galleons"] amount: i64,
) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    if member.user.bot {
        ctx.say("Bots don't have Gringotts vaults! 🤖").await?;
        return Ok(());
    }

    match ctx
        .data()
        .economy
        .transfer(ctx.author().id.get(), member.user.id.get(), guild_id, amount)
        .await
    {
        Ok(_) => {
            let name = author_display_name(ctx).await;
            ctx.say(format!(
                "💸 {} paid {} galleons to {}!",
                name,
                format_number(amount),
                member.display_name()
            ))
            .await?;
        }
        Err(EconomyError::NonPositiveAmount(_)) => {
            ctx.say("Please provide a positive amount.").await?;
        }
        Err(EconomyError::SelfTransfer) => {
            ctx.say("🪙 Paying yourself won't make you any richer.")
                .await?;
        }
        Err(EconomyError::InsufficientFunds { .. }) => {
            ctx.say("🚫 You don't have enough galleons.").await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Give galleons to a member (Prefects & Head of House only)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn givegalleons(
    ctx: Context<'_>,
    #[description = "Who receives the galleons"] member: serenity::Member,
    #[description = "How many galleons"] amount: i64,
) -> Result<(), Error> {
    if !is_staff(ctx).await {
        ctx.say("🚫 You don't have permission to give galleons.")
            .await?;
        return Ok(());
    }
    if amount <= 0 {
        ctx.say("Please provide a positive amount.").await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;

    let new_balance = ctx
        .data()
        .economy
        .award_galleons(member.user.id.get(), guild_id, amount, "Staff gift")
        .await?;

    ctx.say(format!(
        "✨ {} received {} galleons! They now have {}.",
        member.display_name(),
        format_number(amount),
        format_number(new_balance)
    ))
    .await?;
    Ok(())
}

/// Clear every galleon balance (Prefects & Head of House only)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn resetgalleons(ctx: Context<'_>) -> Result<(), Error> {
    if !is_staff(ctx).await {
        ctx.say("🚫 You don't have permission to reset galleons.")
            .await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;

    ctx.data().economy.reset(guild_id).await?;
    ctx.say("🔄 All galleon balances have been reset.").await?;
    Ok(())
}

/// Show the Gringotts rich list
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    let wallets = ctx
        .data()
        .economy
        .leaderboard(guild_id, LEADERBOARD_SIZE)
        .await?;

    if wallets.iter().all(|w| w.balance == 0) {
        ctx.say("No one has any galleons yet!").await?;
        return Ok(());
    }

    let guild = serenity::GuildId::new(guild_id);
    let mut result = String::from("🏦 Gringotts Rich List 🏦\n");
    for (rank, wallet) in wallets.iter().filter(|w| w.balance > 0).enumerate() {
        let name = match guild
            .member(ctx.http(), serenity::UserId::new(wallet.user_id))
            .await
        {
            Ok(member) => member.display_name().to_string(),
            Err(_) => format!("User {}", wallet.user_id),
        };
        result.push_str(&format!(
            "{}. {} — {} galleons\n",
            rank + 1,
            name,
            format_number(wallet.balance)
        ));
    }

    ctx.say(result).await?;
    Ok(())
}

/// Server display name of whoever ran the command.
pub(crate) async fn author_display_name(ctx: Context<'_>) -> String {
    match ctx.author_member().await {
        Some(member) => member.display_name().to_string(),
        None => ctx.author().name.clone(),
    }
}

/// Format a number with commas for readability
pub(crate) fn format_number(n: impl Into<i128>) -> String {
    let s = n.into().to_string();
    let negative = s.starts_with('-');
    let s = if negative { &s[1..] } else { &s };

    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }

    if negative {
        result.insert(0, '-');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(100), "100");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-1234567), "-1,234,567");
        assert_eq!(format_number(u64::MAX), "18,446,744,073,709,551,615");
    }
}
