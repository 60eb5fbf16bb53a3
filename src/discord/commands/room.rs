// Discord commands for the Room of Requirement

use crate::core::magic::EnchantmentId;
use crate::core::room::{ChallengeOutcome, Fate, RoomError, POTION_COUNT};
use crate::discord::commands::galleons::format_number;
use crate::discord::guild_ops::{self, is_staff};
use crate::discord::room_channel;
use crate::discord::{guild_id, Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::sync::Arc;

/// Pick one of the five potions in the Room of Requirement
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn choose(
    ctx: Context<'_>,
    #[description = "Potion number (1-5)"] potion: i64,
) -> Result<(), Error> {
    let data = ctx.data();
    let room = serenity::ChannelId::new(data.config.channels.room_of_requirement.get());
    if ctx.channel_id() != room {
        ctx.send(
            poise::CreateReply::default()
                .content(wrong_channel_notice(room))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;
    let user_id = ctx.author().id;

    let luck = data.magic.luck(user_id.get(), guild_id);
    let outcome = match data.room.choose(user_id.get(), guild_id, potion, luck).await {
        Ok(outcome) => outcome,
        Err(RoomError::InvalidPick(_)) => {
            ctx.say(format!(
                "❌ Pick a potion between 1 and {}.",
                POTION_COUNT
            ))
            .await?;
            return Ok(());
        }
        Err(RoomError::NoChallenge) => {
            ctx.say("🚪 The room hasn't opened for you. Someone has to cast Alohomora first.")
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    ctx.say(describe(&outcome, user_id)).await?;

    // The door closes behind them.
    if let Some(removed) = data
        .magic
        .dispel(user_id.get(), guild_id, EnchantmentId::Alohomora)
    {
        guild_ops::sync_removed(
            ctx.http(),
            &data.config,
            serenity::GuildId::new(guild_id),
            user_id,
            &removed,
        )
        .await;
    }

    room_channel::schedule_purge(
        Arc::clone(&ctx.serenity_context().http),
        Arc::clone(&data.config),
    );
    Ok(())
}

fn wrong_channel_notice(room: serenity::ChannelId) -> String {
    format!("🚪 Please use this command in {}.", room.mention())
}

fn describe(outcome: &ChallengeOutcome, user_id: serenity::UserId) -> String {
    let mut message = String::new();
    match outcome.fate {
        Some(Fate::Fortune) => message.push_str(&format!(
            "🍀 Felix Felicis guides your hand from potion {} to potion {}...\n",
            outcome.picked, outcome.resolved
        )),
        Some(Fate::Misfortune) => message.push_str(&format!(
            "💀 Your luck runs dry. Your hand slips from potion {} to potion {}...\n",
            outcome.picked, outcome.resolved
        )),
        None => {}
    }

    if outcome.won {
        let balance = outcome
            .new_balance
            .map(|b| format!(" You now have {} galleons.", format_number(b)))
            .unwrap_or_default();
        message.push_str(&format!(
            "🎉 {} picked the right potion and won **{}** galleons!{}",
            user_id.mention(),
            format_number(outcome.reward),
            balance
        ));
    } else {
        message.push_str(&format!(
            "💨 Nothing happens. The winning potion was number {}. Better luck next time, {}!",
            outcome.winning,
            user_id.mention()
        ));
    }
    message
}

/// Send a member into the Room of Requirement (Prefects & Head of House only)
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    rename = "trigger-game",
    aliases("trigger_game", "triggergame")
)]
pub async fn trigger_game(
    ctx: Context<'_>,
    #[description = "Member to send in (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    if !is_staff(ctx).await {
        ctx.say("🚫 You don't have permission to open the Room of Requirement.")
            .await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;
    let data = ctx.data();
    let user_id = member.as_ref().map_or(ctx.author().id, |m| m.user.id);

    data.room
        .start_challenge(user_id.get(), guild_id, ctx.author().id.get());
    room_channel::announce(ctx.http(), &data.config, user_id).await?;

    ctx.say(format!(
        "🚪 The Room of Requirement has opened for {}.",
        user_id.mention()
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(won: bool, fate: Option<Fate>) -> ChallengeOutcome {
        ChallengeOutcome {
            picked: 2,
            resolved: if fate.is_some() { 4 } else { 2 },
            winning: if won { 4 } else { 3 },
            fate,
            won,
            reward: if won { 100 } else { 0 },
            new_balance: if won { Some(1100) } else { None },
        }
    }

    #[test]
    fn test_describe_win_with_fortune() {
        let text = describe(&outcome(true, Some(Fate::Fortune)), serenity::UserId::new(5));
        assert!(text.contains("Felix Felicis"));
        assert!(text.contains("**100**"));
        assert!(text.contains("1,100"));
        assert!(text.contains("<@5>"));
    }

    #[test]
    fn test_describe_loss_reveals_winner() {
        let text = describe(&outcome(false, None), serenity::UserId::new(5));
        assert!(text.contains("number 3"));
        assert!(!text.contains("Felix"));
    }

    #[test]
    fn test_wrong_channel_points_to_the_room() {
        let room = serenity::ChannelId::new(1413134135169646624);
        assert_eq!(
            wrong_channel_notice(room),
            "🚪 Please use this command in <#1413134135169646624>."
        );
    }
}
