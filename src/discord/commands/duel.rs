// Discord commands for the duelling club

use crate::core::duel::{DuelError, DuelResult};
use crate::discord::commands::galleons::format_number;
use crate::discord::{guild_id, Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

/// Challenge a member to a wizard duel for galleons
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn duel(
    ctx: Context<'_>,
    #[description = "Who to duel"] member: serenity::Member,
    #[description = "Galleons at stake"] wager: i64,
) -> Result<(), Error> {
    if member.user.bot {
        ctx.say("Bots don't duel! 🤖").await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;

    match ctx
        .data()
        .duels
        .challenge(ctx.author().id.get(), member.user.id.get(), guild_id, wager)
        .await
    {
        Ok(pending) => {
            ctx.say(format!(
                "⚔️ {} challenges {} to a duel for **{}** galleons!\n{}, answer with `!accept` or `!decline` within 5 minutes.",
                ctx.author().mention(),
                member.mention(),
                format_number(pending.wager),
                member.mention()
            ))
            .await?;
        }
        Err(e) => return reply_duel_error(ctx, e).await,
    }
    Ok(())
}

/// Accept the duel waiting for you
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn accept(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    let data = ctx.data();
    let opponent_id = ctx.author().id.get();

    // Read luck before the pending duel is consumed.
    let challenger_luck = match data.duels.pending_challenger(opponent_id, guild_id) {
        Some(challenger_id) => data.magic.luck(challenger_id, guild_id),
        None => 0.0,
    };
    let opponent_luck = data.magic.luck(opponent_id, guild_id);

    match data
        .duels
        .accept(opponent_id, guild_id, challenger_luck, opponent_luck)
        .await
    {
        Ok(result) => {
            ctx.say(play_by_play(&result)).await?;
        }
        Err(e) => return reply_duel_error(ctx, e).await,
    }
    Ok(())
}

/// Turn down the duel waiting for you
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn decline(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;

    match ctx.data().duels.decline(ctx.author().id.get(), guild_id) {
        Ok(pending) => {
            ctx.say(format!(
                "🏳️ {} declined the duel from {}.",
                ctx.author().mention(),
                serenity::UserId::new(pending.challenger_id).mention()
            ))
            .await?;
        }
        Err(e) => return reply_duel_error(ctx, e).await,
    }
    Ok(())
}

fn play_by_play(result: &DuelResult) -> String {
    let challenger = serenity::UserId::new(result.challenger_id).mention();
    let opponent = serenity::UserId::new(result.opponent_id).mention();

    let mut lines = vec![format!("⚔️ {} and {} bow...", challenger, opponent)];
    for round in &result.rounds {
        let (victor, spell) = if round.challenger_won {
            (&challenger, round.challenger_spell)
        } else {
            (&opponent, round.opponent_spell)
        };
        lines.push(format!(
            "**Round {}**: {} shouts *{}*, {} shouts *{}*. {} lands *{}*!",
            round.number,
            challenger,
            round.challenger_spell,
            opponent,
            round.opponent_spell,
            victor,
            spell
        ));
    }
    lines.push(format!(
        "🏆 {} wins the duel and **{}** galleons! ({} now has {}, {} has {})",
        serenity::UserId::new(result.winner_id).mention(),
        format_number(result.wager),
        serenity::UserId::new(result.winner_id).mention(),
        format_number(result.winner_balance),
        serenity::UserId::new(result.loser_id).mention(),
        format_number(result.loser_balance)
    ));
    lines.join("\n")
}

async fn reply_duel_error(ctx: Context<'_>, error: DuelError) -> Result<(), Error> {
    let message = match error {
        DuelError::SelfDuel => "🪞 You can't duel yourself.".to_string(),
        DuelError::InvalidWager(_) => "Please wager a positive amount.".to_string(),
        DuelError::AlreadyChallenged => {
            "⏳ That member already has a duel waiting. Try again later.".to_string()
        }
        DuelError::NoPendingDuel => "🕊️ Nobody has challenged you to a duel.".to_string(),
        DuelError::CannotCoverWager { user_id, wager } => format!(
            "🚫 {} can't cover a wager of {} galleons.",
            serenity::UserId::new(user_id).mention(),
            format_number(wager)
        ),
        DuelError::Economy(e) => return Err(e.into()),
    };

    ctx.say(message).await?;
    Ok(())
}
