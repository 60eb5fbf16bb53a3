// Discord commands for the house cup

use crate::core::house_points::{House, HousePointsError, StoreError};
use crate::discord::commands::galleons::format_number;
use crate::discord::guild_ops::is_staff;
use crate::discord::{guild_id, Context, Error};
use poise::serenity_prelude as serenity;

/// Show the house cup standings
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn points(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    let standings = ctx.data().house_points.standings(guild_id).await?;
    let emojis = &ctx.data().config.emojis;

    let lines: Vec<String> = standings
        .iter()
        .enumerate()
        .map(|(rank, (house, total))| {
            format!(
                "{}. {} **{}**: {} points",
                rank + 1,
                emojis.house(*house),
                house.display_name(),
                format_number(*total)
            )
        })
        .collect();

    let embed = serenity::CreateEmbed::new()
        .title("🏆 House Cup Standings")
        .description(lines.join("\n"))
        .color(0xD4AF37);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Award or deduct house points (Prefects & Head of House only)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn addpoints(
    ctx: Context<'_>,
    #[description = "gryffindor, slytherin, ravenclaw or hufflepuff"]
    #[autocomplete = "autocomplete_houses"]
    house: String,
    #[description = "Points to add (negative to deduct)"] amount: i64,
) -> Result<(), Error> {
    if !is_staff(ctx).await {
        ctx.say("🚫 You don't have permission to change house points.")
            .await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;

    match ctx
        .data()
        .house_points
        .add_points(guild_id, &house, amount)
        .await
    {
        Ok((house, total)) => {
            let emoji = ctx.data().config.emojis.house(house);
            ctx.say(points_changed(emoji, house, amount, total)).await?;
        }
        Err(HousePointsError::UnknownHouse(_)) => {
            ctx.say("❓ That house does not exist.").await?;
        }
        Err(HousePointsError::Store(StoreError::Overflow(house))) => {
            ctx.say(format!(
                "🧮 {} can't hold that many points.",
                house.display_name()
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Reset every house to zero (Prefects & Head of House only)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn resetpoints(ctx: Context<'_>) -> Result<(), Error> {
    if !is_staff(ctx).await {
        ctx.say("🚫 You don't have permission to reset house points.")
            .await?;
        return Ok(());
    }
    let guild_id = guild_id(&ctx)?;

    ctx.data().house_points.reset(guild_id).await?;
    ctx.say("🔄 The house cup has been reset. Every house starts again from zero.")
        .await?;
    Ok(())
}

fn points_changed(emoji: &str, house: House, amount: i64, total: i64) -> String {
    let verb = if amount >= 0 { "awarded to" } else { "taken from" };
    format!(
        "{} {} points {} **{}**! They now have {}.",
        emoji,
        format_number(amount.unsigned_abs()),
        verb,
        house.display_name(),
        format_number(total)
    )
}

async fn autocomplete_houses<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let partial = partial.to_lowercase();
    House::ALL
        .into_iter()
        .filter(move |house| house.as_str().starts_with(&partial))
        .map(|house| house.as_str().to_string())
}
