// This module handles bot presence and lifecycle events.
//
// Everything here is Discord-layer glue: we only work with Discord SDK types
// (Context, ActivityData, OnlineStatus) and keep the logic short.

use crate::config::BotConfig;
use poise::serenity_prelude as serenity;

/// Resets the bot's status to the default message.
pub fn reset_status(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("over Hogwarts | !hedwighelp");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is ready: set the presence and let the Owlry know
/// Hedwig has landed.
pub async fn on_ready(ctx: &serenity::Context, config: &BotConfig) {
    reset_status(ctx);

    let Some(owlry) = config.channels.owlry else {
        return;
    };
    if let Err(e) = serenity::ChannelId::new(owlry.get())
        .say(ctx, "🦉 Hedwig has landed and is ready to deliver!")
        .await
    {
        tracing::warn!("Failed to announce startup in the Owlry: {}", e);
    }
}
