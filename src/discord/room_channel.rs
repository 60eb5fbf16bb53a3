// Room of Requirement channel handling: the welcome, and the clean-up.

use crate::config::BotConfig;
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::sync::Arc;
use std::time::Duration;

/// Messages removed per purge. Discord's bulk delete caps at 100.
const PURGE_LIMIT: u8 = 100;

/// Bulk delete rejects messages older than two weeks.
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

/// Welcome a member into the room and lay out the potions.
///
/// The potions go in their own message so Discord renders them jumbo-sized.
pub async fn announce(
    http: &serenity::Http,
    config: &BotConfig,
    user_id: serenity::UserId,
) -> Result<(), serenity::Error> {
    let room = serenity::ChannelId::new(config.channels.room_of_requirement.get());

    room.say(
        http,
        format!(
            "🔮 Welcome {}!\nPick a potion with `!choose 1-5`",
            user_id.mention()
        ),
    )
    .await?;
    room.say(http, config.emojis.potions.join(" ")).await?;
    Ok(())
}

/// Wipe the room once the configured delay has passed.
pub fn schedule_purge(http: Arc<serenity::Http>, config: Arc<BotConfig>) {
    let delay = Duration::from_secs(config.room_purge_delay_secs);
    let room = serenity::ChannelId::new(config.channels.room_of_requirement.get());

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        if let Err(e) = purge(&http, room).await {
            tracing::warn!("Failed to purge the Room of Requirement: {}", e);
        }
    });
}

async fn purge(http: &serenity::Http, room: serenity::ChannelId) -> Result<(), serenity::Error> {
    let cutoff = chrono::Utc::now().timestamp() - BULK_DELETE_MAX_AGE_SECS;
    let ids: Vec<serenity::MessageId> = room
        .messages(http, serenity::GetMessages::new().limit(PURGE_LIMIT))
        .await?
        .iter()
        .filter(|m| m.timestamp.unix_timestamp() > cutoff)
        .map(|m| m.id)
        .collect();
    if ids.is_empty() {
        return Ok(());
    }

    let count = ids.len();
    room.delete_messages(http, ids).await?;
    tracing::info!(count, "Room of Requirement purged");
    Ok(())
}
