// Discord layer - commands and the glue that applies core results to a guild.

use crate::config::BotConfig;
use crate::core::duel::DuelService;
use crate::core::economy::EconomyService;
use crate::core::house_points::HousePointsService;
use crate::core::magic::MagicService;
use crate::core::room::RoomService;
use crate::infra::economy::InMemoryGalleonStore;
use crate::infra::house_points::InMemoryHousePointsStore;
use std::sync::Arc;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "guild_ops.rs"]
pub mod guild_ops;

#[path = "room_channel.rs"]
pub mod room_channel;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub type Galleons = EconomyService<InMemoryGalleonStore>;
pub type Magic = MagicService<InMemoryGalleonStore>;

/// Shared state handed to every command.
pub struct Data {
    pub config: Arc<BotConfig>,
    pub economy: Arc<Galleons>,
    pub house_points: Arc<HousePointsService<InMemoryHousePointsStore>>,
    pub magic: Arc<Magic>,
    pub room: Arc<RoomService<InMemoryGalleonStore>>,
    pub duels: Arc<DuelService<InMemoryGalleonStore>>,
}

/// Guild ID of the invoking context, or an error for DMs.
pub fn guild_id(ctx: &Context<'_>) -> Result<u64, Error> {
    Ok(ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get())
}
