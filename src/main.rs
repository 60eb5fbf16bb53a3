// This is the entry point of Hedwig, the Hogwarts server's owl.
//
// **Architecture Overview:**
// - `core/` = Game rules (platform-agnostic): galleons, house points,
//   spells and potions, the Room of Requirement, duels
// - `infra/` = Implementations of core storage traits
// - `discord/` = Discord-specific adapters (commands, guild side effects)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::duel::DuelService;
use crate::core::economy::EconomyService;
use crate::core::house_points::HousePointsService;
use crate::core::magic::MagicService;
use crate::core::room::RoomService;
use crate::discord::commands::presence;
use crate::discord::{Data, Error};
use crate::infra::economy::InMemoryGalleonStore;
use crate::infra::house_points::InMemoryHousePointsStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    _data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot } = event {
        tracing::info!(
            user = %data_about_bot.user.name,
            guilds = data_about_bot.guilds.len(),
            "Connected to Discord"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;
    let config = Arc::new(BotConfig::load()?);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let economy = Arc::new(EconomyService::new(InMemoryGalleonStore::new()));
    let house_points = Arc::new(HousePointsService::new(InMemoryHousePointsStore::new()));
    let magic = Arc::new(MagicService::new(Arc::clone(&economy)));
    let room = Arc::new(RoomService::new(Arc::clone(&economy)));
    let duels = Arc::new(DuelService::new(Arc::clone(&economy)));

    let data = Data {
        config: Arc::clone(&config),
        economy,
        house_points,
        magic,
        room,
        duels,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required for `!` commands
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::debug!(
                        command = %ctx.command().qualified_name,
                        user_id = ctx.author().id.get(),
                        "Running command"
                    );
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("🦉 Hedwig is taking flight...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("✅ Commands registered!");

                presence::on_ready(ctx, &data.config).await;
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
