//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the framework-agnostic market core into poise/serenity:
//! slash commands, button handlers, and the shared bot context. All state
//! changes flow through the engine and controller; this layer only renders
//! results and tolerates the rendered surfaces going missing.

/// Discord command implementations (market, roster, general)
pub mod commands;
/// Discord interaction handlers (buttons, role resolution)
pub mod handlers;
/// Embed construction and card message lifecycle
pub mod surface;

use crate::config::discord::DiscordConfig;
use crate::core::confirm::MarketController;
use crate::core::engine::MarketEngine;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};

/// Shared data available to all bot commands and handlers.
pub struct BotData {
    /// Transaction engine holding the market state.
    pub engine: Arc<MarketEngine>,
    /// Confirmation flow controller.
    pub controller: Arc<MarketController>,
    /// Channel and role ids.
    pub discord: DiscordConfig,
}

impl BotData {
    /// Creates the shared bot context.
    #[must_use]
    pub fn new(
        engine: Arc<MarketEngine>,
        controller: Arc<MarketController>,
        discord: DiscordConfig,
    ) -> Self {
        Self { engine, controller, discord }
    }
}

pub(crate) type Error = crate::errors::Error;
pub(crate) type Context<'a> = poise::Context<'a, BotData, Error>;

/// Per-interaction error hook: user-facing errors become ❌ replies, internal
/// ones are logged and degraded to a generic failure message. One failing
/// interaction never takes down the dispatcher.
async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = error.user_message().unwrap_or_else(|| {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
                "❌ Something went wrong. Please try again.".to_string()
            });
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Runs the bot until the gateway connection ends.
///
/// Spawns the confirmation sweeper alongside the client so abandoned prompts
/// are dropped even when nobody presses their buttons.
pub async fn run_bot(token: String, data: BotData) -> Result<(), serenity::Error> {
    let controller = Arc::clone(&data.controller);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            ticker.tick().await;
            controller.sweep_expired();
        }
    });

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::balance(),
                commands::market(),
                commands::postcard(),
                commands::editcard(),
                commands::delistcard(),
                commands::release(),
                commands::syncroster(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    if let serenity::FullEvent::InteractionCreate { interaction } = event {
                        if let Some(component) = interaction.as_message_component() {
                            handlers::buttons::handle_component(ctx, component, data).await?;
                        }
                    }
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Slash commands registered");
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;
    client.start().await
}
