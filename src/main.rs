//! Binary entry point: configuration, state loading, and bot startup.

use std::env;
use std::sync::Arc;

use chrono::Duration;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use transfer_desk::bot::{self, BotData};
use transfer_desk::config::discord::DiscordConfig;
use transfer_desk::config::market;
use transfer_desk::core::confirm::MarketController;
use transfer_desk::core::engine::{MarketEngine, MarketState};
use transfer_desk::errors::{Error, Result};
use transfer_desk::storage::SnapshotStore;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();

    // 3. Load market configuration
    let config = market::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {e}"))?;
    info!(teams = config.teams.len(), "Market configuration loaded");

    // 4. Load the last snapshot, or seed a fresh state from the config
    let store = SnapshotStore::new(&config.market.state_path);
    let mut state = store.load()?.unwrap_or_default();
    for team in config.seed_teams() {
        state.ledger.seed_team(team);
    }
    verify_seeded(&state);
    store.save(&state)?;

    // 5. Build the engine and confirmation controller
    let engine = Arc::new(MarketEngine::new(state, store, config.rules()));
    let controller = Arc::new(MarketController::new(
        Arc::clone(&engine),
        Duration::seconds(i64::try_from(config.market.confirm_ttl_secs).unwrap_or(90)),
    ));

    // 6. Discord ids and token, read directly before use
    let discord = DiscordConfig::from_env()?;
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    // 7. Run the bot
    bot::run_bot(token, BotData::new(engine, controller, discord))
        .await
        .map_err(Error::from)?;

    Ok(())
}

/// Startup sanity check for hand-edited snapshots: every free agent should
/// have an active card. Violations are logged, not fatal; the market can be
/// repaired with `/postcard` and `/delistcard`.
fn verify_seeded(state: &MarketState) {
    for player in state.ledger.players() {
        if player.is_free_agent() && state.registry.by_player(&player.id).is_none() {
            tracing::warn!(
                player = %player.id,
                "free agent has no active card; repost with /postcard"
            );
        }
    }
}
