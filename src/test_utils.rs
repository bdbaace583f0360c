//! Shared test utilities for `TransferDesk`.
//!
//! Provides an engine over a temp-file snapshot with a seeded set of teams,
//! matching the scenarios the core tests exercise: team `alpha` and `beta`
//! at 100.00, team `gamma` at 10.00.

use crate::core::engine::{MarketEngine, MarketRules, MarketState, PlayerSeed};
use crate::core::ledger::Team;
use crate::storage::SnapshotStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;

/// Unique snapshot path under the system temp dir.
pub fn temp_state_path() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("transfer_desk_test_{}.json", uuid::Uuid::new_v4()));
    p
}

fn team(id: &str, name: &str, role_id: u64, balance: Decimal) -> Team {
    Team {
        id: id.to_string(),
        name: name.to_string(),
        role_id,
        balance,
    }
}

/// Market state with the standard three test teams and no players.
pub fn seeded_state() -> MarketState {
    let mut state = MarketState::default();
    state.ledger.seed_team(team("alpha", "Team Alpha", 1001, dec!(100.00)));
    state.ledger.seed_team(team("beta", "Team Beta", 1002, dec!(100.00)));
    state.ledger.seed_team(team("gamma", "Team Gamma", 1003, dec!(10.00)));
    state
}

/// Engine over a fresh temp snapshot with the standard teams seeded.
pub async fn setup_engine() -> MarketEngine {
    MarketEngine::new(
        seeded_state(),
        SnapshotStore::new(temp_state_path()),
        MarketRules::default(),
    )
}

/// Adds a player owned by the given team at the given value.
pub async fn seed_owned_player(
    engine: &MarketEngine,
    id: &str,
    name: &str,
    team_id: &str,
    value: Decimal,
) {
    engine
        .sync_roster(vec![PlayerSeed {
            id: id.to_string(),
            display_name: name.to_string(),
            owning_team: Some(team_id.to_string()),
        }])
        .await
        .unwrap();
    // sync_roster assigns the default value to new players; pin the one the
    // scenario expects.
    engine.set_player_value(id, value).await.unwrap();
}
