//! Persistence layer.
//!
//! Saves and loads the market snapshot to/from a JSON file. The engine
//! flushes after every committed transaction, so the only inconsistency
//! window is a crash between commit and flush; on restart the last flushed
//! snapshot is loaded verbatim. Writes go to a temp file and are renamed
//! into place so a crash mid-write never truncates the live snapshot.

use crate::core::engine::MarketState;
use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// JSON snapshot store for the complete market state.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store over the given snapshot path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path the snapshot is written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the last flushed snapshot. Returns `None` when no snapshot
    /// exists yet (fresh start; the caller seeds from config).
    pub fn load(&self) -> Result<Option<MarketState>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no saved market state, starting fresh");
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path).map_err(|e| Error::Persistence {
            message: format!("failed to read {}: {e}", self.path.display()),
        })?;
        let state: MarketState = serde_json::from_str(&json).map_err(|e| Error::Persistence {
            message: format!("failed to parse {}: {e}", self.path.display()),
        })?;

        info!(
            path = %self.path.display(),
            teams = state.ledger.teams().count(),
            players = state.ledger.players().count(),
            cards = state.registry.len(),
            "market state loaded"
        );
        Ok(Some(state))
    }

    /// Serializes the state and atomically replaces the snapshot file.
    pub fn save(&self, state: &MarketState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).map_err(|e| Error::Persistence {
            message: format!("failed to serialize market state: {e}"),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Persistence {
                    message: format!("failed to create {}: {e}", parent.display()),
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| Error::Persistence {
            message: format!("failed to write {}: {e}", tmp.display()),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::Persistence {
            message: format!("failed to replace {}: {e}", self.path.display()),
        })?;

        debug!(path = %self.path.display(), bytes = json.len(), "market state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger::Team;
    use crate::core::registry::CardStatus;
    use rust_decimal_macros::dec;

    fn sample_state() -> MarketState {
        let mut state = MarketState::default();
        state.ledger.seed_team(Team {
            id: "lakers".to_string(),
            name: "Lakers".to_string(),
            role_id: 1,
            balance: dec!(1234.56),
        });
        state.ledger.upsert_player(
            "p1".to_string(),
            "Player One".to_string(),
            None,
            Some(dec!(50.00)),
        );
        state
            .registry
            .create_card("p1".to_string(), dec!(50.00), CardStatus::FreeAgent, None, None)
            .unwrap();
        state
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = SnapshotStore::new(crate::test_utils::temp_state_path());
        let state = sample_state();

        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, state);

        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_save_is_deterministic() {
        // save(load(save(state))) must equal save(state), bytes included.
        let store = SnapshotStore::new(crate::test_utils::temp_state_path());
        let state = sample_state();

        store.save(&state).unwrap();
        let first = std::fs::read_to_string(store.path()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        store.save(&loaded).unwrap();
        let second = std::fs::read_to_string(store.path()).unwrap();

        assert_eq!(first, second);
        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_fresh_start() {
        let store = SnapshotStore::new(crate::test_utils::temp_state_path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_monetary_precision_survives() {
        let store = SnapshotStore::new(crate::test_utils::temp_state_path());
        let mut state = MarketState::default();
        state.ledger.seed_team(Team {
            id: "celtics".to_string(),
            name: "Celtics".to_string(),
            role_id: 2,
            balance: dec!(0.01),
        });

        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.ledger.team("celtics").unwrap().balance, dec!(0.01));

        std::fs::remove_file(store.path()).unwrap();
    }
}
