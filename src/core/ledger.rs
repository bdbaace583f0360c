//! Ledger store - team balances and player ownership.
//!
//! The ledger is the durable source of truth for who owns whom and how much
//! every team can spend. It is only ever mutated through the transaction
//! engine, which clones the state, applies the mutation, and persists before
//! swapping it in; nothing outside `core` holds a mutable reference.
//!
//! All monetary values are `rust_decimal::Decimal` rounded to two decimal
//! places at every mutation, so balances survive a JSON round-trip exactly.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable team identifier (config slug, not the display name).
pub type TeamId = String;
/// Stable player identifier (Discord user id, not the display name).
pub type PlayerId = String;

/// Rounds a monetary amount to the fixed two-decimal precision.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// A franchise with a spendable balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Stable identifier used for all lookups.
    pub id: TeamId,
    /// Display name shown in replies and embeds.
    pub name: String,
    /// Discord role id that marks membership of this team.
    pub role_id: u64,
    /// Current balance; never negative after a committed transaction.
    pub balance: Decimal,
}

/// A player tracked by the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier used for all lookups. Display names are not unique
    /// and must never be used as keys.
    pub id: PlayerId,
    /// Human-readable label shown in the UI.
    pub display_name: String,
    /// Owning team, or `None` for a free agent on the open market.
    pub owning_team: Option<TeamId>,
    /// Current market value.
    pub value: Decimal,
}

impl Player {
    /// Whether the player is on the open market with no owning team.
    #[must_use]
    pub const fn is_free_agent(&self) -> bool {
        self.owning_team.is_none()
    }
}

/// Balances and ownership for every team and player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    teams: BTreeMap<TeamId, Team>,
    players: BTreeMap<PlayerId, Player>,
}

impl Ledger {
    /// Looks up a team by id.
    pub fn team(&self, id: &str) -> Result<&Team> {
        self.teams.get(id).ok_or_else(|| Error::TeamNotFound { id: id.to_string() })
    }

    /// Looks up a player by id.
    pub fn player(&self, id: &str) -> Result<&Player> {
        self.players
            .get(id)
            .ok_or_else(|| Error::PlayerNotFound { id: id.to_string() })
    }

    /// All teams, ordered by id.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    /// All players, ordered by id.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Registers a team, keeping an existing entry's balance if one is
    /// already present (config reseeds must not reset balances).
    pub fn seed_team(&mut self, team: Team) {
        self.teams
            .entry(team.id.clone())
            .and_modify(|existing| {
                existing.name = team.name.clone();
                existing.role_id = team.role_id;
            })
            .or_insert(team);
    }

    /// Adds `delta` to the team balance, rejecting any result below zero.
    ///
    /// Returns the new balance. The non-negative invariant is enforced here,
    /// beneath every engine operation, so no code path can commit a negative
    /// balance.
    pub fn apply_delta(&mut self, team_id: &str, delta: Decimal) -> Result<Decimal> {
        let team = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| Error::TeamNotFound { id: team_id.to_string() })?;
        let next = round_money(team.balance + delta);
        if next < Decimal::ZERO {
            return Err(Error::InsufficientFunds {
                current: team.balance,
                required: -delta,
            });
        }
        team.balance = next;
        Ok(next)
    }

    /// Reassigns a player, optionally repricing them in the same step.
    pub fn set_ownership(
        &mut self,
        player_id: &str,
        owner: Option<TeamId>,
        new_value: Option<Decimal>,
    ) -> Result<()> {
        if let Some(team_id) = owner.as_deref() {
            if !self.teams.contains_key(team_id) {
                return Err(Error::TeamNotFound { id: team_id.to_string() });
            }
        }
        let player = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| Error::PlayerNotFound { id: player_id.to_string() })?;
        player.owning_team = owner;
        if let Some(value) = new_value {
            player.value = round_money(value);
        }
        Ok(())
    }

    /// Inserts or refreshes a player record.
    ///
    /// Existing players keep their current value unless `value` is provided;
    /// roster syncs refresh names and ownership without repricing anyone.
    pub fn upsert_player(
        &mut self,
        id: PlayerId,
        display_name: String,
        owning_team: Option<TeamId>,
        value: Option<Decimal>,
    ) -> &Player {
        let entry = self
            .players
            .entry(id.clone())
            .and_modify(|p| {
                p.display_name = display_name.clone();
                p.owning_team = owning_team.clone();
                if let Some(v) = value {
                    p.value = round_money(v);
                }
            })
            .or_insert_with(|| Player {
                id,
                display_name,
                owning_team,
                value: round_money(value.unwrap_or_default()),
            });
        entry
    }

    /// Whether a player id is already known to the ledger.
    #[must_use]
    pub fn contains_player(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger_with_team(balance: Decimal) -> Ledger {
        let mut ledger = Ledger::default();
        ledger.seed_team(Team {
            id: "lakers".to_string(),
            name: "Lakers".to_string(),
            role_id: 1,
            balance,
        });
        ledger
    }

    #[test]
    fn test_apply_delta_debits_and_credits() {
        let mut ledger = ledger_with_team(dec!(100.00));

        let after_debit = ledger.apply_delta("lakers", dec!(-50.00)).unwrap();
        assert_eq!(after_debit, dec!(50.00));

        let after_credit = ledger.apply_delta("lakers", dec!(40.00)).unwrap();
        assert_eq!(after_credit, dec!(90.00));
        assert_eq!(ledger.team("lakers").unwrap().balance, dec!(90.00));
    }

    #[test]
    fn test_apply_delta_rejects_negative_balance() {
        let mut ledger = ledger_with_team(dec!(10.00));

        let result = ledger.apply_delta("lakers", dec!(-50.00));
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        // Failed delta leaves the balance untouched.
        assert_eq!(ledger.team("lakers").unwrap().balance, dec!(10.00));
    }

    #[test]
    fn test_apply_delta_rounds_to_two_decimals() {
        let mut ledger = ledger_with_team(dec!(100.00));
        let next = ledger.apply_delta("lakers", dec!(0.005)).unwrap();
        assert_eq!(next, dec!(100.00));
    }

    #[test]
    fn test_apply_delta_unknown_team() {
        let mut ledger = Ledger::default();
        let result = ledger.apply_delta("ghosts", dec!(1.00));
        assert!(matches!(result, Err(Error::TeamNotFound { .. })));
    }

    #[test]
    fn test_set_ownership_requires_known_entities() {
        let mut ledger = ledger_with_team(dec!(100.00));
        ledger.upsert_player("p1".to_string(), "Player One".to_string(), None, Some(dec!(50)));

        let missing_player = ledger.set_ownership("p2", Some("lakers".to_string()), None);
        assert!(matches!(missing_player, Err(Error::PlayerNotFound { .. })));

        let missing_team = ledger.set_ownership("p1", Some("ghosts".to_string()), None);
        assert!(matches!(missing_team, Err(Error::TeamNotFound { .. })));

        ledger
            .set_ownership("p1", Some("lakers".to_string()), Some(dec!(60)))
            .unwrap();
        let player = ledger.player("p1").unwrap();
        assert_eq!(player.owning_team.as_deref(), Some("lakers"));
        assert_eq!(player.value, dec!(60.00));
    }

    #[test]
    fn test_upsert_player_keeps_value_when_omitted() {
        let mut ledger = ledger_with_team(dec!(100.00));
        ledger.upsert_player("p1".to_string(), "Player One".to_string(), None, Some(dec!(80.00)));

        // Roster refresh with no value supplied must not reprice.
        ledger.upsert_player(
            "p1".to_string(),
            "Player 1".to_string(),
            Some("lakers".to_string()),
            None,
        );
        let player = ledger.player("p1").unwrap();
        assert_eq!(player.display_name, "Player 1");
        assert_eq!(player.value, dec!(80.00));
        assert!(!player.is_free_agent());
    }

    #[test]
    fn test_seed_team_preserves_balance() {
        let mut ledger = ledger_with_team(dec!(250.00));
        ledger.seed_team(Team {
            id: "lakers".to_string(),
            name: "LA Lakers".to_string(),
            role_id: 2,
            balance: dec!(1000.00),
        });
        let team = ledger.team("lakers").unwrap();
        assert_eq!(team.balance, dec!(250.00));
        assert_eq!(team.name, "LA Lakers");
        assert_eq!(team.role_id, 2);
    }
}
