//! Market configuration loading from config.toml
//!
//! The teams defined here seed the ledger on first run; later runs keep the
//! persisted balances and only refresh names and role ids. The `[market]`
//! section pins the policy knobs the prototypes disagreed on (refund rate,
//! currency units, confirmation lifetime) so they are configuration rather
//! than folklore.

use crate::core::engine::MarketRules;
use crate::core::ledger::Team;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Market-wide policy settings
    pub market: MarketSettings,
    /// Team roster to seed into the ledger
    pub teams: Vec<TeamConfig>,
}

/// The `[market]` section.
#[derive(Debug, Deserialize)]
pub struct MarketSettings {
    /// Fraction of a player's value refunded on release
    #[serde(default = "default_refund_rate")]
    pub refund_rate: Decimal,
    /// Seconds before a pending confirmation expires
    #[serde(default = "default_confirm_ttl_secs")]
    pub confirm_ttl_secs: u64,
    /// Where the ledger snapshot is persisted
    #[serde(default = "default_state_path")]
    pub state_path: String,
    /// Value assigned to players first seen via roster sync
    #[serde(default = "default_player_value")]
    pub default_player_value: Decimal,
}

fn default_refund_rate() -> Decimal {
    dec!(0.5)
}

fn default_confirm_ttl_secs() -> u64 {
    90
}

fn default_state_path() -> String {
    "data/market_state.json".to_string()
}

fn default_player_value() -> Decimal {
    dec!(50.00)
}

/// Configuration for a single team
#[derive(Debug, Deserialize, Clone)]
pub struct TeamConfig {
    /// Stable identifier used as the ledger key
    pub id: String,
    /// Display name
    pub name: String,
    /// Discord role id marking membership of this team
    pub role_id: u64,
    /// Balance the team starts with on first run
    pub starting_balance: Decimal,
}

impl Config {
    /// Market policy derived from the `[market]` section.
    #[must_use]
    pub fn rules(&self) -> MarketRules {
        MarketRules {
            refund_rate: self.market.refund_rate,
            default_player_value: self.market.default_player_value,
        }
    }

    /// Ledger team records for the configured roster.
    #[must_use]
    pub fn seed_teams(&self) -> Vec<Team> {
        self.teams
            .iter()
            .map(|t| Team {
                id: t.id.clone(),
                name: t.name.clone(),
                role_id: t.role_id,
                balance: crate::core::ledger::round_money(t.starting_balance),
            })
            .collect()
    }
}

/// Loads market configuration from a TOML file, validating the policy
/// values.
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, the
/// refund rate falls outside `[0, 1]`, a starting balance is negative, or
/// two teams share an id.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Loads market configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

fn validate(config: &Config) -> Result<()> {
    let rate = config.market.refund_rate;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(Error::Config {
            message: format!("refund_rate must be between 0 and 1, got {rate}"),
        });
    }
    let mut seen = std::collections::BTreeSet::new();
    for team in &config.teams {
        if team.starting_balance < Decimal::ZERO {
            return Err(Error::Config {
                message: format!("team '{}' has a negative starting balance", team.id),
            });
        }
        if !seen.insert(team.id.as_str()) {
            return Err(Error::Config {
                message: format!("duplicate team id '{}'", team.id),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const SAMPLE: &str = r#"
        [market]
        refund_rate = 0.5
        confirm_ttl_secs = 120
        state_path = "data/test_state.json"
        default_player_value = 25.0

        [[teams]]
        id = "lakers"
        name = "Lakers"
        role_id = 1001
        starting_balance = 1000.0

        [[teams]]
        id = "celtics"
        name = "Celtics"
        role_id = 1002
        starting_balance = 750.50
    "#;

    #[test]
    fn test_parse_market_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        validate(&config).unwrap();

        assert_eq!(config.market.refund_rate, dec!(0.5));
        assert_eq!(config.market.confirm_ttl_secs, 120);
        assert_eq!(config.teams.len(), 2);
        assert_eq!(config.teams[1].id, "celtics");
        assert_eq!(config.teams[1].starting_balance, dec!(750.50));

        let teams = config.seed_teams();
        assert_eq!(teams[0].role_id, 1001);
        assert_eq!(teams[1].balance, dec!(750.50));
    }

    #[test]
    fn test_defaults_apply_when_section_is_sparse() {
        let toml_str = r#"
            [market]

            [[teams]]
            id = "lakers"
            name = "Lakers"
            role_id = 1001
            starting_balance = 1000.0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.market.refund_rate, dec!(0.5));
        assert_eq!(config.market.confirm_ttl_secs, 90);
        assert_eq!(config.market.default_player_value, dec!(50.00));
    }

    #[test]
    fn test_refund_rate_out_of_range_rejected() {
        let toml_str = r#"
            [market]
            refund_rate = 1.5

            [[teams]]
            id = "lakers"
            name = "Lakers"
            role_id = 1001
            starting_balance = 1000.0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(matches!(validate(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_duplicate_team_ids_rejected() {
        let toml_str = r#"
            [market]

            [[teams]]
            id = "lakers"
            name = "Lakers"
            role_id = 1001
            starting_balance = 1000.0

            [[teams]]
            id = "lakers"
            name = "Lakers Again"
            role_id = 1002
            starting_balance = 500.0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(matches!(validate(&config), Err(Error::Config { .. })));
    }
}
