//! Discord ids from environment variables.
//!
//! Channel and role ids are deployment-specific, so they live in the
//! environment (via `.env`) rather than config.toml. The bot token itself is
//! read in `main`, directly before use.

use crate::errors::{Error, Result};

/// Channel and role ids the bot operates against.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Channel where player cards are posted.
    pub market_channel_id: u64,
    /// Channel receiving one log line per committed transaction, if set.
    pub log_channel_id: Option<u64>,
    /// Role required to buy, release, post, and edit cards.
    pub gm_role_id: u64,
    /// Role marking free agents, if the server uses one.
    pub free_agent_role_id: Option<u64>,
}

impl DiscordConfig {
    /// Reads the Discord ids from the environment.
    ///
    /// # Errors
    /// Returns a configuration error when a required variable is missing or
    /// not a numeric id.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            market_channel_id: required_id("TRANSFER_MARKET_CHANNEL_ID")?,
            log_channel_id: optional_id("TRANSACTION_LOG_CHANNEL_ID")?,
            gm_role_id: required_id("GENERAL_MANAGER_ROLE_ID")?,
            free_agent_role_id: optional_id("FREE_AGENT_ROLE_ID")?,
        })
    }
}

fn required_id(name: &str) -> Result<u64> {
    let raw = std::env::var(name).map_err(|_| Error::Config {
        message: format!("{name} is not set"),
    })?;
    parse_id(name, &raw)
}

fn optional_id(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse_id(name, &raw).map(Some),
        _ => Ok(None),
    }
}

fn parse_id(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| Error::Config {
        message: format!("{name} must be a numeric Discord id, got '{raw}'"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_id_accepts_snowflakes() {
        assert_eq!(parse_id("X", "100000000000000001").unwrap(), 100_000_000_000_000_001);
        assert_eq!(parse_id("X", " 42 ").unwrap(), 42);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(matches!(parse_id("X", "not-an-id"), Err(Error::Config { .. })));
        assert!(matches!(parse_id("X", ""), Err(Error::Config { .. })));
    }
}
