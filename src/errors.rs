//! Unified error types for the transfer market.
//!
//! Errors split into two audiences: user-facing outcomes of a command or
//! button press (missing cards, insufficient funds, lost races) and internal
//! failures (persistence, configuration, Discord API). `user_message` maps
//! the former to a reply string; everything else is logged and surfaced as a
//! generic failure by the command dispatcher.

use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the market core and the Discord layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("team '{id}' not found")]
    TeamNotFound {
        /// Stable team identifier that failed to resolve.
        id: String,
    },

    #[error("player '{id}' not found")]
    PlayerNotFound {
        /// Stable player identifier that failed to resolve.
        id: String,
    },

    #[error("no active card matches '{reference}'")]
    CardNotFound {
        /// How the caller referred to the card (card id or message id).
        reference: String,
    },

    #[error("confirmation token is invalid, already used, or expired")]
    TokenNotFound,

    #[error("player '{player}' is not owned by team '{team}'")]
    NotOwner {
        /// Player the operation targeted.
        player: String,
        /// Team that claimed ownership.
        team: String,
    },

    #[error("not eligible: {reason}")]
    NotEligible {
        /// Why the buyer cannot take this listing.
        reason: String,
    },

    #[error("user holds roles for more than one team: {teams:?}")]
    AmbiguousTeam {
        /// Names of every team whose role the user holds.
        teams: Vec<String>,
    },

    #[error("insufficient funds: balance is {current}, {required} required")]
    InsufficientFunds {
        /// Current team balance.
        current: Decimal,
        /// Listed price that could not be covered.
        required: Decimal,
    },

    #[error("conflict: {message}")]
    Conflict {
        /// What the caller lost the race to.
        message: String,
    },

    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The offending monetary value.
        amount: Decimal,
    },

    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Which check failed.
        reason: String,
    },

    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the configuration problem.
        message: String,
    },

    #[error("persistence error: {message}")]
    Persistence {
        /// What the snapshot store failed to do.
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Error::Framework(Box::new(value))
    }
}

impl Error {
    /// Reply text for errors a user can act on, `None` for internal failures.
    ///
    /// `Conflict` gets distinct copy from the not-found family so a user who
    /// lost a race is told someone beat them to it rather than that the
    /// listing never existed.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Error::TeamNotFound { id } => Some(format!("❌ Could not find team `{id}`.")),
            Error::PlayerNotFound { id } => Some(format!("❌ Could not find player `{id}`.")),
            Error::CardNotFound { reference } => {
                Some(format!("❌ Could not find a market card for `{reference}`."))
            }
            Error::TokenNotFound => {
                Some("❌ This confirmation has expired or was already used.".to_string())
            }
            Error::NotOwner { player, team: _ } => {
                Some(format!("❌ That player (`{player}`) is not on your team."))
            }
            Error::NotEligible { reason } => Some(format!("❌ {reason}")),
            Error::AmbiguousTeam { teams } => Some(format!(
                "❌ You hold roles for multiple teams ({}). Ask an admin to fix your roles.",
                teams.join(", ")
            )),
            Error::InsufficientFunds { current, required } => Some(format!(
                "❌ Insufficient funds: your team has ${current:.2} but ${required:.2} is required."
            )),
            Error::Conflict { message } => Some(format!("❌ Too late: {message}")),
            Error::InvalidAmount { amount } => Some(format!("❌ Invalid amount: {amount}")),
            Error::Unauthorized { reason } => Some(format!("❌ {reason}")),
            _ => None,
        }
    }
}

/// Convenience `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
