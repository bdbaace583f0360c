//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Market card commands (post, edit, delist, list)
pub mod market;

/// Roster commands (release, balance, sync)
pub mod roster;

// Export commands
pub use general::*;
pub use market::*;
pub use roster::*;

use crate::bot::Context;
use crate::bot::handlers::roles;
use crate::errors::{Error, Result};
use poise::serenity_prelude as serenity;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Role ids the command author currently holds.
pub(crate) async fn author_roles(ctx: &Context<'_>) -> Vec<u64> {
    match ctx.author_member().await {
        Some(member) => member.roles.iter().map(|r| r.get()).collect(),
        None => Vec::new(),
    }
}

/// Rejects callers without the general-manager role.
pub(crate) fn require_gm(ctx: &Context<'_>, user_roles: &[u64], action: &str) -> Result<()> {
    if roles::has_role(user_roles, ctx.data().discord.gm_role_id) {
        Ok(())
    } else {
        Err(Error::Unauthorized {
            reason: format!("Only general managers can {action}."),
        })
    }
}

/// Converts a slash-command amount into money, rejecting NaN/infinite and
/// negative values. Zero is a legitimate amount.
pub(crate) fn to_money(amount: f64) -> Option<Decimal> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    Decimal::from_f64(amount).map(|d| d.round_dp(2))
}
