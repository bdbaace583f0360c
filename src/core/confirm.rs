//! Confirmation flow - one-shot tokens gating irreversible transactions.
//!
//! Every buy, release, and card deletion is a two-step exchange: propose
//! stores a [`PendingConfirmation`] and hands back a token; resolve consumes
//! the token exactly once and, on confirm, runs the matching engine
//! operation. Consumption happens under the pending-map lock before the
//! engine is called, so a double press of the confirm button yields
//! [`Error::TokenNotFound`] rather than a second transaction. This is the
//! primary double-spend defense: buttons can be pressed repeatedly and by
//! racing users, and the client-side message carries no business data at
//! all, only the generated token.
//!
//! The engine's state lock is never held while a prompt is on screen; it is
//! taken only inside the engine call after confirm.

use crate::core::engine::{BuyOutcome, MarketEngine, ReleaseOutcome};
use crate::core::ledger::PlayerId;
use crate::core::registry::{Card, CardId};
use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// The operation a pending token will trigger on confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Purchase the listed player.
    Buy {
        /// Card the buyer pressed BUY on.
        card_id: CardId,
    },
    /// Release a rostered player to free agency.
    Release {
        /// Player being released.
        player_id: PlayerId,
    },
    /// Delete a posted card without ledger changes.
    Delete {
        /// Card being removed.
        card_id: CardId,
    },
}

/// A proposed-but-unconfirmed operation. Purely transient; never persisted.
#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    /// One-shot credential handed to the prompt's buttons.
    pub token: Uuid,
    /// What confirming will do.
    pub action: ConfirmAction,
    /// User who proposed and must be the one to confirm.
    pub initiator_id: String,
    /// Instant after which the token is invalid.
    pub expires_at: DateTime<Utc>,
}

/// What happened to a resolved token.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The initiator cancelled; no engine call was made.
    Cancelled(ConfirmAction),
    /// The engine operation committed.
    Completed(TxnOutcome),
}

/// Outcome of the engine call a confirm triggered, for rendering.
#[derive(Debug, Clone)]
pub enum TxnOutcome {
    /// A purchase committed.
    Bought(BuyOutcome),
    /// A release committed.
    Released(ReleaseOutcome),
    /// A card was deleted.
    Delisted(Card),
}

/// Two-step state machine per pending operation: proposed, then resolved by
/// confirm, cancel, or expiry.
pub struct MarketController {
    engine: Arc<MarketEngine>,
    pending: Mutex<HashMap<Uuid, PendingConfirmation>>,
    ttl: Duration,
}

impl MarketController {
    /// Creates a controller over the given engine with the configured token
    /// lifetime.
    #[must_use]
    pub fn new(engine: Arc<MarketEngine>, ttl: Duration) -> Self {
        Self {
            engine,
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Stores a pending confirmation and returns its token.
    ///
    /// A poisoned pending map is surfaced here, the same way `resolve`
    /// reports it; handing out a token that was never stored would only
    /// defer the failure to the confirm press.
    pub fn propose(&self, action: ConfirmAction, initiator_id: &str) -> Result<Uuid> {
        let token = Uuid::new_v4();
        let pending = PendingConfirmation {
            token,
            action,
            initiator_id: initiator_id.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        debug!(%token, initiator = %pending.initiator_id, "confirmation proposed");
        let mut map = self
            .pending
            .lock()
            .map_err(|_| Error::Conflict { message: "confirmation state poisoned".to_string() })?;
        map.insert(token, pending);
        Ok(token)
    }

    /// Resolves a token: cancel discards it, confirm consumes it and runs
    /// the engine operation.
    ///
    /// `actor_team` is the confirming user's team resolved from their
    /// *current* roles; roles can change between propose and confirm, so
    /// authorization computed at propose time is never trusted. The token is
    /// checked before it is consumed: a wrong actor does not burn the
    /// initiator's token, while a valid confirm removes it before the engine
    /// runs so it can never fire twice.
    pub async fn resolve(
        &self,
        token: Uuid,
        confirmed: bool,
        actor_id: &str,
        actor_team: Option<&str>,
    ) -> Result<Resolution> {
        let pending = {
            let mut map = self
                .pending
                .lock()
                .map_err(|_| Error::Conflict { message: "confirmation state poisoned".to_string() })?;
            let (expired, wrong_actor) = match map.get(&token) {
                None => return Err(Error::TokenNotFound),
                Some(p) => (p.expires_at <= Utc::now(), p.initiator_id != actor_id),
            };
            if expired {
                map.remove(&token);
                return Err(Error::TokenNotFound);
            }
            if wrong_actor {
                // The initiator's token is not burned by someone else's press.
                return Err(Error::Unauthorized {
                    reason: "Only the user who started this action can confirm it.".to_string(),
                });
            }
            // One-shot: consumed before the engine runs.
            map.remove(&token).ok_or(Error::TokenNotFound)?
        };

        if !confirmed {
            debug!(%token, "confirmation cancelled");
            return Ok(Resolution::Cancelled(pending.action));
        }

        let team = |action: &str| {
            actor_team
                .map(str::to_string)
                .ok_or_else(|| Error::Unauthorized {
                    reason: format!("You must hold a team role to {action}."),
                })
        };
        let outcome = match pending.action {
            ConfirmAction::Buy { card_id } => {
                let team = team("buy a player")?;
                TxnOutcome::Bought(self.engine.buy(card_id, &team).await?)
            }
            ConfirmAction::Release { player_id } => {
                let team = team("release a player")?;
                TxnOutcome::Released(self.engine.release(&player_id, &team).await?)
            }
            ConfirmAction::Delete { card_id } => {
                TxnOutcome::Delisted(self.engine.delist(card_id).await?)
            }
        };
        Ok(Resolution::Completed(outcome))
    }

    /// Drops every expired token. Runs under the same lock as `resolve`, so
    /// a sweep cannot race an in-flight confirm.
    pub fn sweep_expired(&self) -> usize {
        let Ok(mut map) = self.pending.lock() else {
            return 0;
        };
        let now = Utc::now();
        let before = map.len();
        map.retain(|_, p| p.expires_at > now);
        let swept = before - map.len();
        if swept > 0 {
            debug!(swept, "expired confirmations swept");
        }
        swept
    }

    /// Number of outstanding confirmations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|m| m.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    fn controller(engine: Arc<MarketEngine>) -> MarketController {
        MarketController::new(engine, Duration::seconds(90))
    }

    #[tokio::test]
    async fn test_confirm_runs_the_transaction_once() {
        let engine = Arc::new(setup_engine().await);
        let card = engine
            .post_listing("p1", "Player One", dec!(50.00), None)
            .await
            .unwrap();
        let controller = controller(Arc::clone(&engine));

        let token = controller
            .propose(ConfirmAction::Buy { card_id: card.id }, "gm-1")
            .unwrap();
        let resolution = controller
            .resolve(token, true, "gm-1", Some("alpha"))
            .await
            .unwrap();

        let Resolution::Completed(TxnOutcome::Bought(outcome)) = resolution else {
            panic!("expected a completed purchase");
        };
        assert_eq!(outcome.team.balance, dec!(50.00));

        // Second confirm on the same token must not repeat the debit.
        let second = controller.resolve(token, true, "gm-1", Some("alpha")).await;
        assert!(matches!(second, Err(Error::TokenNotFound)));
        assert_eq!(engine.team("alpha").await.unwrap().balance, dec!(50.00));
    }

    #[tokio::test]
    async fn test_cancel_makes_no_engine_call() {
        let engine = Arc::new(setup_engine().await);
        let card = engine
            .post_listing("p1", "Player One", dec!(50.00), None)
            .await
            .unwrap();
        let controller = controller(Arc::clone(&engine));

        let token = controller
            .propose(ConfirmAction::Buy { card_id: card.id }, "gm-1")
            .unwrap();
        let resolution = controller
            .resolve(token, false, "gm-1", Some("alpha"))
            .await
            .unwrap();

        assert!(matches!(resolution, Resolution::Cancelled(_)));
        assert_eq!(engine.team("alpha").await.unwrap().balance, dec!(100.00));
        assert!(engine.card_by_player("p1").await.is_some());
        // Cancelled tokens are gone too.
        let reuse = controller.resolve(token, true, "gm-1", Some("alpha")).await;
        assert!(matches!(reuse, Err(Error::TokenNotFound)));
    }

    #[tokio::test]
    async fn test_wrong_actor_does_not_burn_the_token() {
        let engine = Arc::new(setup_engine().await);
        let card = engine
            .post_listing("p1", "Player One", dec!(50.00), None)
            .await
            .unwrap();
        let controller = controller(Arc::clone(&engine));

        let token = controller
            .propose(ConfirmAction::Buy { card_id: card.id }, "gm-1")
            .unwrap();
        let imposter = controller.resolve(token, true, "gm-2", Some("beta")).await;
        assert!(matches!(imposter, Err(Error::Unauthorized { .. })));

        // The initiator can still confirm afterwards.
        let resolution = controller
            .resolve(token, true, "gm-1", Some("alpha"))
            .await
            .unwrap();
        assert!(matches!(resolution, Resolution::Completed(_)));
    }

    #[tokio::test]
    async fn test_confirm_without_team_role_is_unauthorized() {
        let engine = Arc::new(setup_engine().await);
        let card = engine
            .post_listing("p1", "Player One", dec!(50.00), None)
            .await
            .unwrap();
        let controller = controller(Arc::clone(&engine));

        // Role was lost between propose and confirm.
        let token = controller
            .propose(ConfirmAction::Buy { card_id: card.id }, "gm-1")
            .unwrap();
        let result = controller.resolve(token, true, "gm-1", None).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert!(engine.card_by_player("p1").await.is_some());
    }

    #[tokio::test]
    async fn test_expired_token_is_invalid() {
        let engine = Arc::new(setup_engine().await);
        let card = engine
            .post_listing("p1", "Player One", dec!(50.00), None)
            .await
            .unwrap();
        let controller = MarketController::new(Arc::clone(&engine), Duration::seconds(-1));

        let token = controller
            .propose(ConfirmAction::Buy { card_id: card.id }, "gm-1")
            .unwrap();
        let result = controller.resolve(token, true, "gm-1", Some("alpha")).await;
        assert!(matches!(result, Err(Error::TokenNotFound)));
        assert_eq!(engine.team("alpha").await.unwrap().balance, dec!(100.00));
    }

    #[tokio::test]
    async fn test_sweep_drops_only_expired_tokens() {
        let engine = Arc::new(setup_engine().await);
        let expired = MarketController::new(Arc::clone(&engine), Duration::seconds(-1));
        expired
            .propose(ConfirmAction::Delete { card_id: Uuid::new_v4() }, "gm-1")
            .unwrap();
        assert_eq!(expired.sweep_expired(), 1);
        assert_eq!(expired.pending_count(), 0);

        let live = controller(Arc::clone(&engine));
        live.propose(ConfirmAction::Delete { card_id: Uuid::new_v4() }, "gm-1")
            .unwrap();
        assert_eq!(live.sweep_expired(), 0);
        assert_eq!(live.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_release_through_confirmation() {
        let engine = Arc::new(setup_engine().await);
        seed_owned_player(&engine, "q1", "Player Q", "beta", dec!(80.00)).await;
        let controller = controller(Arc::clone(&engine));

        let token = controller
            .propose(ConfirmAction::Release { player_id: "q1".to_string() }, "gm-2")
            .unwrap();
        let resolution = controller
            .resolve(token, true, "gm-2", Some("beta"))
            .await
            .unwrap();

        let Resolution::Completed(TxnOutcome::Released(outcome)) = resolution else {
            panic!("expected a completed release");
        };
        assert_eq!(outcome.team.balance, dec!(140.00));
        assert_eq!(outcome.refund, dec!(40.00));
        assert!(outcome.player.is_free_agent());
    }
}
