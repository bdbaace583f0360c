//! Transaction engine - atomic, all-or-nothing market operations.
//!
//! Every mutation follows the same commit protocol: take the state lock,
//! validate preconditions against the live state, apply the mutation to a
//! clone, flush the clone to the snapshot store, then swap it in. A failed
//! precondition or a failed flush leaves both memory and disk exactly as
//! they were. The lock is held only for the duration of one operation and
//! never across user-facing waits; confirmation prompts live entirely
//! outside it, in [`crate::core::confirm`].

use crate::core::ledger::{Ledger, Player, PlayerId, Team, TeamId, round_money};
use crate::core::registry::{Card, CardId, CardRegistry, CardStatus, RenderLocation};
use crate::errors::{Error, Result};
use crate::storage::SnapshotStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

/// Policy knobs the prototypes disagreed on, made explicit.
#[derive(Debug, Clone)]
pub struct MarketRules {
    /// Fraction of a player's value refunded on release. Default 0.5.
    pub refund_rate: Decimal,
    /// Value assigned to players first seen via roster sync.
    pub default_player_value: Decimal,
}

impl Default for MarketRules {
    fn default() -> Self {
        Self {
            refund_rate: dec!(0.5),
            default_player_value: dec!(50.00),
        }
    }
}

/// The complete market state: ledger plus active cards.
///
/// Cards are persisted alongside the ledger so the free-agent/active-card
/// pairing survives a restart. `BTreeMap` backing keeps the serialized form
/// deterministic, so saving the same state twice yields identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    /// Team balances and player ownership.
    pub ledger: Ledger,
    /// Active market listings.
    pub registry: CardRegistry,
}

/// Result of a committed purchase, for rendering and logging.
#[derive(Debug, Clone)]
pub struct BuyOutcome {
    /// Player after the ownership change.
    pub player: Player,
    /// Buying team after the debit.
    pub team: Team,
    /// Price actually paid (the listed price).
    pub price: Decimal,
    /// Where the purchased card was rendered, so the message can be removed.
    pub removed_render: Option<RenderLocation>,
}

/// Result of a committed release.
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    /// Player after being freed.
    pub player: Player,
    /// Releasing team after the refund credit.
    pub team: Team,
    /// Amount credited back (`value * refund_rate`, rounded to 2dp).
    pub refund: Decimal,
    /// Free-agent card created for the released player; not yet rendered.
    pub card: Card,
}

/// Partial update for a listing. `None` means the field was omitted and is
/// retained; `Some` always applies, even for zero or `false`. Truthiness
/// must never decide whether a field updates.
#[derive(Debug, Clone, Default)]
pub struct ListingEdit {
    /// New listed price, if given.
    pub price: Option<Decimal>,
    /// New card art, if given.
    pub image_url: Option<String>,
    /// New free-agent flag, if given.
    pub free_agent: Option<bool>,
}

/// A player record produced by the external roster scan.
#[derive(Debug, Clone)]
pub struct PlayerSeed {
    /// Discord user id.
    pub id: PlayerId,
    /// Current display name.
    pub display_name: String,
    /// Team whose role the member holds, if any.
    pub owning_team: Option<TeamId>,
}

/// Counts reported after a roster sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct RosterSyncReport {
    /// Players the sync introduced.
    pub created: usize,
    /// Players the sync refreshed.
    pub updated: usize,
}

/// Serializes all market mutations behind a single lock and the snapshot
/// store. Expected contention is a handful of GMs, so one global lock is
/// deliberate; per-entity locking would buy nothing here.
pub struct MarketEngine {
    state: Mutex<MarketState>,
    store: SnapshotStore,
    rules: MarketRules,
}

impl MarketEngine {
    /// Wraps an initial state (loaded snapshot or seeded config roster).
    #[must_use]
    pub fn new(state: MarketState, store: SnapshotStore, rules: MarketRules) -> Self {
        Self {
            state: Mutex::new(state),
            store,
            rules,
        }
    }

    /// Market policy in effect.
    #[must_use]
    pub const fn rules(&self) -> &MarketRules {
        &self.rules
    }

    /// Flushes `next` to disk, then makes it the live state. Called with the
    /// lock held; a persistence failure leaves the live state untouched.
    fn commit(guard: &mut MutexGuard<'_, MarketState>, store: &SnapshotStore, next: MarketState) -> Result<()> {
        store.save(&next)?;
        **guard = next;
        Ok(())
    }

    /// Purchases the listed player for `buyer_team`: debits the listed
    /// price, transfers ownership, and removes the card.
    ///
    /// A missing card is reported as a [`Error::Conflict`], not a generic
    /// not-found: the card id was valid when the buyer pressed BUY, so its
    /// absence means someone else got there first.
    pub async fn buy(&self, card_id: CardId, buyer_team: &str) -> Result<BuyOutcome> {
        let mut guard = self.state.lock().await;

        let card = guard
            .registry
            .card(&card_id)
            .cloned()
            .ok_or_else(|| Error::Conflict {
                message: "that player was already bought or delisted".to_string(),
            })?;
        // An unregistered buyer cannot take any listing; this is an
        // eligibility failure, not a lookup failure.
        let team = guard
            .ledger
            .team(buyer_team)
            .map_err(|_| Error::NotEligible {
                reason: format!("Team '{buyer_team}' is not registered in the market."),
            })?
            .clone();
        let player = guard.ledger.player(&card.player_id)?.clone();

        if player.owning_team.as_deref() == Some(buyer_team) {
            return Err(Error::NotEligible {
                reason: format!("{} is already on your team.", player.display_name),
            });
        }
        if team.balance < card.listed_price {
            return Err(Error::InsufficientFunds {
                current: team.balance,
                required: card.listed_price,
            });
        }

        let mut next = guard.clone();
        next.ledger.apply_delta(buyer_team, -card.listed_price)?;
        next.ledger
            .set_ownership(&card.player_id, Some(buyer_team.to_string()), None)?;
        next.registry.remove(&card_id);
        Self::commit(&mut guard, &self.store, next)?;

        let player = guard.ledger.player(&card.player_id)?.clone();
        let team = guard.ledger.team(buyer_team)?.clone();
        info!(
            player = %player.display_name,
            team = %team.id,
            price = %card.listed_price,
            balance = %team.balance,
            "player purchased"
        );
        Ok(BuyOutcome {
            player,
            team,
            price: card.listed_price,
            removed_render: card.render_location,
        })
    }

    /// Releases a player to free agency: credits the refund, clears the
    /// owner, and creates a free-agent card at the player's value.
    pub async fn release(&self, player_id: &str, team_id: &str) -> Result<ReleaseOutcome> {
        let mut guard = self.state.lock().await;

        let player = guard.ledger.player(player_id)?.clone();
        if player.owning_team.as_deref() != Some(team_id) {
            return Err(Error::NotOwner {
                player: player.display_name,
                team: team_id.to_string(),
            });
        }

        let refund = round_money(player.value * self.rules.refund_rate);
        let mut next = guard.clone();
        next.ledger.apply_delta(team_id, refund)?;
        next.ledger.set_ownership(player_id, None, None)?;
        let card = next.registry.create_card(
            player_id.to_string(),
            player.value,
            CardStatus::FreeAgent,
            None,
            None,
        )?;
        Self::commit(&mut guard, &self.store, next)?;

        let player = guard.ledger.player(player_id)?.clone();
        let team = guard.ledger.team(team_id)?.clone();
        info!(
            player = %player.display_name,
            team = %team.id,
            refund = %refund,
            balance = %team.balance,
            "player released to free agency"
        );
        Ok(ReleaseOutcome { player, team, refund, card })
    }

    /// Applies a partial update to a listing. Ownership and balances are
    /// never touched here; a listing edit is purely cosmetic state.
    pub async fn edit_listing(&self, card_id: CardId, edit: ListingEdit) -> Result<Card> {
        if let Some(price) = edit.price {
            if price < Decimal::ZERO {
                return Err(Error::InvalidAmount { amount: price });
            }
        }

        let mut guard = self.state.lock().await;
        if guard.registry.card(&card_id).is_none() {
            return Err(Error::CardNotFound { reference: card_id.to_string() });
        }

        let mut next = guard.clone();
        {
            // Checked above; the clone has the same cards.
            let card = next
                .registry
                .card_mut(&card_id)
                .ok_or_else(|| Error::CardNotFound { reference: card_id.to_string() })?;
            card.listed_price = edit.price.map_or(card.listed_price, round_money);
            if let Some(url) = edit.image_url {
                card.image_url = Some(url);
            }
            card.listed_status = match edit.free_agent {
                Some(true) => CardStatus::FreeAgent,
                Some(false) => CardStatus::Owned,
                None => card.listed_status,
            };
        }
        Self::commit(&mut guard, &self.store, next)?;

        let card = guard
            .registry
            .card(&card_id)
            .cloned()
            .ok_or_else(|| Error::CardNotFound { reference: card_id.to_string() })?;
        info!(card = %card.id, price = %card.listed_price, "listing updated");
        Ok(card)
    }

    /// Posts a player to the market. Unknown players are created on the
    /// spot with `price` as their value; known players keep their ledger
    /// value and the card freezes `price` as the listed snapshot.
    pub async fn post_listing(
        &self,
        player_id: &str,
        display_name: &str,
        price: Decimal,
        image_url: Option<String>,
    ) -> Result<Card> {
        if price < Decimal::ZERO {
            return Err(Error::InvalidAmount { amount: price });
        }

        let mut guard = self.state.lock().await;
        let mut next = guard.clone();

        let owning_team = if next.ledger.contains_player(player_id) {
            let player = next.ledger.player(player_id)?;
            player.owning_team.clone()
        } else {
            next.ledger.upsert_player(
                player_id.to_string(),
                display_name.to_string(),
                None,
                Some(price),
            );
            None
        };
        let status = if owning_team.is_some() {
            CardStatus::Owned
        } else {
            CardStatus::FreeAgent
        };
        let card = next
            .registry
            .create_card(player_id.to_string(), price, status, image_url, None)?;
        Self::commit(&mut guard, &self.store, next)?;

        info!(player = %player_id, price = %card.listed_price, status = %card.listed_status, "card posted");
        Ok(card)
    }

    /// Removes a listing without touching the ledger.
    pub async fn delist(&self, card_id: CardId) -> Result<Card> {
        let mut guard = self.state.lock().await;
        if guard.registry.card(&card_id).is_none() {
            return Err(Error::CardNotFound { reference: card_id.to_string() });
        }

        let mut next = guard.clone();
        let card = next
            .registry
            .remove(&card_id)
            .ok_or_else(|| Error::CardNotFound { reference: card_id.to_string() })?;
        Self::commit(&mut guard, &self.store, next)?;

        info!(card = %card.id, player = %card.player_id, "card delisted");
        Ok(card)
    }

    /// Records where the presentation layer rendered a card, persisted like
    /// any other mutation so lookups by message survive a restart.
    pub async fn record_render_location(&self, card_id: CardId, loc: RenderLocation) -> Result<()> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        next.registry.set_render_location(&card_id, loc)?;
        Self::commit(&mut guard, &self.store, next)
    }

    /// Upserts the player set produced by the external role scan. Never
    /// deletes: players who lost their roles keep their ledger records.
    pub async fn sync_roster(&self, seeds: Vec<PlayerSeed>) -> Result<RosterSyncReport> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let mut report = RosterSyncReport::default();

        for seed in seeds {
            let known = next.ledger.contains_player(&seed.id);
            let value = if known {
                None
            } else {
                Some(self.rules.default_player_value)
            };
            next.ledger
                .upsert_player(seed.id, seed.display_name, seed.owning_team, value);
            if known {
                report.updated += 1;
            } else {
                report.created += 1;
            }
        }
        Self::commit(&mut guard, &self.store, next)?;

        info!(created = report.created, updated = report.updated, "roster synced");
        Ok(report)
    }

    /// Pins a player's value directly; test seeding only.
    #[cfg(test)]
    pub(crate) async fn set_player_value(&self, id: &str, value: Decimal) -> Result<()> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let owner = next.ledger.player(id)?.owning_team.clone();
        next.ledger.set_ownership(id, owner, Some(value))?;
        Self::commit(&mut guard, &self.store, next)
    }

    // --- Read surface (cloned snapshots; no external mutation path) ---

    /// Team by id.
    pub async fn team(&self, id: &str) -> Result<Team> {
        self.state.lock().await.ledger.team(id).cloned()
    }

    /// Player by id.
    pub async fn player(&self, id: &str) -> Result<Player> {
        self.state.lock().await.ledger.player(id).cloned()
    }

    /// All teams, ordered by id.
    pub async fn teams(&self) -> Vec<Team> {
        self.state.lock().await.ledger.teams().cloned().collect()
    }

    /// Card by id.
    pub async fn card(&self, id: CardId) -> Result<Card> {
        self.state
            .lock()
            .await
            .registry
            .card(&id)
            .cloned()
            .ok_or_else(|| Error::CardNotFound { reference: id.to_string() })
    }

    /// Active card for a player, if any.
    pub async fn card_by_player(&self, player_id: &str) -> Option<Card> {
        self.state.lock().await.registry.by_player(player_id).cloned()
    }

    /// Card rendered at the given message, if any.
    pub async fn card_by_render_location(&self, loc: RenderLocation) -> Option<Card> {
        self.state
            .lock()
            .await
            .registry
            .by_render_location(loc)
            .cloned()
    }

    /// Every active card.
    pub async fn active_cards(&self) -> Vec<Card> {
        self.state.lock().await.registry.active().cloned().collect()
    }
}
