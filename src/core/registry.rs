//! Card registry - active market listings, keyed by generated ids.
//!
//! A card records what a posted listing represents: the player, the listed
//! price, and the listed status frozen at posting time. The rendered Discord
//! message is only a projection of this record; price and status are never
//! recovered by parsing embed text. Lookups go by card id, player id, or the
//! opaque render location of the message.

use crate::core::ledger::PlayerId;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Unique card identifier, independent of the Discord message id.
pub type CardId = Uuid;

/// Listed status frozen when the card was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Free agent, eligible for direct purchase.
    FreeAgent,
    /// Owned by a team, listed as tradeable.
    Owned,
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardStatus::FreeAgent => write!(f, "Free Agent"),
            CardStatus::Owned => write!(f, "Owned by Team"),
        }
    }
}

/// Where the presentation layer rendered a card. Opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderLocation {
    /// Discord channel the card message lives in.
    pub channel_id: u64,
    /// Discord message id of the card.
    pub message_id: u64,
}

impl fmt::Display for RenderLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_id, self.message_id)
    }
}

/// An active market listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Generated identifier, stable across message edits and re-posts.
    pub id: CardId,
    /// Player this card lists.
    pub player_id: PlayerId,
    /// Price frozen at listing time.
    pub listed_price: Decimal,
    /// Status frozen at listing time.
    pub listed_status: CardStatus,
    /// Card art, if any.
    pub image_url: Option<String>,
    /// Rendered message, once the presentation layer has posted it.
    pub render_location: Option<RenderLocation>,
}

/// All active cards. At most one card exists per player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRegistry {
    cards: BTreeMap<CardId, Card>,
}

impl CardRegistry {
    /// Creates a card for a player, enforcing the one-active-card rule.
    pub fn create_card(
        &mut self,
        player_id: PlayerId,
        listed_price: Decimal,
        listed_status: CardStatus,
        image_url: Option<String>,
        render_location: Option<RenderLocation>,
    ) -> Result<Card> {
        if let Some(existing) = self.by_player(&player_id) {
            return Err(Error::Conflict {
                message: format!(
                    "player '{player_id}' already has an active card ({})",
                    existing.id
                ),
            });
        }
        let card = Card {
            id: Uuid::new_v4(),
            player_id,
            listed_price: crate::core::ledger::round_money(listed_price),
            listed_status,
            image_url,
            render_location,
        };
        self.cards.insert(card.id, card.clone());
        Ok(card)
    }

    /// Looks up a card by id.
    #[must_use]
    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Finds the active card for a player, if one exists.
    #[must_use]
    pub fn by_player(&self, player_id: &str) -> Option<&Card> {
        self.cards.values().find(|c| c.player_id == player_id)
    }

    /// Finds a card by the message it was rendered into.
    #[must_use]
    pub fn by_render_location(&self, loc: RenderLocation) -> Option<&Card> {
        self.cards
            .values()
            .find(|c| c.render_location == Some(loc))
    }

    /// Removes a card, returning it if it was present.
    pub fn remove(&mut self, id: &CardId) -> Option<Card> {
        self.cards.remove(id)
    }

    /// Mutable access for listing edits. Internal to the engine.
    pub(crate) fn card_mut(&mut self, id: &CardId) -> Option<&mut Card> {
        self.cards.get_mut(id)
    }

    /// Records where the presentation layer rendered a card.
    pub fn set_render_location(&mut self, id: &CardId, loc: RenderLocation) -> Result<()> {
        let card = self.cards.get_mut(id).ok_or_else(|| Error::CardNotFound {
            reference: id.to_string(),
        })?;
        card.render_location = Some(loc);
        Ok(())
    }

    /// All active cards, ordered by id.
    pub fn active(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Number of active cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether no cards are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_one_active_card_per_player() {
        let mut registry = CardRegistry::default();
        registry
            .create_card("p1".to_string(), dec!(50.00), CardStatus::FreeAgent, None, None)
            .unwrap();

        let duplicate =
            registry.create_card("p1".to_string(), dec!(60.00), CardStatus::Owned, None, None);
        assert!(matches!(duplicate, Err(Error::Conflict { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_by_player_and_location() {
        let mut registry = CardRegistry::default();
        let loc = RenderLocation { channel_id: 10, message_id: 20 };
        let card = registry
            .create_card(
                "p1".to_string(),
                dec!(50.00),
                CardStatus::FreeAgent,
                Some("https://cdn.example/card.png".to_string()),
                Some(loc),
            )
            .unwrap();

        assert_eq!(registry.by_player("p1").unwrap().id, card.id);
        assert_eq!(registry.by_render_location(loc).unwrap().id, card.id);
        assert!(registry.by_player("p2").is_none());
        assert!(
            registry
                .by_render_location(RenderLocation { channel_id: 10, message_id: 99 })
                .is_none()
        );
    }

    #[test]
    fn test_remove_frees_the_player_slot() {
        let mut registry = CardRegistry::default();
        let card = registry
            .create_card("p1".to_string(), dec!(50.00), CardStatus::FreeAgent, None, None)
            .unwrap();

        let removed = registry.remove(&card.id).unwrap();
        assert_eq!(removed.id, card.id);
        assert!(registry.remove(&card.id).is_none());

        // A new card for the same player is allowed again.
        registry
            .create_card("p1".to_string(), dec!(55.00), CardStatus::FreeAgent, None, None)
            .unwrap();
    }

    #[test]
    fn test_set_render_location() {
        let mut registry = CardRegistry::default();
        let card = registry
            .create_card("p1".to_string(), dec!(50.00), CardStatus::FreeAgent, None, None)
            .unwrap();
        let loc = RenderLocation { channel_id: 1, message_id: 2 };

        registry.set_render_location(&card.id, loc).unwrap();
        assert_eq!(registry.card(&card.id).unwrap().render_location, Some(loc));

        let missing = registry.set_render_location(&Uuid::new_v4(), loc);
        assert!(matches!(missing, Err(Error::CardNotFound { .. })));
    }
}
