//! Card render payloads - what a listing looks like, platform-agnostic.
//!
//! The presentation layer turns a [`CardRender`] into a Discord embed; the
//! core decides the text, colors, and whether the BUY button is live. State
//! always flows registry → render, never back.

use crate::core::ledger::Player;
use crate::core::registry::{Card, CardStatus};
use rust_decimal::Decimal;

/// Accent color for free-agent cards.
pub const COLOR_FREE_AGENT: u32 = 0x00b0_f4;
/// Accent color for owned/tradeable cards.
pub const COLOR_OWNED: u32 = 0xff_9e00;

/// Formats a monetary amount for display.
#[must_use]
pub fn price_display(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Everything the adapter needs to draw one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRender {
    /// Embed title.
    pub title: String,
    /// Formatted listed price.
    pub price_display: String,
    /// Formatted listed status.
    pub status_display: String,
    /// Card art, if any.
    pub image_ref: Option<String>,
    /// Whether the BUY action applies.
    pub actionable: bool,
    /// Embed accent color.
    pub accent: u32,
    /// Embed footer line.
    pub footer: String,
}

impl CardRender {
    /// Builds the render payload for a card and the player it lists.
    #[must_use]
    pub fn from_card(card: &Card, player: &Player) -> Self {
        let free_agent = card.listed_status == CardStatus::FreeAgent;
        Self {
            title: format!("📇 Player: {}", player.display_name),
            price_display: price_display(card.listed_price),
            status_display: card.listed_status.to_string(),
            image_ref: card.image_url.clone(),
            actionable: free_agent,
            accent: if free_agent { COLOR_FREE_AGENT } else { COLOR_OWNED },
            footer: if free_agent {
                "Available for direct purchase.".to_string()
            } else {
                "Available for trade or direct offer.".to_string()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::CardRegistry;
    use rust_decimal_macros::dec;

    fn player(name: &str) -> Player {
        Player {
            id: "p1".to_string(),
            display_name: name.to_string(),
            owning_team: None,
            value: dec!(50.00),
        }
    }

    #[test]
    fn test_free_agent_render() {
        let mut registry = CardRegistry::default();
        let card = registry
            .create_card(
                "p1".to_string(),
                dec!(50),
                CardStatus::FreeAgent,
                Some("https://cdn.example/p1.png".to_string()),
                None,
            )
            .unwrap();

        let render = CardRender::from_card(&card, &player("Player One"));
        assert_eq!(render.title, "📇 Player: Player One");
        assert_eq!(render.price_display, "$50.00");
        assert_eq!(render.status_display, "Free Agent");
        assert!(render.actionable);
        assert_eq!(render.accent, COLOR_FREE_AGENT);
        assert_eq!(render.image_ref.as_deref(), Some("https://cdn.example/p1.png"));
    }

    #[test]
    fn test_owned_render_is_not_actionable() {
        let mut registry = CardRegistry::default();
        let card = registry
            .create_card("p1".to_string(), dec!(218.64), CardStatus::Owned, None, None)
            .unwrap();

        let render = CardRender::from_card(&card, &player("Star Player"));
        assert_eq!(render.price_display, "$218.64");
        assert_eq!(render.status_display, "Owned by Team");
        assert!(!render.actionable);
        assert_eq!(render.accent, COLOR_OWNED);
        assert_eq!(render.footer, "Available for trade or direct offer.");
    }
}
