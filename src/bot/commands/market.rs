//! Market card commands - `postcard`, `editcard`, `delistcard`, `market`.
//!
//! Cards are looked up through the registry by message id (their render
//! location), never by re-parsing embed text: display strings drift and
//! player names collide, so the registry record is the only source of truth
//! for what a posted card means.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::bot::commands::{author_roles, require_gm, to_money};
    use crate::bot::{BotData, surface};
    use crate::core::engine::ListingEdit;
    use crate::core::registry::RenderLocation;
    use crate::core::render::price_display;
    use crate::errors::{Error, Result};
    use poise::serenity_prelude as serenity;
    use tracing::warn;

    /// Posts a player card to the transfer market.
    ///
    /// Unknown players are added to the ledger with the given price as their
    /// value; players already tracked keep their ledger value and the card
    /// freezes the given price as its listed snapshot.
    #[poise::command(slash_command, guild_only)]
    pub async fn postcard(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Player to list"] player: serenity::User,
        #[description = "Listed price"] price: f64,
        #[description = "Card image"] image: Option<serenity::Attachment>,
    ) -> Result<()> {
        let user_roles = author_roles(&ctx).await;
        require_gm(&ctx, &user_roles, "post cards")?;

        let Some(price) = to_money(price) else {
            ctx.say("❌ Invalid price: must be a non-negative number")
                .await?;
            return Ok(());
        };

        let engine = &ctx.data().engine;
        let card = engine
            .post_listing(
                &player.id.to_string(),
                player.display_name(),
                price,
                image.map(|a| a.url),
            )
            .await?;
        let listed = engine.player(&card.player_id).await?;

        // Committed; a failed message send only costs the rendered card,
        // which /market still lists.
        if let Err(e) = surface::post_card(ctx.serenity_context(), ctx.data(), &card, &listed).await
        {
            warn!(card = %card.id, "could not post card message: {e:?}");
        }

        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "✅ Card for **{}** posted at **{}**.",
                    listed.display_name,
                    price_display(card.listed_price),
                ))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Edits a posted card by its message ID.
    ///
    /// Omitted options are retained; provided ones always apply, including a
    /// price of 0 and `freeagent: false`.
    #[poise::command(slash_command, guild_only)]
    pub async fn editcard(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Message ID of the card to update"] message_id: String,
        #[description = "New price (optional)"] price: Option<f64>,
        #[description = "New image (optional)"] image: Option<serenity::Attachment>,
        #[description = "Update free agent status (optional)"] freeagent: Option<bool>,
    ) -> Result<()> {
        let user_roles = author_roles(&ctx).await;
        require_gm(&ctx, &user_roles, "edit cards")?;

        let Ok(message_id) = message_id.trim().parse::<u64>() else {
            ctx.say("❌ Invalid message ID.").await?;
            return Ok(());
        };
        let new_price = match price {
            None => None,
            Some(raw) => match to_money(raw) {
                Some(p) => Some(p),
                None => {
                    ctx.say("❌ Invalid price: must be a non-negative number")
                        .await?;
                    return Ok(());
                }
            },
        };

        let engine = &ctx.data().engine;
        let loc = RenderLocation {
            channel_id: ctx.data().discord.market_channel_id,
            message_id,
        };
        let card = engine
            .card_by_render_location(loc)
            .await
            .ok_or_else(|| Error::CardNotFound { reference: message_id.to_string() })?;

        let edited = engine
            .edit_listing(
                card.id,
                ListingEdit {
                    price: new_price,
                    image_url: image.map(|a| a.url),
                    free_agent: freeagent,
                },
            )
            .await?;
        let listed = engine.player(&edited.player_id).await?;

        // Committed; the message refresh is a tolerated side effect.
        surface::refresh_card_message(ctx.serenity_context(), &edited, &listed).await;

        ctx.send(
            poise::CreateReply::default()
                .content(format!("✅ Card for **{}** updated.", listed.display_name))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Removes a posted card by its message ID without touching balances or
    /// ownership.
    #[poise::command(slash_command, guild_only)]
    pub async fn delistcard(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Message ID of the card to remove"] message_id: String,
    ) -> Result<()> {
        let user_roles = author_roles(&ctx).await;
        require_gm(&ctx, &user_roles, "delist cards")?;

        let Ok(message_id) = message_id.trim().parse::<u64>() else {
            ctx.say("❌ Invalid message ID.").await?;
            return Ok(());
        };

        let engine = &ctx.data().engine;
        let loc = RenderLocation {
            channel_id: ctx.data().discord.market_channel_id,
            message_id,
        };
        let card = engine
            .card_by_render_location(loc)
            .await
            .ok_or_else(|| Error::CardNotFound { reference: message_id.to_string() })?;

        let removed = engine.delist(card.id).await?;
        surface::remove_card_message(ctx.serenity_context(), removed.render_location).await;

        ctx.send(
            poise::CreateReply::default()
                .content("🗑️ Card removed.")
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Lists every active card on the market.
    #[poise::command(slash_command)]
    pub async fn market(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let engine = &ctx.data().engine;
        let cards = engine.active_cards().await;
        if cards.is_empty() {
            ctx.say("The transfer market is empty.").await?;
            return Ok(());
        }

        let mut lines = Vec::with_capacity(cards.len());
        for card in &cards {
            let name = match engine.player(&card.player_id).await {
                Ok(player) => player.display_name,
                Err(_) => card.player_id.clone(),
            };
            lines.push(format!(
                "• **{name}** — {} ({})",
                price_display(card.listed_price),
                card.listed_status,
            ));
        }
        ctx.say(format!("**Transfer Market**\n{}", lines.join("\n")))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
