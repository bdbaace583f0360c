//! Card message lifecycle and embed construction.
//!
//! The engine commits first; everything here happens after. Deleting,
//! editing, or posting a Discord message can fail independently of ledger
//! state (the message may have been removed by hand, the channel may be
//! gone), so the post-commit helpers log failures instead of surfacing them
//! as transaction errors.

use crate::bot::BotData;
use crate::core::ledger::Player;
use crate::core::registry::{Card, RenderLocation};
use crate::core::render::CardRender;
use crate::errors::Result;
use poise::serenity_prelude as serenity;
use tracing::warn;
use uuid::Uuid;

/// Builds the embed for a card.
#[must_use]
pub fn card_embed(render: &CardRender) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(render.title.clone())
        .field("💰 Value", render.price_display.clone(), true)
        .field("📍 Status", render.status_display.clone(), true)
        .colour(serenity::Colour::new(render.accent))
        .footer(serenity::CreateEmbedFooter::new(render.footer.clone()));
    if let Some(url) = &render.image_ref {
        embed = embed.image(url.clone());
    }
    embed
}

/// Builds the action row for a card. Custom ids carry only the generated
/// card id; no names, prices, or channel ids are smuggled through them.
#[must_use]
pub fn card_action_row(card: &Card, actionable: bool) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("buy:{}", card.id))
            .label("BUY")
            .style(serenity::ButtonStyle::Success)
            .disabled(!actionable),
        serenity::CreateButton::new(format!("delete:{}", card.id))
            .label("DELETE")
            .style(serenity::ButtonStyle::Danger),
    ])
}

/// Confirm/cancel row for an ephemeral prompt, keyed by the one-shot token.
#[must_use]
pub fn confirm_action_row(token: Uuid) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("confirm:{token}"))
            .label("Yes, confirm")
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(format!("cancel:{token}"))
            .label("No, cancel")
            .style(serenity::ButtonStyle::Secondary),
    ])
}

/// Posts a card to the market channel and records where it landed so later
/// edits and deletions can find it. The record is persisted; a card whose
/// message vanished simply stops matching render-location lookups.
pub async fn post_card(
    ctx: &serenity::Context,
    data: &BotData,
    card: &Card,
    player: &Player,
) -> Result<RenderLocation> {
    let render = CardRender::from_card(card, player);
    let channel = serenity::ChannelId::new(data.discord.market_channel_id);
    let message = channel
        .send_message(
            ctx,
            serenity::CreateMessage::new()
                .embed(card_embed(&render))
                .components(vec![card_action_row(card, render.actionable)]),
        )
        .await?;

    let loc = RenderLocation {
        channel_id: channel.get(),
        message_id: message.id.get(),
    };
    data.engine.record_render_location(card.id, loc).await?;
    Ok(loc)
}

/// Re-renders an existing card message. Tolerated failure: the transaction
/// already committed, a missing message only costs the cosmetic update.
pub async fn refresh_card_message(
    ctx: &serenity::Context,
    card: &Card,
    player: &Player,
) {
    let Some(loc) = card.render_location else {
        return;
    };
    let render = CardRender::from_card(card, player);
    let result = serenity::ChannelId::new(loc.channel_id)
        .edit_message(
            ctx,
            serenity::MessageId::new(loc.message_id),
            serenity::EditMessage::new()
                .embed(card_embed(&render))
                .components(vec![card_action_row(card, render.actionable)]),
        )
        .await;
    if let Err(e) = result {
        warn!(card = %card.id, location = %loc, "could not refresh card message: {e}");
    }
}

/// Deletes a card's rendered message. Tolerated failure: the card may have
/// been removed by hand already.
pub async fn remove_card_message(ctx: &serenity::Context, loc: Option<RenderLocation>) {
    let Some(loc) = loc else {
        return;
    };
    let result = serenity::ChannelId::new(loc.channel_id)
        .delete_message(ctx, serenity::MessageId::new(loc.message_id))
        .await;
    if let Err(e) = result {
        warn!(location = %loc, "could not delete card message: {e}");
    }
}

/// Posts one line to the transaction log channel, if one is configured.
/// Tolerated failure.
pub async fn send_log(ctx: &serenity::Context, data: &BotData, line: String) {
    let Some(channel_id) = data.discord.log_channel_id else {
        return;
    };
    if let Err(e) = serenity::ChannelId::new(channel_id).say(ctx, line).await {
        warn!("could not write transaction log line: {e}");
    }
}

/// Swaps a member's roles after a committed transaction: on a purchase the
/// team role goes on and the free-agent role comes off, on a release the
/// reverse. Tolerated failure: role hierarchy or missing permissions can
/// block the bot without affecting the ledger, and the next roster sync
/// reads whatever roles actually stuck.
pub async fn swap_member_roles(
    ctx: &serenity::Context,
    guild_id: Option<serenity::GuildId>,
    user_id: u64,
    add: Option<u64>,
    remove: Option<u64>,
) {
    let Some(guild_id) = guild_id else {
        return;
    };
    let user = serenity::UserId::new(user_id);
    if let Some(role) = remove {
        if let Err(e) = ctx
            .http
            .remove_member_role(guild_id, user, serenity::RoleId::new(role), None)
            .await
        {
            warn!(%user, role, "could not remove role: {e}");
        }
    }
    if let Some(role) = add {
        if let Err(e) = ctx
            .http
            .add_member_role(guild_id, user, serenity::RoleId::new(role), None)
            .await
        {
            warn!(%user, role, "could not add role: {e}");
        }
    }
}

/// DMs a user. Tolerated failure: users can disable DMs.
pub async fn dm_user(ctx: &serenity::Context, user_id: u64, text: String) {
    let user = serenity::UserId::new(user_id);
    let result = async {
        let channel = user.create_dm_channel(ctx).await?;
        channel.id.say(ctx, text).await?;
        Ok::<_, serenity::Error>(())
    }
    .await;
    if let Err(e) = result {
        warn!(%user, "DM failed: {e}");
    }
}
