//! Button interaction handling.
//!
//! Card messages carry `buy:<card-id>` and `delete:<card-id>` buttons;
//! pressing one proposes a confirmation and replies with an ephemeral
//! prompt whose buttons carry `confirm:<token>` / `cancel:<token>`. The
//! custom id is the only thing the client sends back, and it maps
//! server-side to a pending confirmation; edited or replayed custom ids can
//! at worst name a token that does not exist.

use crate::bot::handlers::roles;
use crate::bot::{BotData, surface};
use crate::core::confirm::{ConfirmAction, Resolution, TxnOutcome};
use crate::core::render::price_display;
use crate::errors::{Error, Result};
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Entry point for all component interactions.
///
/// Errors from individual flows are rendered as ephemeral replies here so a
/// failing press never bubbles out of the event dispatcher.
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let custom_id = interaction.data.custom_id.clone();
    let Some((action, raw_id)) = custom_id.split_once(':') else {
        return Ok(());
    };
    let Ok(id) = Uuid::parse_str(raw_id) else {
        warn!(custom_id, "component with malformed id ignored");
        return Ok(());
    };

    let result = match action {
        "buy" => propose_buy(ctx, interaction, data, id).await,
        "delete" => propose_delete(ctx, interaction, data, id).await,
        "confirm" => resolve(ctx, interaction, data, id, true).await,
        "cancel" => resolve(ctx, interaction, data, id, false).await,
        _ => Ok(()),
    };

    if let Err(e) = result {
        let reply = e.user_message().unwrap_or_else(|| {
            error!("error handling '{action}' button: {e:?}");
            "❌ Something went wrong. Please try again.".to_string()
        });
        if let Err(send_err) = ephemeral_reply(ctx, interaction, reply, Vec::new()).await {
            error!("failed to send button error reply: {send_err:?}");
        }
    }
    Ok(())
}

/// Roles currently held by the pressing user. Button presses only arrive
/// from guild channels, so a missing member is treated as unauthorized.
fn member_roles(interaction: &serenity::ComponentInteraction) -> Result<Vec<u64>> {
    let member = interaction.member.as_ref().ok_or_else(|| Error::Unauthorized {
        reason: "This action only works inside the server.".to_string(),
    })?;
    Ok(member.roles.iter().map(|r| r.get()).collect())
}

fn require_gm(data: &BotData, user_roles: &[u64], action: &str) -> Result<()> {
    if roles::has_role(user_roles, data.discord.gm_role_id) {
        Ok(())
    } else {
        Err(Error::Unauthorized {
            reason: format!("Only general managers can {action}."),
        })
    }
}

async fn propose_buy(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
    card_id: Uuid,
) -> Result<()> {
    let user_roles = member_roles(interaction)?;
    require_gm(data, &user_roles, "buy players")?;

    let teams = data.engine.teams().await;
    let team = roles::team_for_roles(&teams, &user_roles)?.ok_or_else(|| Error::Unauthorized {
        reason: "You are not assigned to any team.".to_string(),
    })?;

    let card = data.engine.card(card_id).await?;
    let player = data.engine.player(&card.player_id).await?;

    let token = data
        .controller
        .propose(ConfirmAction::Buy { card_id }, &interaction.user.id.to_string())?;
    info!(%token, card = %card_id, team = %team.id, "buy proposed");

    ephemeral_reply(
        ctx,
        interaction,
        format!(
            "Are you sure you want to sign **{}** for **{}**?\nYour balance: **{}**.",
            player.display_name,
            price_display(card.listed_price),
            price_display(team.balance),
        ),
        vec![surface::confirm_action_row(token)],
    )
    .await
}

async fn propose_delete(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
    card_id: Uuid,
) -> Result<()> {
    let user_roles = member_roles(interaction)?;
    require_gm(data, &user_roles, "remove cards")?;

    let card = data.engine.card(card_id).await?;
    let player = data.engine.player(&card.player_id).await?;

    let token = data
        .controller
        .propose(ConfirmAction::Delete { card_id }, &interaction.user.id.to_string())?;

    ephemeral_reply(
        ctx,
        interaction,
        format!(
            "Remove the market card for **{}**? The player keeps their current team and value.",
            player.display_name
        ),
        vec![surface::confirm_action_row(token)],
    )
    .await
}

async fn resolve(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
    token: Uuid,
    confirmed: bool,
) -> Result<()> {
    let user_roles = member_roles(interaction)?;
    // Authorization is re-validated here, not trusted from propose time:
    // roles can change while the prompt sits on screen.
    require_gm(data, &user_roles, "confirm market actions")?;
    let teams = data.engine.teams().await;
    let team = roles::team_for_roles(&teams, &user_roles)?;

    let resolution = data
        .controller
        .resolve(
            token,
            confirmed,
            &interaction.user.id.to_string(),
            team.map(|t| t.id.as_str()),
        )
        .await?;

    // Everything past this point is a tolerated side effect: the engine
    // already committed (or the token was cancelled), so a failed prompt
    // edit, message removal, role swap, or log line must never surface as
    // a transaction error.
    match resolution {
        Resolution::Cancelled(_) => {
            update_prompt(ctx, interaction, "❌ Cancelled.".to_string()).await;
        }
        Resolution::Completed(TxnOutcome::Bought(outcome)) => {
            update_prompt(
                ctx,
                interaction,
                format!(
                    "✅ You signed **{}** for **{}**. New balance: **{}**.",
                    outcome.player.display_name,
                    price_display(outcome.price),
                    price_display(outcome.team.balance),
                ),
            )
            .await;
            surface::remove_card_message(ctx, outcome.removed_render).await;
            if let Ok(user_id) = outcome.player.id.parse::<u64>() {
                surface::swap_member_roles(
                    ctx,
                    interaction.guild_id,
                    user_id,
                    Some(outcome.team.role_id),
                    data.discord.free_agent_role_id,
                )
                .await;
            }
            surface::send_log(
                ctx,
                data,
                format!(
                    "📝 {} signed by {} for **{}**. Remaining balance: **{}**.",
                    outcome.player.display_name,
                    outcome.team.name,
                    price_display(outcome.price),
                    price_display(outcome.team.balance),
                ),
            )
            .await;
        }
        Resolution::Completed(TxnOutcome::Released(outcome)) => {
            update_prompt(
                ctx,
                interaction,
                format!(
                    "✅ **{}** released to free agency. Refund: **{}**. New balance: **{}**.",
                    outcome.player.display_name,
                    price_display(outcome.refund),
                    price_display(outcome.team.balance),
                ),
            )
            .await;
            if let Err(e) = surface::post_card(ctx, data, &outcome.card, &outcome.player).await {
                warn!(card = %outcome.card.id, "could not post free-agent card: {e:?}");
            }
            if let Ok(user_id) = outcome.player.id.parse::<u64>() {
                surface::swap_member_roles(
                    ctx,
                    interaction.guild_id,
                    user_id,
                    data.discord.free_agent_role_id,
                    Some(outcome.team.role_id),
                )
                .await;
                surface::dm_user(
                    ctx,
                    user_id,
                    format!(
                        "You have been released by **{}** and placed on the transfer market for **{}**.",
                        outcome.team.name,
                        price_display(outcome.card.listed_price),
                    ),
                )
                .await;
            }
            surface::send_log(
                ctx,
                data,
                format!(
                    "📝 {} released by {}. Refund: **{}**. New balance: **{}**.",
                    outcome.player.display_name,
                    outcome.team.name,
                    price_display(outcome.refund),
                    price_display(outcome.team.balance),
                ),
            )
            .await;
        }
        Resolution::Completed(TxnOutcome::Delisted(card)) => {
            update_prompt(ctx, interaction, "🗑️ Card removed.".to_string()).await;
            surface::remove_card_message(ctx, card.render_location).await;
        }
    }
    Ok(())
}

async fn ephemeral_reply(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: String,
    components: Vec<serenity::CreateActionRow>,
) -> Result<()> {
    interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .components(components)
                    .ephemeral(true),
            ),
        )
        .await
        .map_err(Into::into)
}

/// Rewrites the confirm prompt in place, dropping its buttons. Tolerated
/// failure: the outcome is already final, a vanished prompt only costs the
/// cosmetic update.
async fn update_prompt(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: String,
) {
    let result = interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .components(Vec::new()),
            ),
        )
        .await;
    if let Err(e) = result {
        warn!("could not update confirm prompt: {e}");
    }
}
