//! Roster commands - `release`, `balance`, and `syncroster`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::bot::commands::{author_roles, require_gm};
    use crate::bot::handlers::roles;
    use crate::bot::{BotData, surface};
    use crate::core::confirm::ConfirmAction;
    use crate::core::engine::PlayerSeed;
    use crate::core::ledger::round_money;
    use crate::core::render::price_display;
    use crate::errors::{Error, Result};
    use poise::serenity_prelude as serenity;
    use tracing::warn;

    /// Releases a player to free agency, behind a confirmation prompt.
    ///
    /// The refund shown in the prompt is informational; the actual amount is
    /// computed when the confirmation commits, against the ledger state at
    /// that moment.
    #[poise::command(slash_command, guild_only)]
    pub async fn release(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Player to release"] player: serenity::User,
    ) -> Result<()> {
        let user_roles = author_roles(&ctx).await;
        require_gm(&ctx, &user_roles, "release players")?;

        let data = ctx.data();
        let teams = data.engine.teams().await;
        let team = roles::team_for_roles(&teams, &user_roles)?.ok_or_else(|| {
            Error::Unauthorized {
                reason: "You are not assigned to any team.".to_string(),
            }
        })?;

        let player_id = player.id.to_string();
        let record = data.engine.player(&player_id).await?;
        if record.owning_team.as_deref() != Some(team.id.as_str()) {
            return Err(Error::NotOwner {
                player: record.display_name,
                team: team.id.clone(),
            });
        }

        let refund = round_money(record.value * data.engine.rules().refund_rate);
        let token = data
            .controller
            .propose(ConfirmAction::Release { player_id }, &ctx.author().id.to_string())?;

        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "Are you sure you want to release **{}**?\nYou will receive **{}** back.",
                    record.display_name,
                    price_display(refund),
                ))
                .components(vec![surface::confirm_action_row(token)])
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Shows the balance of the caller's team.
    #[poise::command(slash_command, guild_only)]
    pub async fn balance(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_roles = author_roles(&ctx).await;
        let teams = ctx.data().engine.teams().await;
        let team = roles::team_for_roles(&teams, &user_roles)?.ok_or_else(|| {
            Error::Unauthorized {
                reason: "You are not assigned to any team.".to_string(),
            }
        })?;

        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "🏦 **{}** balance: **{}**",
                    team.name,
                    price_display(team.balance),
                ))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Rebuilds the player set from current role membership.
    ///
    /// Members holding a team role become owned players; members holding the
    /// free-agent role (when configured) become free agents. Existing
    /// players keep their values; nobody is deleted.
    #[poise::command(slash_command, guild_only)]
    pub async fn syncroster(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_roles = author_roles(&ctx).await;
        require_gm(&ctx, &user_roles, "sync the roster")?;

        let data = ctx.data();
        let guild_id = ctx.guild_id().ok_or_else(|| Error::Unauthorized {
            reason: "This command only works inside the server.".to_string(),
        })?;
        let members = guild_id
            .members(&ctx.serenity_context().http, None, None)
            .await?;

        let teams = data.engine.teams().await;
        let mut seeds = Vec::new();
        for member in &members {
            if member.user.bot {
                continue;
            }
            let member_roles: Vec<u64> =
                member.roles.iter().map(|r| r.get()).collect();
            let owning_team = match roles::team_for_roles(&teams, &member_roles) {
                Ok(team) => team.map(|t| t.id.clone()),
                Err(e) => {
                    warn!(user = %member.user.id, "skipping member during roster sync: {e}");
                    continue;
                }
            };
            let is_free_agent = data
                .discord
                .free_agent_role_id
                .is_some_and(|role| roles::has_role(&member_roles, role));
            if owning_team.is_none() && !is_free_agent {
                continue;
            }
            seeds.push(PlayerSeed {
                id: member.user.id.to_string(),
                display_name: member.user.display_name().to_string(),
                owning_team,
            });
        }

        let report = data.engine.sync_roster(seeds).await?;
        ctx.say(format!(
            "✅ Roster synced: {} added, {} refreshed.",
            report.created, report.updated,
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
