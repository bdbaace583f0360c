//! General Discord commands - ping and help.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::bot::BotData;
    use crate::errors::{Error, Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Transfer Desk Help**\n\
        Here is a summary of all available commands.\n\n\
        **Market Commands**\n\
        • `/postcard <player> <price> [image]` - Posts a player card to the market.\n\
        • `/editcard <message_id> [price] [image] [freeagent]` - Edits a posted card.\n\
        • `/delistcard <message_id>` - Removes a card without a transaction.\n\
        • `/market` - Lists every active card.\n\n\
        **Roster Commands**\n\
        • `/release <player>` - Releases a player to free agency (with confirmation).\n\
        • `/balance` - Shows your team's balance.\n\
        • `/syncroster` - Rebuilds the player set from role membership.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        Buying happens through the **BUY** button on a posted card.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
