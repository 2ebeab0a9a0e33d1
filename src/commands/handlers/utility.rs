//! Utility command handlers
//!
//! Handles: help
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Memo command help with time format examples
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use super::reply_ephemeral;
use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::features::timeparse::TIME_EXAMPLES;

pub struct UtilityHandler;

#[async_trait]
impl SlashCommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["help"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        reply_ephemeral(serenity_ctx, command, &help_text(&ctx)).await
    }
}

pub fn help_text(ctx: &CommandContext) -> String {
    format!(
        r#"**Memo Bot Commands:**
`/memo content when [channel]` - Schedule a memo
`/list` - Pending memos in this channel and your totals elsewhere
`/delete id` - Delete one of your memos
`/setchannel` - Post memos you create in DMs to this channel
`/help` - Show this help message

**Time formats** (times are read in {}):
{TIME_EXAMPLES}"#,
        ctx.timezone.name()
    )
}
