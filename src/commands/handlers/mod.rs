//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 3.0.0: MemoHandler, PreferenceHandler and UtilityHandler for the memo bot
//! - 1.0.0: Initial extraction from monolithic command_handler.rs

pub mod memo;
pub mod preferences;
pub mod utility;

use anyhow::Result;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;

use super::context::Invocation;
use super::handler::SlashCommandHandler;
use crate::core::chunk_for_message;

/// Every handler, ready to be registered with CommandRegistry
pub fn create_all_handlers() -> Vec<Arc<dyn SlashCommandHandler>> {
    vec![
        Arc::new(memo::MemoHandler),
        Arc::new(preferences::PreferenceHandler),
        Arc::new(utility::UtilityHandler),
    ]
}

/// Caller identity and location for an interaction
pub(crate) fn invocation_of(command: &ApplicationCommandInteraction) -> Invocation {
    Invocation {
        user_id: command.user.id.to_string(),
        channel_id: command.channel_id.to_string(),
        in_dm: command.guild_id.is_none(),
    }
}

/// Answer an interaction privately, splitting long text into follow-ups
pub(crate) async fn reply_ephemeral(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    text: &str,
) -> Result<()> {
    let mut chunks = chunk_for_message(text).into_iter();
    let first = chunks.next().unwrap_or_default();

    command
        .create_interaction_response(&serenity_ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(first).ephemeral(true))
        })
        .await?;

    for chunk in chunks {
        command
            .create_followup_message(&serenity_ctx.http, |message| {
                message.content(chunk).ephemeral(true)
            })
            .await?;
    }
    Ok(())
}
