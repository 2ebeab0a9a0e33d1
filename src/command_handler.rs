//! Slash command dispatcher
//!
//! Applies the per-user rate limit, then routes each interaction to the
//! handler registered for its name.
//!
//! - **Version**: 4.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 4.0.0: Registry-only dispatch for memo commands
//! - 3.38.0: Modular handlers via CommandRegistry

use anyhow::Result;
use log::{debug, info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handlers::{create_all_handlers, reply_ephemeral};
use crate::commands::registry::CommandRegistry;
use crate::features::rate_limiting::RateLimiter;

#[derive(Clone)]
pub struct CommandHandler {
    registry: CommandRegistry,
    context: Arc<CommandContext>,
    rate_limiter: Arc<RateLimiter>,
}

impl CommandHandler {
    pub fn new(context: CommandContext, rate_limiter: RateLimiter) -> Self {
        Self {
            registry: CommandRegistry::with_handlers(create_all_handlers()),
            context: Arc::new(context),
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Rate limit message, or None when the user may proceed
    pub fn throttle_message(&self, user_id: &str) -> Option<String> {
        if self.rate_limiter.check(user_id) {
            return None;
        }
        let wait = self
            .rate_limiter
            .retry_after(user_id)
            .map(|d| d.as_secs().max(1))
            .unwrap_or(1);
        Some(format!(
            "You're sending commands too quickly! Please wait {wait}s and try again."
        ))
    }

    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        let user_id = command.user.id.to_string();
        let guild_id = command
            .guild_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "DM".to_string());

        info!(
            "[{request_id}] 📥 Slash command received | Command: {} | User: {user_id} | Channel: {} | Guild: {guild_id}",
            command.data.name, command.channel_id
        );

        if let Some(message) = self.throttle_message(&user_id) {
            warn!("[{request_id}] 🚫 Rate limit exceeded for user: {user_id}");
            reply_ephemeral(ctx, command, &message).await?;
            return Ok(());
        }
        debug!("[{request_id}] ✅ Rate limit check passed");

        let Some(handler) = self.registry.get(&command.data.name) else {
            warn!("[{request_id}] ❓ Unknown command: {}", command.data.name);
            reply_ephemeral(ctx, command, "Unknown command.").await?;
            return Ok(());
        };

        handler
            .handle(Arc::clone(&self.context), ctx, command)
            .await?;
        info!("[{request_id}] ✅ /{} completed", command.data.name);
        Ok(())
    }
}
