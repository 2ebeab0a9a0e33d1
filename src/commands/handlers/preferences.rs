//! Delivery preference handler
//!
//! Handles: setchannel
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use super::{invocation_of, reply_ephemeral};
use crate::commands::context::{CommandContext, Invocation};
use crate::commands::handler::SlashCommandHandler;

pub struct PreferenceHandler;

#[async_trait]
impl SlashCommandHandler for PreferenceHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["setchannel"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let text = setchannel_text(&ctx, &invocation_of(command)).await;
        reply_ephemeral(serenity_ctx, command, &text).await
    }
}

/// Reply for /setchannel
pub async fn setchannel_text(ctx: &CommandContext, invocation: &Invocation) -> String {
    // A DM channel would only ever point back at the DM
    if invocation.in_dm {
        return "❌ Run /setchannel inside the server channel that should receive your memos."
            .to_string();
    }
    match ctx
        .memo_service
        .set_preferred_target(&invocation.user_id, &invocation.channel_id)
        .await
    {
        Ok(()) => format!(
            "✅ Memos you create from DMs will now be posted in <#{}>.",
            invocation.channel_id
        ),
        Err(e) => format!("❌ {}", e.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::tests::test_context;

    #[tokio::test]
    async fn test_setchannel_stores_preference() {
        let ctx = test_context().await;
        let invocation = Invocation {
            user_id: "42".into(),
            channel_id: "300".into(),
            in_dm: false,
        };

        let text = setchannel_text(&ctx, &invocation).await;

        assert_eq!(text, "✅ Memos you create from DMs will now be posted in <#300>.");
        assert_eq!(
            ctx.memo_service.preferred_target("42").await.unwrap().as_deref(),
            Some("300")
        );
    }

    #[tokio::test]
    async fn test_setchannel_refused_in_dm() {
        let ctx = test_context().await;
        let invocation = Invocation {
            user_id: "42".into(),
            channel_id: "999".into(),
            in_dm: true,
        };

        assert!(setchannel_text(&ctx, &invocation).await.starts_with("❌"));
        assert_eq!(ctx.memo_service.preferred_target("42").await.unwrap(), None);
    }
}
