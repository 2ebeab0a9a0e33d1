//! Memo command handlers
//!
//! Handles: memo, list, delete
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::id::ChannelId;
use serenity::model::Permissions;
use serenity::prelude::Context;
use serenity::model::channel::Channel;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::{invocation_of, reply_ephemeral};
use crate::commands::context::{CommandContext, Invocation};
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::{get_channel_option, get_integer_option, get_string_option};
use crate::core::{format_local_time, preview};
use crate::features::memos::{Memo, MemoError};
use crate::features::timeparse::format_duration;

const CONFIRM_PREVIEW_CHARS: usize = 50;
const OWN_PREVIEW_CHARS: usize = 200;
const OTHERS_PREVIEW_CHARS: usize = 100;

pub struct MemoHandler;

#[async_trait]
impl SlashCommandHandler for MemoHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["memo", "list", "delete"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let invocation = invocation_of(command);
        let options = &command.data.options;

        let text = match command.data.name.as_str() {
            "memo" => {
                let content = get_string_option(options, "content").unwrap_or_default();
                let when = get_string_option(options, "when").unwrap_or_default();
                match get_channel_option(options, "channel") {
                    Some(channel_id) => {
                        // Discord resolves the invoker's permissions in the chosen channel
                        let permissions = command
                            .data
                            .resolved
                            .channels
                            .get(&ChannelId(channel_id))
                            .and_then(|channel| channel.permissions);
                        match explicit_target_refusal(channel_id, permissions) {
                            Some(refusal) => refusal,
                            None => {
                                let target = channel_id.to_string();
                                memo_text(&ctx, &invocation, &content, &when, Some(target.as_str())).await
                            }
                        }
                    }
                    None => memo_text(&ctx, &invocation, &content, &when, None).await,
                }
            }
            "list" => match Listing::load(&ctx, &invocation).await {
                Ok(listing) => {
                    let others = listing.other_targets(&invocation.channel_id);
                    let dm_targets = direct_message_targets(serenity_ctx, &others).await;
                    render_list(
                        &invocation.user_id,
                        &invocation.channel_id,
                        &listing,
                        &dm_targets,
                        ctx.timezone,
                    )
                }
                Err(e) => format!("❌ {}", e.user_message()),
            },
            "delete" => match get_integer_option(options, "id") {
                Some(id) => delete_text(&ctx, &invocation, id).await,
                None => "❌ Please give the memo number to delete.".to_string(),
            },
            _ => return Ok(()),
        };

        reply_ephemeral(serenity_ctx, command, &text).await
    }
}

/// Reply for /memo
pub async fn memo_text(
    ctx: &CommandContext,
    invocation: &Invocation,
    content: &str,
    when: &str,
    explicit_target: Option<&str>,
) -> String {
    let now = Utc::now();
    match ctx
        .schedule_memo(invocation, content, when, explicit_target, now)
        .await
    {
        Ok(memo) => render_created(&memo, &invocation.channel_id, ctx.timezone, now),
        Err(e) => {
            debug!("Memo from {} rejected: {e}", invocation.user_id);
            format!("❌ {}", e.user_message())
        }
    }
}

/// Refusal text when the invoker may not post in an explicitly chosen channel
///
/// Missing permission data counts as a refusal.
pub fn explicit_target_refusal(channel_id: u64, permissions: Option<Permissions>) -> Option<String> {
    let required = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
    if permissions.is_some_and(|granted| granted.contains(required)) {
        return None;
    }
    Some(format!(
        "❌ You can't send messages in <#{channel_id}>, so memos can't be posted there."
    ))
}

/// Memos behind a /list reply
#[derive(Debug, Default)]
pub struct Listing {
    /// Invoker's pending memos in the current channel
    pub own: Vec<Memo>,
    /// Every user's pending memos in the current channel
    pub in_channel: Vec<Memo>,
    /// Invoker's pending count per target
    pub counts: BTreeMap<String, i64>,
}

impl Listing {
    pub async fn load(ctx: &CommandContext, invocation: &Invocation) -> Result<Self, MemoError> {
        let service = &ctx.memo_service;
        Ok(Listing {
            own: service
                .list_pending(&invocation.user_id, &invocation.channel_id)
                .await?,
            in_channel: service
                .list_all_pending_in_target(&invocation.channel_id)
                .await?,
            counts: service.counts_by_target(&invocation.user_id).await?,
        })
    }

    /// Targets holding the invoker's memos, excluding `channel_id`
    pub fn other_targets(&self, channel_id: &str) -> Vec<String> {
        self.counts
            .keys()
            .filter(|target| target.as_str() != channel_id)
            .cloned()
            .collect()
    }
}

/// Subset of `targets` that are DM channels, which cannot be rendered as `<#id>`
async fn direct_message_targets(serenity_ctx: &Context, targets: &[String]) -> HashSet<String> {
    let mut dms = HashSet::new();
    for target in targets {
        let Ok(id) = target.parse::<u64>() else {
            continue;
        };
        match serenity_ctx.http.get_channel(id).await {
            Ok(Channel::Private(_)) => {
                dms.insert(target.clone());
            }
            Ok(_) => {}
            Err(e) => debug!("Could not look up channel {target}: {e}"),
        }
    }
    dms
}

/// Reply for /delete
pub async fn delete_text(ctx: &CommandContext, invocation: &Invocation, id: i64) -> String {
    match ctx.memo_service.delete_memo(id, &invocation.user_id).await {
        Ok(()) => {
            info!("User {} deleted memo #{id}", invocation.user_id);
            format!("✅ Memo #{id} deleted.")
        }
        Err(e) => format!("❌ {}", e.user_message()),
    }
}

/// Confirmation shown after a memo is scheduled
pub fn render_created(memo: &Memo, current_channel: &str, tz: Tz, now: DateTime<Utc>) -> String {
    let mut text = format!(
        "✅ <@{}> created memo #{}: {}\n⏰ {} (in {})",
        memo.owner_id,
        memo.id,
        preview(&memo.content, CONFIRM_PREVIEW_CHARS),
        format_local_time(memo.remind_at, tz),
        format_duration((memo.remind_at - now).num_seconds().max(0))
    );
    if memo.delivery_target != current_channel {
        text.push_str(&format!("\n📍 Will be posted in <#{}>", memo.delivery_target));
    }
    text
}

/// Pending memos for the current channel plus the user's totals elsewhere
///
/// Targets in `dm_targets` are summed into one "Direct messages" line.
pub fn render_list(
    user_id: &str,
    channel_id: &str,
    listing: &Listing,
    dm_targets: &HashSet<String>,
    tz: Tz,
) -> String {
    let Listing {
        own,
        in_channel,
        counts,
    } = listing;
    let mut text = format!(
        "📋 **This channel** · {} pending memo(s) from all users\n",
        in_channel.len()
    );

    text.push_str("\n**Your memos here**\n");
    if own.is_empty() {
        text.push_str("You have no memos in this channel.\n");
    }
    for memo in own {
        text.push_str(&format!(
            "🔸 **Memo #{}** · ⏰ {}\n📌 {}\n",
            memo.id,
            format_local_time(memo.remind_at, tz),
            preview(&memo.content, OWN_PREVIEW_CHARS)
        ));
    }

    let others: Vec<&Memo> = in_channel.iter().filter(|m| m.owner_id != user_id).collect();
    if !others.is_empty() {
        text.push_str("\n**Other users' memos here**\n");
        for memo in others {
            text.push_str(&format!(
                "🔹 **Memo #{}** by <@{}> · ⏰ {}\n📌 {}\n",
                memo.id,
                memo.owner_id,
                format_local_time(memo.remind_at, tz),
                preview(&memo.content, OTHERS_PREVIEW_CHARS)
            ));
        }
    }

    let elsewhere: Vec<(&String, &i64)> = counts
        .iter()
        .filter(|(target, _)| target.as_str() != channel_id)
        .collect();
    if !elsewhere.is_empty() {
        text.push_str("\n**Your memos in other channels**\n");
        let mut in_dms = 0;
        for (target, count) in elsewhere {
            if dm_targets.contains(target) {
                in_dms += count;
            } else {
                text.push_str(&format!("• <#{target}>: {count} memo(s)\n"));
            }
        }
        if in_dms > 0 {
            text.push_str(&format!("• Direct messages: {in_dms} memo(s)\n"));
        }
    }

    let total: i64 = counts.values().sum();
    text.push_str(&format!("\n📈 Your pending memos across all channels: {total}"));
    text
}
