use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;
use tokio::sync::watch;

use memobot::commands::{
    register_global_commands, register_guild_commands, CommandContext, CommandHandler,
};
use memobot::core::Config;
use memobot::database::Database;
use memobot::features::memos::MemoService;
use memobot::features::rate_limiting::RateLimiter;
use memobot::features::reminders::{DiscordSink, ReminderScheduler};
use memobot::features::timeparse::TimeParser;

struct Handler {
    command_handler: Arc<CommandHandler>,
    guild_id: Option<GuildId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        let registered = match self.guild_id {
            Some(guild_id) => {
                info!("Registering slash commands for development guild {guild_id}");
                register_guild_commands(&ctx, guild_id).await
            }
            None => {
                info!("Registering global slash commands (may take up to an hour to appear)");
                register_global_commands(&ctx).await
            }
        };
        if let Err(e) = registered {
            error!("Failed to register slash commands: {e}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };

        if let Err(e) = self
            .command_handler
            .handle_slash_command(&ctx, &command)
            .await
        {
            error!(
                "Error handling slash command '{}': {}",
                command.data.name, e
            );

            let error_message =
                "❌ Sorry, I encountered an error processing your command. Please try again.";

            // The handler may already have answered; edit that reply instead
            if command
                .edit_original_interaction_response(&ctx.http, |response| {
                    response.content(error_message)
                })
                .await
                .is_err()
            {
                let _ = command
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(serenity::model::application::interaction::InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message.content(error_message).ephemeral(true)
                            })
                    })
                    .await;
            }
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Memo Bot...");
    config.log_summary();

    let database = Database::new(&config.database_path).await?;
    let memo_service = MemoService::new(Arc::new(database));
    let time_parser = Arc::new(TimeParser::new()?);

    let command_handler = CommandHandler::new(
        CommandContext::new(memo_service.clone(), time_parser, config.timezone),
        RateLimiter::new(config.command_rate_limit, config.command_rate_window),
    );

    // Parse guild ID if provided for development mode
    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let handler = Handler {
        command_handler: Arc::new(command_handler),
        guild_id,
    };

    let intents = GatewayIntents::GUILDS | GatewayIntents::DIRECT_MESSAGES;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    // Start the reminder scheduler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let scheduler = ReminderScheduler::new(
        memo_service,
        Arc::new(DiscordSink::new(client.cache_and_http.http.clone())),
        config.timezone,
        config.scan_interval,
        config.delivery_timeout,
    );
    let scheduler_task = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    let shard_manager = client.shard_manager.clone();
    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("🛑 Shutdown requested, stopping scheduler and gateway...");
        let _ = signal_tx.send(true);
        shard_manager.lock().await.shutdown_all().await;
    });

    let gateway_result = client.start().await;

    // Stop the scheduler however the gateway ended
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        warn!("Reminder scheduler task ended abnormally: {e}");
    }

    if let Err(why) = gateway_result {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    info!("👋 Memo Bot stopped");
    Ok(())
}
