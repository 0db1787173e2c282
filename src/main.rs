use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use drxbot::cli::{Cli, Commands};
use drxbot::core::{config, init_logger};
use drxbot::storage::create_pool;
use drxbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables before any Lazy config static is touched
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    // Log dispatcher panics instead of silently unwinding a worker
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!(
                "Panic at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
    }));

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
    }
}

/// Run the bot with long polling until interrupted
async fn run_bot() -> Result<()> {
    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH)?);
    log::info!("Database ready at {}", config::DATABASE_PATH.as_str());

    let bot = create_bot()?;

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let me = bot.get_me().await?;
    let deps = HandlerDeps {
        db_pool,
        bot_username: me.user.username.clone(),
        bot_id: me.user.id,
    };

    log::info!(
        "Starting DRX Mining bot as @{}...",
        me.user.username.as_deref().unwrap_or("unknown")
    );

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Bot stopped");
    Ok(())
}
