// src/main.rs - Process wiring: config, rule store, keep-alive, Telegram loop

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::sync::Arc;

use dante::bot::ModeratorBot;
use dante::config::BotConfig;
use dante::platforms::telegram::{TelegramConfig, TelegramConnection};
use dante::platforms::ChatPlatform;
use dante::rules::RuleStore;
use dante::web::spawn_keepalive_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Dante v{} - group moderation bot", dante::VERSION);

    let config = BotConfig::from_env()?;

    // A corrupted rule file aborts startup here rather than silently
    // resetting rules an admin spent time building.
    let store = Arc::new(
        RuleStore::load(config.data_file.clone(), config.owner_id)
            .await
            .context("failed to load the rule set")?,
    );

    spawn_keepalive_server(config.keepalive_port);

    let mut connection = TelegramConnection::new(TelegramConfig::from_env()?);
    connection
        .connect()
        .await
        .context("failed to connect to Telegram")?;
    let receiver = connection
        .message_receiver()
        .context("connection produced no message receiver")?;
    let platform: Arc<dyn ChatPlatform> = Arc::new(connection);

    let bot = ModeratorBot::new(store.clone(), platform);

    tokio::select! {
        _ = bot.run(receiver) => {
            warn!("Message stream ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    // Best-effort flush of the rule set on the way out.
    if let Err(e) = store.save().await {
        error!("Final rule set flush failed: {}", e);
    }

    info!("Dante stopped");
    Ok(())
}
