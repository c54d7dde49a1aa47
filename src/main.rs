use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use football_tips::api::{build_provider, TelegramClient};
use football_tips::config::Config;
use football_tips::db::TipStore;
use football_tips::prediction::EloTable;
use football_tips::service::{TipService, TipSettings};
use football_tips::workers::{BotWorker, SettlementWorker};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "football_tips=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting football-tips");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded (provider: {:?})", config.provider);

    // Initialize database
    let store = Arc::new(TipStore::new(&config.database_url).await?);
    info!("Database initialized");

    // Initialize API clients
    let provider = build_provider(&config)?;
    let telegram = TelegramClient::new(
        &config.telegram_api_url,
        &config.telegram_token,
        Duration::from_secs(config.poll_timeout),
    )?;

    let me = telegram
        .get_me()
        .await
        .context("Telegram rejected the bot token")?;
    info!(
        "API clients initialized (bot: @{}, provider: {})",
        me.username.as_deref().unwrap_or("unknown"),
        provider.name()
    );

    // Shared state
    let elo = Arc::new(RwLock::new(EloTable::new()));
    let service = Arc::new(TipService::new(
        Arc::clone(&provider),
        Arc::clone(&store),
        Arc::clone(&elo),
        TipSettings::from_config(&config),
    ));

    // Create workers
    let bot = BotWorker::new(
        telegram,
        Arc::clone(&service),
        config.user_cooldown,
        config.poll_timeout,
        config.max_tips,
    );

    let settler = SettlementWorker::new(
        provider,
        Arc::clone(&store),
        Arc::clone(&elo),
        config.settle_interval,
    );

    info!("Workers created, starting...");

    // Spawn workers
    let bot_handle = tokio::spawn(async move {
        bot.run().await;
    });

    let settler_handle = tokio::spawn(async move {
        settler.run().await;
    });

    info!("All workers started");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = bot_handle => {
            error!("Bot worker exited unexpectedly: {:?}", result);
        }
        result = settler_handle => {
            error!("Settlement worker exited unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down football-tips");
    Ok(())
}
