mod command;
mod config;
mod engine;
mod platform;
mod poller;
mod random;
mod scheduler;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::Dispatcher;
use crate::config::Config;
use crate::engine::Randomizer;
use crate::platform::telegram::TelegramTransport;
use crate::poller::Poller;
use crate::scheduler::tasks::register_heartbeat;
use crate::scheduler::Scheduler;

/// Cancel `cancel` on Ctrl+C or SIGTERM.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
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
                    error!("Failed to listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }

        cancel.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,randomizer_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Poll interval: {:?}", config.telegram.poll_interval());
    info!("  Digest format: {}", config.randomizer.digest_format);
    info!("  Numeric ranges: {}", config.randomizer.numeric_range);
    info!(
        "  Limits: range {} / string {}",
        config.limits.max_range_len, config.limits.max_string_len
    );

    if !config.telegram.is_enabled() {
        warn!("telegram.bot_token is empty, nothing to do");
        return Ok(());
    }

    let rng = random::random_source(config.randomizer.seed);
    let engine = Randomizer::new(rng, &config.randomizer, &config.limits);
    let transport =
        TelegramTransport::new(&config.telegram.bot_token, config.telegram.poll_interval())?;
    let mut poller = Poller::new(
        transport,
        Dispatcher::new(engine),
        config.telegram.poll_interval(),
    );

    let mut scheduler = Scheduler::new().await?;
    register_heartbeat(&scheduler, &config.heartbeat.cron, poller.stats()).await?;
    scheduler.start().await?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    info!("Bot is starting...");
    poller.run(cancel).await;

    if let Err(e) = scheduler.shutdown().await {
        warn!("{:#}", e);
    }

    info!("Bot stopped at update offset {}", poller.offset());
    Ok(())
}
