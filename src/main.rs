//! Launchpad Bot
//!
//! Entry point: loads configuration and secrets, seeds the nonce sequencer
//! from the chain, and runs the Telegram front end until Ctrl-C.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::Parser;
use launchpad_bot::config::{Config, Secrets};
use launchpad_bot::endpoints;
use launchpad_bot::launch_engine::LaunchEngine;
use launchpad_bot::reporter::LaunchReporter;
use launchpad_bot::rpc_manager::{alloy_rpc, ChainRpc};
use launchpad_bot::telegram::{LaunchBot, TelegramClient};
use launchpad_bot::wallet::SigningAccount;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "LAUNCHPAD_CONFIG", default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Metrics port (overrides the config file)
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.log_json)?;

    info!("🚀 Starting Launchpad Bot");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    info!("📋 Loading configuration from: {}", args.config);
    let config = load_config(&args.config)?;
    config.validate().context("Invalid configuration")?;
    let secrets = Secrets::from_env()?;

    // Signing key
    let account = SigningAccount::from_hex(&secrets.private_key).context("Failed to load signing key")?;
    info!("💼 Signer address: {}", account.address());

    // Initialize metrics
    if config.monitoring.enable_metrics {
        let metrics_port = args.metrics_port.unwrap_or(config.monitoring.metrics_port);
        info!("📊 Starting metrics server on port {}", metrics_port);
        tokio::spawn(async move {
            if let Err(e) = endpoints::endpoint_server(metrics_port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    // Chain access
    info!("🌐 Connecting to RPC: {}", config.rpc.url);
    let rpc: Arc<dyn ChainRpc> = Arc::new(alloy_rpc::connect_http(&config.rpc.url, config.rpc_timeout())?);

    let params = config.chain_params()?;
    info!(
        "🏭 Factory {} on chain {} (gas limit {})",
        params.factory, params.chain_id, params.gas_limit
    );

    let engine = LaunchEngine::connect(rpc, account, params, config.broadcaster_config())
        .await
        .context("Failed to read starting nonce from chain")?;
    info!("🔢 Next nonce: {}", engine.next_nonce().await);

    let client = TelegramClient::new(
        &config.telegram.api_base,
        &secrets.bot_token,
        Duration::from_secs(config.telegram.poll_timeout_secs),
    )?;
    let bot = Arc::new(LaunchBot::new(
        client,
        Arc::new(engine),
        LaunchReporter::new(&config.chain.explorer_tx_url, config.launch.max_error_len),
        config.telegram.admin_chat_ids.clone(),
    ));

    info!("✅ All components initialized successfully");

    tokio::select! {
        result = bot.run() => {
            if let Err(e) = result {
                error!("Bot stopped: {:#}", e);
                return Err(e);
            }
        }

        // Graceful shutdown signal
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Received shutdown signal");
        }
    }

    info!("👋 Shutting down; unconfirmed launches remain on chain");
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "launchpad_bot=debug,info"
    } else {
        "launchpad_bot=info,warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        dotenvy::dotenv().ok();
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }
}
