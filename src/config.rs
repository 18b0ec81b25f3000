//! Configuration module for the launchpad bot
//!
//! This module handles configuration loading from TOML files and
//! environment variables. Secrets (signing key, bot token) are only ever
//! read from the environment and never serialized.

use crate::rpc_manager::BroadcasterConfig;
use crate::tx_builder::ChainParams;
use alloy::primitives::Address;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zeroize::Zeroizing;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Target chain and factory
    #[serde(default)]
    pub chain: ChainConfig,

    /// Launch transaction parameters
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Chat bot configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Launchpad factory contract; required
    #[serde(default)]
    pub factory_address: Option<Address>,

    /// Prefix a transaction hash is appended to for explorer links
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    #[serde(default = "default_receipt_poll_interval")]
    pub receipt_poll_interval_ms: u64,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    /// Maximum characters of an RPC error shown to the requester
    #[serde(default = "default_max_error_len")]
    pub max_error_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Long-poll timeout for getUpdates
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Chats allowed to run operator commands
    #[serde(default)]
    pub admin_chat_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Secrets taken from the environment
pub struct Secrets {
    pub private_key: Zeroizing<String>,
    pub bot_token: Zeroizing<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").finish_non_exhaustive()
    }
}

// Default value functions
fn default_rpc_url() -> String { "https://mainnet.base.org".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_chain_id() -> u64 { 8453 }
fn default_explorer_tx_url() -> String { "https://basescan.org/tx/".to_string() }
fn default_gas_limit() -> u64 { 6_000_000 }
fn default_confirmation_timeout() -> u64 { 200 }
fn default_receipt_poll_interval() -> u64 { 1_000 }
fn default_send_timeout() -> u64 { 30 }
fn default_max_error_len() -> usize { 500 }
fn default_telegram_api_base() -> String { "https://api.telegram.org".to_string() }
fn default_poll_timeout() -> u64 { 30 }
fn default_metrics_port() -> u16 { 9090 }
fn default_true() -> bool { true }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            factory_address: None,
            explorer_tx_url: default_explorer_tx_url(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            gas_limit: default_gas_limit(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            receipt_poll_interval_ms: default_receipt_poll_interval(),
            send_timeout_secs: default_send_timeout(),
            max_error_len: default_max_error_len(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api_base(),
            poll_timeout_secs: default_poll_timeout(),
            admin_chat_ids: Vec::new(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: default_true(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            chain: ChainConfig::default(),
            launch: LaunchConfig::default(),
            telegram: TelegramConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing config file {}", path))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay `RPC_URL`, `CHAIN_ID` and `CONTRACT_ADDRESS`
    pub fn apply_env<F>(&mut self, var: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(chain_id) = var("CHAIN_ID") {
            self.chain.chain_id = chain_id
                .trim()
                .parse()
                .with_context(|| format!("CHAIN_ID is not a number: {:?}", chain_id))?;
        }
        if let Some(address) = var("CONTRACT_ADDRESS") {
            self.chain.factory_address = Some(
                address
                    .trim()
                    .parse()
                    .with_context(|| format!("CONTRACT_ADDRESS is not an address: {:?}", address))?,
            );
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain.factory_address.is_none() {
            bail!("chain.factory_address (or CONTRACT_ADDRESS) must be set");
        }
        if self.chain.chain_id == 0 {
            bail!("chain.chain_id must be non-zero");
        }
        if self.launch.gas_limit == 0 {
            bail!("launch.gas_limit must be non-zero");
        }
        if self.launch.confirmation_timeout_secs == 0 {
            bail!("launch.confirmation_timeout_secs must be non-zero");
        }
        if self.launch.receipt_poll_interval_ms == 0 {
            bail!("launch.receipt_poll_interval_ms must be non-zero");
        }
        if self.rpc.url.trim().is_empty() {
            bail!("rpc.url must be set");
        }
        Ok(())
    }

    /// Chain parameters for the transaction builder; requires a validated config
    pub fn chain_params(&self) -> anyhow::Result<ChainParams> {
        let factory = self
            .chain
            .factory_address
            .context("factory address not configured")?;
        Ok(ChainParams {
            chain_id: self.chain.chain_id,
            factory,
            gas_limit: self.launch.gas_limit,
        })
    }

    pub fn broadcaster_config(&self) -> BroadcasterConfig {
        BroadcasterConfig {
            send_timeout: Duration::from_secs(self.launch.send_timeout_secs),
            confirmation_timeout: Duration::from_secs(self.launch.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.launch.receipt_poll_interval_ms),
            max_error_len: self.launch.max_error_len,
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_secs)
    }
}

impl Secrets {
    /// Read `PRIVATE_KEY` and `BOT_TOKEN`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let private_key = Zeroizing::new(var("PRIVATE_KEY").context("PRIVATE_KEY is not set")?);
        let bot_token = Zeroizing::new(var("BOT_TOKEN").context("BOT_TOKEN is not set")?);
        Ok(Self {
            private_key,
            bot_token,
        })
    }
}
