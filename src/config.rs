//! Configuration module for the lander
//!
//! This module handles configuration loading from TOML files and
//! environment variables, and provides structured configuration types.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::rpc_manager::{validate_rpc_url, RawSendConfig};
use crate::tx_builder::budget::{
    FeePolicy, DEFAULT_COMPUTE_UNIT_MARGIN_PCT, MAX_CU_PRICE, MIN_CU_PRICE,
};

/// Endpoint used when neither the config file nor the CLI names one
pub const DEFAULT_RPC_URL: &str = "https://api.testnet.sonic.game";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Retry loop configuration
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Priority fee and compute unit configuration
    #[serde(default)]
    pub fees: FeeConfig,

    /// Blockhash refresh backoff
    #[serde(default)]
    pub blockhash: BlockhashConfig,

    /// Wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,

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
pub struct SubmissionConfig {
    /// Pause between retry iterations in milliseconds
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Iterations before giving up on confirmation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Flags for every raw broadcast
    #[serde(default)]
    pub send: RawSendConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// How the recent fee samples collapse into one price
    #[serde(default)]
    pub policy: FeePolicy,

    /// Lower clamp in micro-lamports per compute unit
    #[serde(default = "default_min_cu_price")]
    pub min_cu_price: u64,

    /// Upper clamp in micro-lamports per compute unit
    #[serde(default = "default_max_cu_price")]
    pub max_cu_price: u64,

    /// Simulated units are scaled by this percentage
    #[serde(default = "default_compute_unit_margin_pct")]
    pub compute_unit_margin_pct: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockhashConfig {
    /// Total fetch attempts, including the first
    #[serde(default = "default_blockhash_attempts")]
    pub max_attempts: usize,

    /// Delay before the first retry; doubles on each further retry
    #[serde(default = "default_blockhash_delay_ms")]
    pub starting_delay_ms: u64,

    /// Upper bound for a single backoff delay
    #[serde(default = "default_blockhash_max_delay_ms")]
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Keypair files; the first one pays fees when the CLI builds the skeleton
    #[serde(default)]
    pub keypair_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Print Prometheus metrics when a submission ends
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_rpc_url() -> String { DEFAULT_RPC_URL.to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_retry_interval_ms() -> u64 { 2_000 }
fn default_max_retries() -> u32 { 30 }
fn default_min_cu_price() -> u64 { MIN_CU_PRICE }
fn default_max_cu_price() -> u64 { MAX_CU_PRICE }
fn default_compute_unit_margin_pct() -> u64 { DEFAULT_COMPUTE_UNIT_MARGIN_PCT }
fn default_blockhash_attempts() -> usize { 10 }
fn default_blockhash_delay_ms() -> u64 { 100 }
fn default_blockhash_max_delay_ms() -> u64 { 10_000 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            max_retries: default_max_retries(),
            send: RawSendConfig::default(),
        }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            policy: FeePolicy::default(),
            min_cu_price: default_min_cu_price(),
            max_cu_price: default_max_cu_price(),
            compute_unit_margin_pct: default_compute_unit_margin_pct(),
        }
    }
}

impl Default for BlockhashConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_blockhash_attempts(),
            starting_delay_ms: default_blockhash_delay_ms(),
            max_delay_ms: default_blockhash_max_delay_ms(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: default_true(),
            json_logs: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    ///
    /// `LANDER_RPC_URL` replaces `rpc.url` when set.
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the current values
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("LANDER_RPC_URL") {
            if !url.trim().is_empty() {
                self.rpc.url = url;
            }
        }
    }

    /// Reject values the lander cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_rpc_url(&self.rpc.url)?;

        if self.rpc.timeout_secs == 0 {
            anyhow::bail!("rpc.timeout_secs must be greater than zero");
        }
        if self.submission.max_retries == 0 {
            anyhow::bail!("submission.max_retries must be at least 1");
        }
        if self.fees.min_cu_price > self.fees.max_cu_price {
            anyhow::bail!(
                "fees.min_cu_price ({}) exceeds fees.max_cu_price ({})",
                self.fees.min_cu_price,
                self.fees.max_cu_price
            );
        }
        if self.fees.compute_unit_margin_pct < 100 {
            anyhow::bail!(
                "fees.compute_unit_margin_pct must be at least 100, got {}",
                self.fees.compute_unit_margin_pct
            );
        }
        if self.blockhash.max_attempts == 0 {
            anyhow::bail!("blockhash.max_attempts must be at least 1");
        }
        Ok(())
    }
}
