use serde::{Deserialize, Serialize};
use solana_rpc_client_api::config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentLevel;
use solana_transaction_status::UiTransactionEncoding;

use super::RpcManagerError;

/// Flags sent with every raw broadcast
///
/// The lander runs its own retry policy, so node-side preflight and
/// rebroadcasting are switched off by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSendConfig {
    /// Skip node-side preflight simulation
    #[serde(default = "default_true")]
    pub skip_preflight: bool,

    /// Commitment used for preflight when it does run
    #[serde(default = "default_preflight_commitment")]
    pub preflight_commitment: CommitmentLevel,

    /// Node-side rebroadcast attempts
    #[serde(default)]
    pub max_retries: usize,
}

fn default_true() -> bool {
    true
}

fn default_preflight_commitment() -> CommitmentLevel {
    CommitmentLevel::Confirmed
}

impl Default for RawSendConfig {
    fn default() -> Self {
        Self {
            skip_preflight: default_true(),
            preflight_commitment: default_preflight_commitment(),
            max_retries: 0,
        }
    }
}

impl RawSendConfig {
    /// JSON-RPC `sendTransaction` options for base64-encoded payloads
    pub fn to_rpc_config(&self) -> RpcSendTransactionConfig {
        RpcSendTransactionConfig {
            skip_preflight: self.skip_preflight,
            preflight_commitment: Some(self.preflight_commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            max_retries: Some(self.max_retries),
            min_context_slot: None,
        }
    }
}

/// Accept only absolute http(s) URLs
pub fn validate_rpc_url(url: &str) -> Result<reqwest::Url, RpcManagerError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| RpcManagerError::Configuration(format!("Invalid RPC URL {}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(RpcManagerError::Configuration(format!(
            "Invalid RPC URL {}: unsupported scheme {}",
            url, other
        ))),
    }
}
