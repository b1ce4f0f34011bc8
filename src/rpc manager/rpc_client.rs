//! JSON-RPC implementation of [`SubmissionRpc`] on top of the nonblocking Solana client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::{config::RpcSimulateTransactionConfig, request::RpcRequest};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::{validate_rpc_url, RawSendConfig, RpcManagerError, SubmissionRpc};
use crate::metrics::metrics;
use crate::types::{ConfirmationLevel, ConfirmationStatus, PriorityFeeSample};

/// Single-endpoint RPC client
#[derive(Clone)]
pub struct SolanaRpcClient {
    client: Arc<RpcClient>,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for SolanaRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpcClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SolanaRpcClient {
    /// Create a client for `url` with a per-request timeout
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcManagerError> {
        let parsed = validate_rpc_url(url)?;
        let client = RpcClient::new_with_timeout_and_commitment(
            parsed.to_string(),
            timeout,
            CommitmentConfig::confirmed(),
        );

        Ok(Self {
            client: Arc::new(client),
            endpoint: url.to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_err(&self, err: solana_client::client_error::ClientError) -> RpcManagerError {
        RpcManagerError::from_client_error(err, &self.endpoint, self.timeout.as_millis() as u64)
    }

    fn observe_latency(started: Instant) {
        metrics().rpc_latency.observe(started.elapsed().as_secs_f64());
    }
}

/// Map a node status into the lander's view of it
pub(crate) fn confirmation_from_status(status: TransactionStatus) -> ConfirmationStatus {
    let level = match status.confirmation_status {
        Some(TransactionConfirmationStatus::Finalized) => ConfirmationLevel::Finalized,
        Some(TransactionConfirmationStatus::Confirmed) => ConfirmationLevel::Confirmed,
        Some(TransactionConfirmationStatus::Processed) => ConfirmationLevel::Pending,
        // Older nodes omit confirmationStatus; `confirmations: None` means rooted
        None if status.confirmations.is_none() => ConfirmationLevel::Finalized,
        None => ConfirmationLevel::Pending,
    };

    ConfirmationStatus {
        level,
        slot: status.slot,
        error: status.err,
    }
}

#[async_trait]
impl SubmissionRpc for SolanaRpcClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn latest_blockhash(&self) -> Result<Hash, RpcManagerError> {
        let started = Instant::now();
        let result = self
            .client
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .await;
        Self::observe_latency(started);

        let (blockhash, last_valid_block_height) = result.map_err(|e| self.map_err(e))?;
        debug!(%blockhash, last_valid_block_height, "Fetched latest blockhash");
        Ok(blockhash)
    }

    #[instrument(skip(self, transaction), fields(endpoint = %self.endpoint))]
    async fn simulate_compute_units(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<u64>, RpcManagerError> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(CommitmentConfig::confirmed()),
            ..RpcSimulateTransactionConfig::default()
        };

        let started = Instant::now();
        let result = self
            .client
            .simulate_transaction_with_config(transaction, config)
            .await;
        Self::observe_latency(started);

        let response = result.map_err(|e| self.map_err(e))?;
        if let Some(err) = &response.value.err {
            // Units consumed are still reported up to the failure point
            warn!(error = ?err, "Simulation reported an execution error");
        }

        Ok(response.value.units_consumed)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn recent_prioritization_fees(&self) -> Result<Vec<PriorityFeeSample>, RpcManagerError> {
        let started = Instant::now();
        let result = self.client.get_recent_prioritization_fees(&[]).await;
        Self::observe_latency(started);

        let fees = result.map_err(|e| self.map_err(e))?;
        Ok(fees
            .into_iter()
            .map(|f| PriorityFeeSample {
                slot: f.slot,
                fee: f.prioritization_fee,
            })
            .collect())
    }

    async fn send_raw_transaction(
        &self,
        wire_transaction: &[u8],
        config: &RawSendConfig,
    ) -> Result<Signature, RpcManagerError> {
        let encoded = BASE64_STANDARD.encode(wire_transaction);
        let params = serde_json::json!([encoded, config.to_rpc_config()]);

        let started = Instant::now();
        let result = self
            .client
            .send::<String>(RpcRequest::SendTransaction, params)
            .await;
        Self::observe_latency(started);

        let signature = result.map_err(|e| self.map_err(e))?;
        Signature::from_str(&signature).map_err(|e| RpcManagerError::MalformedResponse {
            endpoint: self.endpoint.clone(),
            message: format!("invalid signature {}: {}", signature, e),
        })
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<ConfirmationStatus>, RpcManagerError> {
        let started = Instant::now();
        let result = self
            .client
            .get_signature_statuses(std::slice::from_ref(signature))
            .await;
        Self::observe_latency(started);

        let response = result.map_err(|e| self.map_err(e))?;
        Ok(response
            .value
            .into_iter()
            .next()
            .flatten()
            .map(confirmation_from_status))
    }
}
