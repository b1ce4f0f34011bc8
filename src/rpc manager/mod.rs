//! RPC Manager Module
//!
//! The network seam of the lander: one JSON-RPC endpoint, five calls.

use async_trait::async_trait;
use solana_sdk::{hash::Hash, signature::Signature, transaction::Transaction};

use crate::types::{ConfirmationStatus, PriorityFeeSample};

// Submodules
pub mod rpc_client;
pub mod rpc_config;
pub mod rpc_errors;

// Re-exports for convenience
pub use rpc_client::SolanaRpcClient;
pub use rpc_config::{validate_rpc_url, RawSendConfig};
pub use rpc_errors::RpcManagerError;

/// Network operations needed to budget, broadcast and confirm a transaction
///
/// Implementations are shared read-only between concurrent submissions.
#[async_trait]
pub trait SubmissionRpc: Send + Sync {
    /// Latest blockhash at `confirmed` commitment
    async fn latest_blockhash(&self) -> Result<Hash, RpcManagerError>;

    /// Simulate an unsigned transaction and return the consumed compute units
    async fn simulate_compute_units(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<u64>, RpcManagerError>;

    /// Per-slot prioritization fees for recent blocks
    async fn recent_prioritization_fees(&self) -> Result<Vec<PriorityFeeSample>, RpcManagerError>;

    /// Broadcast already-serialized transaction bytes
    async fn send_raw_transaction(
        &self,
        wire_transaction: &[u8],
        config: &RawSendConfig,
    ) -> Result<Signature, RpcManagerError>;

    /// Status of a signature; `None` while the node has not seen it
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<ConfirmationStatus>, RpcManagerError>;
}
