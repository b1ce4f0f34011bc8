//! Test Utilities Module
//!
//! Scripted, in-memory stand-ins for the network seam so budgeting and the
//! submission loop can be exercised deterministically (and under paused
//! tokio time).
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::rpc_manager::{RawSendConfig, RpcManagerError, SubmissionRpc};
use crate::types::{ConfirmationStatus, PriorityFeeSample, TransactionSkeleton};

const MOCK_ENDPOINT: &str = "mock://rpc";

/// Transport failure as the mock reports it
pub fn transport_error(message: &str) -> RpcManagerError {
    RpcManagerError::Transport {
        endpoint: MOCK_ENDPOINT.to_string(),
        message: message.to_string(),
    }
}

/// Scripted response for one `signature_status` call
#[derive(Debug, Clone)]
pub enum StatusScript {
    NotFound,
    Status(ConfirmationStatus),
    Fail(RpcManagerError),
}

/// Scripted response for one `send_raw_transaction` call
#[derive(Debug, Clone)]
pub enum SendScript {
    /// Return the first signature in the submitted bytes
    Accept,
    Fail(RpcManagerError),
}

/// In-memory [`SubmissionRpc`]
///
/// Scripts are consumed one entry per call; the last entry repeats once the
/// script runs out. An empty status script reports "not found".
pub struct MockRpc {
    blockhash: Hash,
    blockhash_failures: AtomicU32,
    simulated_units: Option<u64>,
    simulation_fails: bool,
    fee_samples: Vec<PriorityFeeSample>,
    fees_fail: bool,
    send_script: Mutex<VecDeque<SendScript>>,
    status_script: Mutex<VecDeque<StatusScript>>,
    sent_payloads: Mutex<Vec<Vec<u8>>>,
    simulated: Mutex<Vec<Transaction>>,
    blockhash_calls: AtomicU32,
    simulate_calls: AtomicU32,
    fee_calls: AtomicU32,
    send_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl Default for MockRpc {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRpc {
    /// Healthy node: 100k simulated units, one fee sample of 50k
    pub fn new() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            blockhash_failures: AtomicU32::new(0),
            simulated_units: Some(100_000),
            simulation_fails: false,
            fee_samples: vec![PriorityFeeSample {
                slot: 1,
                fee: 50_000,
            }],
            fees_fail: false,
            send_script: Mutex::new(VecDeque::new()),
            status_script: Mutex::new(VecDeque::new()),
            sent_payloads: Mutex::new(Vec::new()),
            simulated: Mutex::new(Vec::new()),
            blockhash_calls: AtomicU32::new(0),
            simulate_calls: AtomicU32::new(0),
            fee_calls: AtomicU32::new(0),
            send_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        }
    }

    pub fn with_blockhash(mut self, blockhash: Hash) -> Self {
        self.blockhash = blockhash;
        self
    }

    /// Fail the first `n` blockhash fetches
    pub fn with_blockhash_failures(self, n: u32) -> Self {
        self.blockhash_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_simulated_units(mut self, units: Option<u64>) -> Self {
        self.simulated_units = units;
        self
    }

    pub fn with_simulation_failure(mut self) -> Self {
        self.simulation_fails = true;
        self
    }

    pub fn with_fee_samples(mut self, samples: Vec<PriorityFeeSample>) -> Self {
        self.fee_samples = samples;
        self
    }

    pub fn with_fee_failure(mut self) -> Self {
        self.fees_fail = true;
        self
    }

    pub fn with_send_script(self, script: Vec<SendScript>) -> Self {
        *self.send_script.lock() = script.into();
        self
    }

    pub fn with_status_script(self, script: Vec<StatusScript>) -> Self {
        *self.status_script.lock() = script.into();
        self
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// Every payload passed to `send_raw_transaction`, in order
    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.sent_payloads.lock().clone()
    }

    /// Every transaction passed to `simulate_compute_units`, in order
    pub fn simulated_transactions(&self) -> Vec<Transaction> {
        self.simulated.lock().clone()
    }

    pub fn blockhash_calls(&self) -> u32 {
        self.blockhash_calls.load(Ordering::SeqCst)
    }

    pub fn simulate_calls(&self) -> u32 {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn fee_calls(&self) -> u32 {
        self.fee_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> u32 {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn next<T: Clone>(script: &Mutex<VecDeque<T>>) -> Option<T> {
        let mut script = script.lock();
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl SubmissionRpc for MockRpc {
    async fn latest_blockhash(&self) -> Result<Hash, RpcManagerError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.blockhash_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.blockhash_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(transport_error("blockhash unavailable"));
        }
        Ok(self.blockhash)
    }

    async fn simulate_compute_units(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<u64>, RpcManagerError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        self.simulated.lock().push(transaction.clone());
        if self.simulation_fails {
            return Err(transport_error("simulation unreachable"));
        }
        Ok(self.simulated_units)
    }

    async fn recent_prioritization_fees(&self) -> Result<Vec<PriorityFeeSample>, RpcManagerError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        if self.fees_fail {
            return Err(transport_error("fee endpoint unreachable"));
        }
        Ok(self.fee_samples.clone())
    }

    async fn send_raw_transaction(
        &self,
        wire_transaction: &[u8],
        _config: &RawSendConfig,
    ) -> Result<Signature, RpcManagerError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sent_payloads.lock().push(wire_transaction.to_vec());

        match Self::next(&self.send_script).unwrap_or(SendScript::Accept) {
            SendScript::Accept => {
                let tx: Transaction = bincode::deserialize(wire_transaction).map_err(|e| {
                    RpcManagerError::MalformedResponse {
                        endpoint: MOCK_ENDPOINT.to_string(),
                        message: e.to_string(),
                    }
                })?;
                tx.signatures.first().copied().ok_or_else(|| {
                    RpcManagerError::MalformedResponse {
                        endpoint: MOCK_ENDPOINT.to_string(),
                        message: "transaction has no signatures".to_string(),
                    }
                })
            }
            SendScript::Fail(err) => Err(err),
        }
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<ConfirmationStatus>, RpcManagerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match Self::next(&self.status_script).unwrap_or(StatusScript::NotFound) {
            StatusScript::NotFound => Ok(None),
            StatusScript::Status(status) => Ok(Some(status)),
            StatusScript::Fail(err) => Err(err),
        }
    }
}

/// Skeleton with one no-op instruction and `fee_payer` as the only signer
pub fn sample_skeleton(fee_payer: Pubkey) -> TransactionSkeleton {
    TransactionSkeleton::new(fee_payer, Hash::default()).with_instruction(
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1, 2, 3, 4],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_script_repeats_last_entry() {
        let rpc = MockRpc::new().with_status_script(vec![
            StatusScript::NotFound,
            StatusScript::Status(ConfirmationStatus::confirmed(9)),
        ]);
        let sig = Signature::default();

        assert!(rpc.signature_status(&sig).await.unwrap().is_none());
        for _ in 0..3 {
            assert!(rpc.signature_status(&sig).await.unwrap().is_some());
        }
        assert_eq!(rpc.status_calls(), 4);
    }

    #[tokio::test]
    async fn test_blockhash_failures_are_consumed() {
        let rpc = MockRpc::new().with_blockhash_failures(2);

        assert!(rpc.latest_blockhash().await.is_err());
        assert!(rpc.latest_blockhash().await.is_err());
        assert_eq!(rpc.latest_blockhash().await.unwrap(), rpc.blockhash());
    }
}
