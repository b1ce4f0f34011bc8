//! Core TransactionBuilder implementation
//!
//! [`TxBuilder`] turns a caller's skeleton into a signed, budgeted
//! transaction:
//! 1. Refresh the recent blockhash (exponential backoff with jitter)
//! 2. Strip existing compute-budget instructions
//! 3. Estimate the budget on the stripped skeleton (fee and CU in parallel)
//! 4. Prepend the fresh budget instructions
//! 5. Sign every required slot
//!
//! The builder never broadcasts; see [`crate::submission`] for that.

use solana_sdk::{hash::Hash, signature::Signer};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{debug, instrument, warn};

use crate::config::{BlockhashConfig, FeeConfig};
use crate::rpc_manager::SubmissionRpc;
use crate::tx_builder::budget::BudgetEstimator;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::instructions::{
    apply_compute_budget, sanity_check_budget_layout, strip_budget_instructions,
};
use crate::tx_builder::output::SignedTransaction;
use crate::tx_builder::signing::sign_skeleton;
use crate::types::{ComputeBudget, TransactionSkeleton};

/// Budgeted skeleton ready for signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction {
    pub skeleton: TransactionSkeleton,
    pub budget: ComputeBudget,
}

#[derive(Clone)]
pub struct TxBuilder {
    rpc: Arc<dyn SubmissionRpc>,
    estimator: BudgetEstimator,
    blockhash: BlockhashConfig,
}

impl TxBuilder {
    pub fn new(rpc: Arc<dyn SubmissionRpc>, fees: FeeConfig, blockhash: BlockhashConfig) -> Self {
        Self {
            estimator: BudgetEstimator::new(rpc.clone(), fees),
            rpc,
            blockhash,
        }
    }

    pub fn estimator(&self) -> &BudgetEstimator {
        &self.estimator
    }

    /// Delays between blockhash fetch attempts
    ///
    /// `starting_delay_ms`, doubling each time, capped at `max_delay_ms`,
    /// scaled by random jitter.
    fn blockhash_backoff(&self) -> impl Iterator<Item = Duration> {
        let cap = Duration::from_millis(self.blockhash.max_delay_ms);
        ExponentialBackoff::from_millis(2)
            .factor(self.blockhash.starting_delay_ms)
            .map(move |d| (d / 2).min(cap))
            .map(jitter)
            .take(self.blockhash.max_attempts.saturating_sub(1))
    }

    /// Fetch a recent blockhash, retrying transport failures
    #[instrument(skip(self))]
    pub async fn refresh_blockhash(&self) -> Result<Hash, TransactionBuilderError> {
        let rpc = &self.rpc;
        Retry::spawn(self.blockhash_backoff(), || async move {
            rpc.latest_blockhash().await.map_err(|e| {
                warn!(error = %e, "Blockhash fetch failed");
                e
            })
        })
        .await
        .map_err(|e| {
            TransactionBuilderError::blockhash_unavailable(format!(
                "unable to get latest blockhash: {}",
                e
            ))
        })
    }

    /// Refresh the blockhash, then replace any budget with a fresh estimate
    pub async fn prepare(
        &self,
        skeleton: TransactionSkeleton,
    ) -> Result<PreparedTransaction, TransactionBuilderError> {
        let mut stripped = strip_budget_instructions(skeleton);
        stripped.recent_blockhash = self.refresh_blockhash().await?;

        let budget = self.estimator.estimate(&stripped).await?;
        let skeleton = apply_compute_budget(stripped, &budget);
        sanity_check_budget_layout(&skeleton.instructions)?;

        debug!(
            unit_limit = budget.unit_limit,
            micro_lamport_price = budget.micro_lamport_price,
            num_instructions = skeleton.instructions.len(),
            "Compute budget applied"
        );

        Ok(PreparedTransaction { skeleton, budget })
    }

    /// Sign a prepared skeleton
    pub fn sign(
        &self,
        prepared: &PreparedTransaction,
        signers: &[&dyn Signer],
    ) -> Result<SignedTransaction, TransactionBuilderError> {
        sign_skeleton(&prepared.skeleton, signers)
    }
}
