//! Structured logging for submission lifecycle events

use solana_sdk::signature::Signature;

use crate::rpc_manager::RpcManagerError;
use crate::types::{ComputeBudget, ConfirmationStatus, SubmissionOperation};

/// Structured logger bound to one submission
#[derive(Debug, Clone)]
pub struct SubmissionLogger {
    context_id: String,
}

impl SubmissionLogger {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_budget(&self, budget: &ComputeBudget, num_instructions: usize) {
        tracing::info!(
            context_id = %self.context_id,
            unit_limit = budget.unit_limit,
            micro_lamport_price = budget.micro_lamport_price,
            num_instructions = num_instructions,
            "Compute budget applied"
        );
    }

    pub fn log_attempt(&self, attempt: u32, max_attempts: u32, signature: Option<&Signature>) {
        tracing::debug!(
            context_id = %self.context_id,
            attempt = attempt,
            max_attempts = max_attempts,
            signature = ?signature,
            "Broadcasting transaction"
        );
    }

    pub fn log_sent(&self, signature: &Signature, attempt: u32) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %signature,
            attempt = attempt,
            "Transaction sent"
        );
    }

    pub fn log_transient_failure(
        &self,
        attempt: u32,
        operation: SubmissionOperation,
        error: &RpcManagerError,
    ) {
        tracing::warn!(
            context_id = %self.context_id,
            attempt = attempt,
            operation = operation.as_str(),
            kind = error.kind(),
            error = %error,
            "Transient submission failure"
        );
    }

    pub fn log_landed(&self, signature: &Signature, status: &ConfirmationStatus, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %signature,
            level = status.level.as_str(),
            slot = status.slot,
            latency_ms = latency_ms,
            "Transaction confirmed"
        );
    }

    pub fn log_on_chain_failure(&self, signature: &Signature, payload: &str) {
        tracing::error!(
            context_id = %self.context_id,
            signature = %signature,
            payload = %payload,
            "Transaction failed on-chain"
        );
    }

    pub fn log_timeout(&self, signature: Option<&Signature>, attempts: u32) {
        tracing::warn!(
            context_id = %self.context_id,
            signature = ?signature,
            attempts = attempts,
            "Retry budget exhausted without confirmation; transaction may still land"
        );
    }

    pub fn log_cancelled(&self, signature: Option<&Signature>) {
        tracing::warn!(
            context_id = %self.context_id,
            signature = ?signature,
            "Submission cancelled"
        );
    }
}
