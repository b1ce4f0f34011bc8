//! Submission loop: rebroadcast signed bytes and poll for confirmation
//!
//! Each retry iteration forks two legs and joins them before sleeping:
//! - broadcast the immutable wire bytes (no preflight, no node-side retries)
//! - poll the status of the signature, once one has been observed
//!
//! Transport failures on either leg are reported and swallowed. A reported
//! on-chain error ends the submission at once. Running out of attempts ends it
//! with [`TransactionBuilderError::Timeout`]; the transaction may still land
//! after that, since only the watching stopped.
//!
//! All loop state (cached signature, latest status) belongs to one
//! [`SubmissionLoop`]; nothing is shared between submissions except the
//! read-only RPC client.

use solana_sdk::signature::Signature;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SubmissionConfig;
use crate::metrics::metrics;
use crate::rpc_manager::{RawSendConfig, RpcManagerError, SubmissionRpc};
use crate::structured_logging::SubmissionLogger;
use crate::tx_builder::{SignedTransaction, TransactionBuilderError};
use crate::types::{
    ConfirmationStatus, SubmissionEvent, SubmissionOperation, SubmissionState, TransientFailure,
};

/// Receives lifecycle updates for one submission
pub trait SubmissionObserver: Send + Sync {
    fn on_state(&self, state: &SubmissionState);

    /// A broadcast or poll round-trip failed and was swallowed
    fn on_transient_failure(&self, _failure: &TransientFailure) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SubmissionObserver for NoopObserver {
    fn on_state(&self, _state: &SubmissionState) {}
}

/// Adapter for plain state callbacks
pub struct StateCallback<F>(pub F);

impl<F> SubmissionObserver for StateCallback<F>
where
    F: Fn(&SubmissionState) + Send + Sync,
{
    fn on_state(&self, state: &SubmissionState) {
        (self.0)(state)
    }
}

/// Forward every event into a channel
impl SubmissionObserver for mpsc::UnboundedSender<SubmissionEvent> {
    fn on_state(&self, state: &SubmissionState) {
        // Receiver gone means nobody is listening any more
        let _ = self.send(SubmissionEvent::State(state.clone()));
    }

    fn on_transient_failure(&self, failure: &TransientFailure) {
        let _ = self.send(SubmissionEvent::TransientFailure(failure.clone()));
    }
}

/// Emits states in lifecycle order, each at most once
pub struct StateEmitter<'a> {
    observer: &'a dyn SubmissionObserver,
    last_rank: Option<u8>,
}

impl<'a> StateEmitter<'a> {
    pub fn new(observer: &'a dyn SubmissionObserver) -> Self {
        Self {
            observer,
            last_rank: None,
        }
    }

    /// Forward `state` unless it does not advance the lifecycle
    pub fn emit(&mut self, state: SubmissionState) -> bool {
        let rank = state.rank();
        if self.last_rank.is_some_and(|last| rank <= last) {
            debug!(state = state.name(), "Dropping non-advancing state transition");
            return false;
        }
        self.last_rank = Some(rank);
        self.observer.on_state(&state);
        true
    }

    pub fn transient_failure(&self, failure: &TransientFailure) {
        self.observer.on_transient_failure(failure);
    }
}

/// Timing and broadcast flags for the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSettings {
    pub retry_interval: Duration,
    pub max_retries: u32,
    pub send: RawSendConfig,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self::from(&SubmissionConfig::default())
    }
}

impl From<&SubmissionConfig> for SubmissionSettings {
    fn from(config: &SubmissionConfig) -> Self {
        Self {
            retry_interval: Duration::from_millis(config.retry_interval_ms),
            max_retries: config.max_retries,
            send: config.send.clone(),
        }
    }
}

/// Result of the status leg of one iteration
enum PollOutcome {
    /// No signature known yet
    Skipped,
    NotFound,
    Status(ConfirmationStatus),
    Failed(RpcManagerError),
}

struct ActiveGuard;

impl ActiveGuard {
    fn enter() -> Self {
        metrics().active_submissions.inc();
        Self
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        metrics().active_submissions.dec();
    }
}

/// Retry engine owning one signed transaction
pub struct SubmissionLoop {
    rpc: Arc<dyn SubmissionRpc>,
    signed: SignedTransaction,
    settings: SubmissionSettings,
    logger: SubmissionLogger,
    signature: Option<Signature>,
    status: Option<ConfirmationStatus>,
    transient_failures: u32,
    first_sent_at: Option<Instant>,
}

impl SubmissionLoop {
    pub fn new(
        rpc: Arc<dyn SubmissionRpc>,
        signed: SignedTransaction,
        settings: SubmissionSettings,
        logger: SubmissionLogger,
    ) -> Self {
        Self {
            rpc,
            signed,
            settings,
            logger,
            signature: None,
            status: None,
            transient_failures: 0,
            first_sent_at: None,
        }
    }

    /// Swallowed failures so far
    pub fn transient_failures(&self) -> u32 {
        self.transient_failures
    }

    /// Drive the loop to a terminal state
    ///
    /// Returns the signature once the status is confirmed or finalized.
    pub async fn run(
        mut self,
        emitter: &mut StateEmitter<'_>,
        cancel: &CancellationToken,
    ) -> Result<Signature, TransactionBuilderError> {
        let _active = ActiveGuard::enter();
        let max_attempts = self.settings.max_retries;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(self.cancelled());
            }

            self.logger
                .log_attempt(attempt, max_attempts, self.signature.as_ref());

            let known_signature = self.signature;
            let (sent, polled) = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled()),
                legs = async { tokio::join!(self.broadcast(), self.poll(known_signature)) } => legs,
            };

            metrics().broadcast_attempts.inc();
            match sent {
                Ok(signature) => self.record_signature(signature, attempt, emitter),
                Err(error) => {
                    self.record_transient(attempt, SubmissionOperation::Broadcast, error, emitter)
                }
            }

            match polled {
                PollOutcome::Skipped => {}
                PollOutcome::NotFound => {
                    debug!(attempt, "Signature not found yet, continuing");
                }
                PollOutcome::Status(status) => {
                    if let Some(err) = &status.error {
                        return Err(self.on_chain_failure(err));
                    }
                    self.status = Some(status);
                }
                PollOutcome::Failed(error) => {
                    self.record_transient(attempt, SubmissionOperation::StatusPoll, error, emitter)
                }
            }

            if let Some((signature, status)) = self.landed() {
                self.finish_landed(signature, status, emitter);
                return Ok(signature);
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(self.cancelled()),
                    _ = tokio::time::sleep(self.settings.retry_interval) => {}
                }
            }
        }

        metrics().submissions_timed_out.inc();
        self.logger
            .log_timeout(self.signature.as_ref(), max_attempts);
        Err(TransactionBuilderError::Timeout {
            signature: self.signature,
            attempts: max_attempts,
        })
    }

    async fn broadcast(&self) -> Result<Signature, RpcManagerError> {
        self.rpc
            .send_raw_transaction(self.signed.wire_bytes(), &self.settings.send)
            .await
    }

    async fn poll(&self, signature: Option<Signature>) -> PollOutcome {
        let Some(signature) = signature else {
            return PollOutcome::Skipped;
        };

        match self.rpc.signature_status(&signature).await {
            Ok(Some(status)) => PollOutcome::Status(status),
            Ok(None) => PollOutcome::NotFound,
            Err(error) => PollOutcome::Failed(error),
        }
    }

    fn record_signature(&mut self, signature: Signature, attempt: u32, emitter: &mut StateEmitter<'_>) {
        match self.signature {
            None => {
                self.signature = Some(signature);
                self.first_sent_at = Some(Instant::now());
                self.logger.log_sent(&signature, attempt);
                emitter.emit(SubmissionState::Sent { signature });
            }
            Some(known) if known != signature => {
                // Identical bytes must hash to the same signature; keep the first
                warn!(known = %known, returned = %signature, "Node returned a different signature");
            }
            Some(_) => {}
        }
    }

    fn record_transient(
        &mut self,
        attempt: u32,
        operation: SubmissionOperation,
        error: RpcManagerError,
        emitter: &StateEmitter<'_>,
    ) {
        self.transient_failures += 1;
        metrics()
            .transient_failures
            .with_label_values(&[operation.as_str()])
            .inc();
        self.logger.log_transient_failure(attempt, operation, &error);
        emitter.transient_failure(&TransientFailure {
            attempt,
            operation,
            error,
        });
    }

    fn landed(&self) -> Option<(Signature, ConfirmationStatus)> {
        let signature = self.signature?;
        let status = self.status.clone().filter(ConfirmationStatus::is_landed)?;
        Some((signature, status))
    }

    fn on_chain_failure(&self, err: &solana_sdk::transaction::TransactionError) -> TransactionBuilderError {
        metrics().submissions_failed.inc();
        let payload = serde_json::to_string(err).unwrap_or_else(|_| format!("{:?}", err));
        // Poll only runs with a known signature
        let signature = self.signature.unwrap_or_else(|| self.signed.expected_signature());
        self.logger.log_on_chain_failure(&signature, &payload);
        TransactionBuilderError::OnChain { signature, payload }
    }

    fn cancelled(&self) -> TransactionBuilderError {
        self.logger.log_cancelled(self.signature.as_ref());
        TransactionBuilderError::Cancelled {
            signature: self.signature,
        }
    }

    /// Emit the confirmed state and record landing metrics
    fn finish_landed(
        &self,
        signature: Signature,
        status: ConfirmationStatus,
        emitter: &mut StateEmitter<'_>,
    ) {
        let latency = self
            .first_sent_at
            .map(|t| t.elapsed())
            .unwrap_or_default();

        let m = metrics();
        m.submissions_landed.inc();
        m.landing_latency.observe(latency.as_secs_f64());
        self.logger
            .log_landed(&signature, &status, latency.as_millis() as u64);
        emitter.emit(SubmissionState::Confirmed { signature, status });
    }
}
