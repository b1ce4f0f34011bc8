//! End-to-end landing: budget, sign, broadcast, confirm
//!
//! [`TransactionLander::sign_and_send`] is the single entry point callers use.
//! Observers see `created` once the budget is in place, `signed` once every
//! slot is filled, `sent` on the first accepted broadcast and `confirmed` when
//! the network reports confirmed or finalized.

use solana_sdk::signature::{Signature, Signer};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::Config;
use crate::metrics::metrics;
use crate::observability::TraceContext;
use crate::rpc_manager::{SolanaRpcClient, SubmissionRpc};
use crate::structured_logging::SubmissionLogger;
use crate::submission::{
    NoopObserver, StateEmitter, SubmissionLoop, SubmissionObserver, SubmissionSettings,
};
use crate::tx_builder::{SignedTransaction, TransactionBuilderError, TxBuilder};
use crate::types::{SubmissionState, TransactionSkeleton};

/// Lands transactions through one shared RPC client
///
/// Cheap to share; every call to [`sign_and_send`](Self::sign_and_send) owns
/// its own loop state, so concurrent submissions do not interfere.
#[derive(Clone)]
pub struct TransactionLander {
    rpc: Arc<dyn SubmissionRpc>,
    builder: TxBuilder,
    settings: SubmissionSettings,
}

impl TransactionLander {
    pub fn new(rpc: Arc<dyn SubmissionRpc>, config: &Config) -> Self {
        let builder = TxBuilder::new(rpc.clone(), config.fees.clone(), config.blockhash.clone());
        Self::from_parts(rpc, builder, SubmissionSettings::from(&config.submission))
    }

    pub fn from_parts(
        rpc: Arc<dyn SubmissionRpc>,
        builder: TxBuilder,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            rpc,
            builder,
            settings,
        }
    }

    /// Connect to the endpoint named in `config.rpc`
    pub fn connect(config: &Config) -> Result<Self, TransactionBuilderError> {
        let client = SolanaRpcClient::new(
            &config.rpc.url,
            Duration::from_secs(config.rpc.timeout_secs),
        )?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn builder(&self) -> &TxBuilder {
        &self.builder
    }

    pub fn settings(&self) -> &SubmissionSettings {
        &self.settings
    }

    /// Budget, sign and land `skeleton`
    pub async fn sign_and_send(
        &self,
        skeleton: TransactionSkeleton,
        signers: &[&dyn Signer],
        observer: Option<&dyn SubmissionObserver>,
    ) -> Result<Signature, TransactionBuilderError> {
        self.sign_and_send_with_cancel(skeleton, signers, observer, &CancellationToken::new())
            .await
    }

    /// Like [`sign_and_send`](Self::sign_and_send), stopping early once
    /// `cancel` fires
    pub async fn sign_and_send_with_cancel(
        &self,
        skeleton: TransactionSkeleton,
        signers: &[&dyn Signer],
        observer: Option<&dyn SubmissionObserver>,
        cancel: &CancellationToken,
    ) -> Result<Signature, TransactionBuilderError> {
        let trace = TraceContext::new("sign_and_send");
        let logger = SubmissionLogger::new(trace.correlation_id().as_str());
        let observer = observer.unwrap_or(&NoopObserver);

        metrics().submissions_total.inc();

        async move {
            let mut emitter = StateEmitter::new(observer);

            let prepared = self.builder.prepare(skeleton).await?;
            logger.log_budget(&prepared.budget, prepared.skeleton.instructions.len());
            emitter.emit(SubmissionState::Created);

            let signed = self.builder.sign(&prepared, signers)?;
            emitter.emit(SubmissionState::Signed);

            SubmissionLoop::new(self.rpc.clone(), signed, self.settings.clone(), logger)
                .run(&mut emitter, cancel)
                .await
        }
        .instrument(trace.span())
        .await
    }

    /// Land an already signed transaction
    ///
    /// Observers see `sent` and `confirmed` only.
    pub async fn send_signed(
        &self,
        signed: SignedTransaction,
        observer: Option<&dyn SubmissionObserver>,
        cancel: &CancellationToken,
    ) -> Result<Signature, TransactionBuilderError> {
        let trace = TraceContext::new("send_signed");
        let logger = SubmissionLogger::new(trace.correlation_id().as_str());
        let mut emitter = StateEmitter::new(observer.unwrap_or(&NoopObserver));

        metrics().submissions_total.inc();

        SubmissionLoop::new(self.rpc.clone(), signed, self.settings.clone(), logger)
            .run(&mut emitter, cancel)
            .instrument(trace.span())
            .await
    }
}
