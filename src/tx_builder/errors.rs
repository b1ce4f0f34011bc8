//! Error types for the transaction builder and the submission loop
//!
//! The taxonomy follows the lifecycle of one submission:
//! - Estimation and blockhash failures happen before anything is broadcast
//! - Signing failures are structural and never retried
//! - On-chain failures, timeouts and cancellation end the retry loop

use crate::rpc_manager::RpcManagerError;
use solana_sdk::signature::Signature;
use thiserror::Error;

fn signature_or_none(signature: &Option<Signature>) -> String {
    signature
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Comprehensive error type for building, signing and landing a transaction
#[derive(Error, Debug)]
pub enum TransactionBuilderError {
    /// Budget estimation failed before any broadcast
    ///
    /// This includes:
    /// - Empty prioritization fee sample set
    /// - Simulation endpoint unreachable
    #[error("Estimation failed: {0}")]
    Estimation(String),

    /// Failed to sign the transaction
    ///
    /// A signing key that is not a required signer of the message, or a
    /// required signer left without a signature
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Failed to fetch a recent blockhash
    #[error("Blockhash error: {0}")]
    Blockhash(String),

    /// Instruction list does not have the expected budget layout
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    /// Configuration or validation error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// RPC client error outside the retry loop
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcManagerError),

    /// The network reported a definite execution failure
    ///
    /// `payload` is the JSON rendering of the on-chain error
    #[error("Transaction {signature} failed: {payload}")]
    OnChain {
        signature: Signature,
        payload: String,
    },

    /// Retry budget exhausted without observing confirmation
    ///
    /// The transaction may still land after this is returned; the loop only
    /// stopped watching it.
    #[error("Transaction not confirmed after {attempts} attempts (signature: {})", signature_or_none(.signature))]
    Timeout {
        signature: Option<Signature>,
        attempts: u32,
    },

    /// The caller cancelled the submission
    #[error("Submission cancelled (signature: {})", signature_or_none(.signature))]
    Cancelled { signature: Option<Signature> },

    /// Internal invariant violation or unexpected state
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransactionBuilderError {
    /// Check if this error is potentially retryable by the caller
    ///
    /// Returns `true` if starting a fresh submission might succeed,
    /// `false` if the error is fatal or the outcome is still unknown
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Estimation(_) => true,
            Self::Blockhash(_) => true,
            Self::Rpc(err) => err.is_retryable(),

            Self::Signing(_) => false,
            Self::InvalidInstructionOrder(_) => false,
            Self::Configuration(_) => false,
            Self::OnChain { .. } => false,
            // May still land; resubmitting could double-execute
            Self::Timeout { .. } => false,
            Self::Cancelled { .. } => false,
            Self::Internal(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Estimation(_) => "estimation",
            Self::Signing(_) => "signing",
            Self::Blockhash(_) => "blockhash",
            Self::InvalidInstructionOrder(_) => "validation",
            Self::Configuration(_) => "config",
            Self::Rpc(_) => "rpc",
            Self::OnChain { .. } => "on_chain",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::Internal(_) => "internal",
        }
    }

    /// Signature the error refers to, if one was assigned
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::OnChain { signature, .. } => Some(*signature),
            Self::Timeout { signature, .. } | Self::Cancelled { signature } => *signature,
            _ => None,
        }
    }
}

// Convenience constructors for common error scenarios
impl TransactionBuilderError {
    /// No prioritization fee samples were returned
    pub fn no_fee_samples() -> Self {
        Self::Estimation("no recent prioritization fee samples".to_string())
    }

    pub fn estimation_failed(reason: impl Into<String>) -> Self {
        Self::Estimation(reason.into())
    }

    pub fn signing_failed(reason: impl Into<String>) -> Self {
        Self::Signing(reason.into())
    }

    pub fn blockhash_unavailable(reason: impl Into<String>) -> Self {
        Self::Blockhash(reason.into())
    }

    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransactionBuilderError::no_fee_samples();
        assert_eq!(
            err.to_string(),
            "Estimation failed: no recent prioritization fee samples"
        );

        let err = TransactionBuilderError::Timeout {
            signature: None,
            attempts: 30,
        };
        assert_eq!(
            err.to_string(),
            "Transaction not confirmed after 30 attempts (signature: none)"
        );

        let signature = Signature::from([7u8; 64]);
        let err = TransactionBuilderError::OnChain {
            signature,
            payload: "\"AccountInUse\"".to_string(),
        };
        assert!(err.to_string().contains(&signature.to_string()));
        assert!(err.to_string().contains("AccountInUse"));
    }

    #[test]
    fn test_error_retryability() {
        assert!(TransactionBuilderError::no_fee_samples().is_retryable());
        assert!(TransactionBuilderError::blockhash_unavailable("x").is_retryable());

        assert!(!TransactionBuilderError::signing_failed("x").is_retryable());
        assert!(!TransactionBuilderError::Timeout {
            signature: None,
            attempts: 1
        }
        .is_retryable());
        assert!(!TransactionBuilderError::OnChain {
            signature: Signature::default(),
            payload: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_error_categories_and_signature() {
        let signature = Signature::from([3u8; 64]);
        let err = TransactionBuilderError::Cancelled {
            signature: Some(signature),
        };
        assert_eq!(err.category(), "cancelled");
        assert_eq!(err.signature(), Some(signature));

        let err: TransactionBuilderError =
            RpcManagerError::Configuration("bad url".to_string()).into();
        assert_eq!(err.category(), "rpc");
        assert_eq!(err.signature(), None);
    }
}
