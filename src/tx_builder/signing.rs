//! Detached signing over the canonical message bytes
//!
//! Every key signs the same serialized message and its signature goes into
//! the slot of its pubkey among the required signers. Keys that are not
//! required signers, and required signers nobody signed for, are structural
//! errors.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Signature, Signer},
    transaction::Transaction,
};
use tracing::debug;

use crate::compat;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::output::SignedTransaction;
use crate::types::TransactionSkeleton;

/// Sign `skeleton` with `signers`, in order
pub fn sign_skeleton(
    skeleton: &TransactionSkeleton,
    signers: &[&dyn Signer],
) -> Result<SignedTransaction, TransactionBuilderError> {
    let message = skeleton.compile_message();
    let message_bytes = message.serialize();
    let required: Vec<Pubkey> = compat::required_signers(&message).to_vec();

    let mut signatures = vec![Signature::default(); required.len()];

    for signer in signers {
        let pubkey = signer
            .try_pubkey()
            .map_err(|e| TransactionBuilderError::signing_failed(e.to_string()))?;

        let slot = required.iter().position(|k| *k == pubkey).ok_or_else(|| {
            TransactionBuilderError::signing_failed(format!(
                "{} is not a required signer of this transaction",
                pubkey
            ))
        })?;

        let signature = signer
            .try_sign_message(&message_bytes)
            .map_err(|e| TransactionBuilderError::signing_failed(format!("{}: {}", pubkey, e)))?;

        signatures[slot] = signature;
        debug!(signer = %pubkey, slot, "Applied signature");
    }

    if let Some(idx) = signatures.iter().position(|s| *s == Signature::default()) {
        return Err(TransactionBuilderError::signing_failed(format!(
            "missing signature for required signer {}",
            required[idx]
        )));
    }

    SignedTransaction::from_signed(Transaction {
        signatures,
        message,
    })
}
