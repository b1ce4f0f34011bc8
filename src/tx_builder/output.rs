//! Signed transaction output
//!
//! [`SignedTransaction`] is produced once by the signer and never mutated.
//! The serialized wire bytes are computed at construction and shared
//! (`bytes::Bytes`) by every rebroadcast, so retries are byte-identical.

use bytes::Bytes;
use solana_sdk::{signature::Signature, transaction::Transaction};

use crate::tx_builder::errors::TransactionBuilderError;

#[derive(Debug, Clone)]
pub struct SignedTransaction {
    transaction: Transaction,
    wire: Bytes,
}

impl SignedTransaction {
    /// Freeze a fully signed transaction
    pub(crate) fn from_signed(transaction: Transaction) -> Result<Self, TransactionBuilderError> {
        let wire = bincode::serialize(&transaction).map_err(|e| {
            TransactionBuilderError::internal(format!("failed to serialize transaction: {}", e))
        })?;

        Ok(Self {
            transaction,
            wire: Bytes::from(wire),
        })
    }

    /// Serialized transaction exactly as broadcast
    pub fn wire_bytes(&self) -> &Bytes {
        &self.wire
    }

    /// Fee payer signature, the identifier the network assigns
    pub fn expected_signature(&self) -> Signature {
        self.transaction
            .signatures
            .first()
            .copied()
            .unwrap_or_default()
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }
}

impl PartialEq for SignedTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.wire == other.wire
    }
}

impl Eq for SignedTransaction {}
