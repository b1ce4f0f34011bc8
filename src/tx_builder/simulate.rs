//! Simulation transaction construction
//!
//! Simulation runs against the unsigned message: signature verification is
//! disabled on the node and the blockhash is replaced there, so default
//! signatures are enough to carry the message.

use solana_sdk::transaction::Transaction;

use crate::types::TransactionSkeleton;

/// Build an unsigned transaction carrying the skeleton's message
pub fn build_simulation_transaction(skeleton: &TransactionSkeleton) -> Transaction {
    Transaction::new_unsigned(skeleton.compile_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        instruction::{AccountMeta, Instruction},
        pubkey::Pubkey,
        signature::Signature,
    };

    #[test]
    fn test_simulation_transaction_has_placeholder_signatures() {
        let payer = Pubkey::new_unique();
        let cosigner = Pubkey::new_unique();
        let skeleton = TransactionSkeleton::new(payer, Hash::new_unique()).with_instruction(
            Instruction::new_with_bytes(
                Pubkey::new_unique(),
                &[9],
                vec![AccountMeta::new(cosigner, true)],
            ),
        );

        let tx = build_simulation_transaction(&skeleton);

        assert_eq!(tx.signatures.len(), 2);
        assert!(tx.signatures.iter().all(|s| *s == Signature::default()));
        assert_eq!(tx.message, skeleton.compile_message());
    }
}
