//! Compatibility helpers for legacy `Message` layouts
//!
//! The message header splits `account_keys` into four ranges:
//!
//! ```text
//! [ writable signers | readonly signers | writable non-signers | readonly non-signers ]
//! ```
//!
//! These helpers read signer / writable flags from that layout and rebuild
//! the instruction list a message was compiled from, so a pre-built message
//! can be turned back into a [`TransactionSkeleton`].

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
};

use crate::tx_builder::TransactionBuilderError;
use crate::types::TransactionSkeleton;

/// Accounts whose signatures the message requires, in slot order
#[inline]
#[must_use]
pub fn required_signers(message: &Message) -> &[Pubkey] {
    let n = usize::from(message.header.num_required_signatures).min(message.account_keys.len());
    &message.account_keys[..n]
}

#[inline]
#[must_use]
pub fn is_signer_index(message: &Message, index: usize) -> bool {
    index < usize::from(message.header.num_required_signatures)
}

/// Writable according to the header ranges alone
#[must_use]
pub fn is_writable_index(message: &Message, index: usize) -> bool {
    let header = &message.header;
    let num_signed = usize::from(header.num_required_signatures);
    let num_keys = message.account_keys.len();

    if index < num_signed {
        index < num_signed.saturating_sub(usize::from(header.num_readonly_signed_accounts))
    } else {
        index < num_keys.saturating_sub(usize::from(header.num_readonly_unsigned_accounts))
    }
}

/// Rebuild the instructions a message was compiled from
pub fn decompile_instructions(message: &Message) -> Result<Vec<Instruction>, TransactionBuilderError> {
    let key_at = |index: u8| -> Result<Pubkey, TransactionBuilderError> {
        message
            .account_keys
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| {
                TransactionBuilderError::Configuration(format!(
                    "account index {} out of range ({} keys)",
                    index,
                    message.account_keys.len()
                ))
            })
    };

    message
        .instructions
        .iter()
        .map(|compiled| {
            let program_id = key_at(compiled.program_id_index)?;
            let accounts = compiled
                .accounts
                .iter()
                .map(|&index| {
                    let pubkey = key_at(index)?;
                    let i = usize::from(index);
                    Ok(AccountMeta {
                        pubkey,
                        is_signer: is_signer_index(message, i),
                        is_writable: is_writable_index(message, i),
                    })
                })
                .collect::<Result<Vec<_>, TransactionBuilderError>>()?;

            Ok(Instruction {
                program_id,
                accounts,
                data: compiled.data.clone(),
            })
        })
        .collect()
}

/// Turn a compiled legacy message back into a skeleton
///
/// The fee payer is the first account key.
pub fn skeleton_from_message(message: &Message) -> Result<TransactionSkeleton, TransactionBuilderError> {
    let fee_payer = *message.account_keys.first().ok_or_else(|| {
        TransactionBuilderError::Configuration("message has no account keys".to_string())
    })?;

    Ok(TransactionSkeleton {
        instructions: decompile_instructions(message)?,
        fee_payer,
        recent_blockhash: message.recent_blockhash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;

    fn sample_skeleton() -> TransactionSkeleton {
        let program_id = Pubkey::new_unique();
        TransactionSkeleton::new(Pubkey::new_unique(), Hash::new_unique())
            .with_instruction(Instruction::new_with_bytes(
                program_id,
                &[3, 0, 0, 0],
                vec![
                    AccountMeta::new(Pubkey::new_unique(), false),
                    AccountMeta::new_readonly(Pubkey::new_unique(), false),
                    AccountMeta::new_readonly(Pubkey::new_unique(), true),
                ],
            ))
            .with_instruction(Instruction::new_with_bytes(
                program_id,
                &[7],
                vec![AccountMeta::new(Pubkey::new_unique(), true)],
            ))
    }

    #[test]
    fn test_required_signers_start_with_fee_payer() {
        let skeleton = sample_skeleton();
        let message = skeleton.compile_message();

        let signers = required_signers(&message);
        assert_eq!(signers.len(), 3);
        assert_eq!(signers[0], skeleton.fee_payer);
    }

    #[test]
    fn test_skeleton_survives_compile_cycle() {
        let skeleton = sample_skeleton();
        let message = skeleton.compile_message();

        let rebuilt = skeleton_from_message(&message).expect("decompile");

        assert_eq!(rebuilt.fee_payer, skeleton.fee_payer);
        assert_eq!(rebuilt.recent_blockhash, skeleton.recent_blockhash);
        assert_eq!(rebuilt.compile_message(), message);
        assert_eq!(rebuilt.instructions, skeleton.instructions);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let mut message = sample_skeleton().compile_message();
        message.instructions[0].accounts.push(200);

        assert!(decompile_instructions(&message).is_err());
    }
}
