//! Compute-budget instruction rewriting
//!
//! Any compute-budget instructions already present in a skeleton are removed
//! and exactly two fresh ones are prepended:
//! 1. set_compute_unit_limit
//! 2. set_compute_unit_price
//! 3. The caller's program instructions, in their original order
//!
//! Strip-then-inject is idempotent: the strip step always removes what a
//! previous inject added.

use crate::tx_builder::errors::TransactionBuilderError;
use crate::types::{ComputeBudget, TransactionSkeleton};
use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

/// Discriminant of `ComputeBudgetInstruction::SetComputeUnitLimit`
const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;
/// Discriminant of `ComputeBudgetInstruction::SetComputeUnitPrice`
const SET_COMPUTE_UNIT_PRICE_TAG: u8 = 3;

/// Whether an instruction targets the compute-budget program
#[inline]
pub fn is_budget_instruction(ix: &Instruction) -> bool {
    ix.program_id == solana_sdk::compute_budget::id()
}

/// Remove every compute-budget instruction, keeping everything else in order
pub fn strip_budget_instructions(mut skeleton: TransactionSkeleton) -> TransactionSkeleton {
    skeleton.instructions.retain(|ix| !is_budget_instruction(ix));
    skeleton
}

/// The two instructions that carry a [`ComputeBudget`]
pub fn budget_instructions(budget: &ComputeBudget) -> [Instruction; 2] {
    [
        ComputeBudgetInstruction::set_compute_unit_limit(budget.unit_limit),
        ComputeBudgetInstruction::set_compute_unit_price(budget.micro_lamport_price),
    ]
}

/// Prepend set-compute-unit-limit and set-compute-unit-price
///
/// Does not strip; callers that may hold budget instructions already should
/// go through [`apply_compute_budget`].
pub fn inject_budget_instructions(
    mut skeleton: TransactionSkeleton,
    budget: &ComputeBudget,
) -> TransactionSkeleton {
    let mut instructions = Vec::with_capacity(skeleton.instructions.len() + 2);
    instructions.extend(budget_instructions(budget));
    instructions.append(&mut skeleton.instructions);
    skeleton.instructions = instructions;
    skeleton
}

/// Strip then inject
pub fn apply_compute_budget(
    skeleton: TransactionSkeleton,
    budget: &ComputeBudget,
) -> TransactionSkeleton {
    inject_budget_instructions(strip_budget_instructions(skeleton), budget)
}

/// Validate the budget layout of a rewritten instruction list (debug/test only)
///
/// Expected layout:
/// 1. set_compute_unit_limit
/// 2. set_compute_unit_price
/// 3. No further compute-budget instructions
#[cfg(debug_assertions)]
pub fn sanity_check_budget_layout(instructions: &[Instruction]) -> Result<(), TransactionBuilderError> {
    let tag_at = |idx: usize| -> Option<u8> {
        instructions
            .get(idx)
            .filter(|ix| is_budget_instruction(ix))
            .and_then(|ix| ix.data.first().copied())
    };

    if tag_at(0) != Some(SET_COMPUTE_UNIT_LIMIT_TAG) {
        return Err(TransactionBuilderError::invalid_order(
            "first instruction must be set_compute_unit_limit",
        ));
    }
    if tag_at(1) != Some(SET_COMPUTE_UNIT_PRICE_TAG) {
        return Err(TransactionBuilderError::invalid_order(
            "second instruction must be set_compute_unit_price",
        ));
    }

    if let Some(idx) = instructions
        .iter()
        .skip(2)
        .position(is_budget_instruction)
    {
        return Err(TransactionBuilderError::invalid_order(format!(
            "unexpected compute budget instruction at position {}",
            idx + 2
        )));
    }

    Ok(())
}

/// No-op version of sanity_check_budget_layout for release builds
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_budget_layout(_instructions: &[Instruction]) -> Result<(), TransactionBuilderError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, instruction::AccountMeta, pubkey::Pubkey};

    fn program_ix(tag: u8) -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[tag],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        )
    }

    fn skeleton_with(instructions: Vec<Instruction>) -> TransactionSkeleton {
        TransactionSkeleton {
            instructions,
            fee_payer: Pubkey::new_unique(),
            recent_blockhash: Hash::new_unique(),
        }
    }

    const BUDGET: ComputeBudget = ComputeBudget {
        unit_limit: 120_000,
        micro_lamport_price: 50_000,
    };

    #[test]
    fn test_strip_preserves_order_payer_and_blockhash() {
        let a = program_ix(1);
        let b = program_ix(2);
        let skeleton = skeleton_with(vec![
            ComputeBudgetInstruction::set_compute_unit_price(5),
            a.clone(),
            ComputeBudgetInstruction::set_compute_unit_limit(7),
            b.clone(),
            ComputeBudgetInstruction::request_heap_frame(64 * 1024),
        ]);
        let payer = skeleton.fee_payer;
        let blockhash = skeleton.recent_blockhash;

        let stripped = strip_budget_instructions(skeleton);

        assert_eq!(stripped.instructions, vec![a, b]);
        assert_eq!(stripped.fee_payer, payer);
        assert_eq!(stripped.recent_blockhash, blockhash);
    }

    #[test]
    fn test_inject_prepends_limit_then_price() {
        let a = program_ix(1);
        let rewritten = inject_budget_instructions(skeleton_with(vec![a.clone()]), &BUDGET);

        assert_eq!(rewritten.instructions.len(), 3);
        assert_eq!(
            rewritten.instructions[0],
            ComputeBudgetInstruction::set_compute_unit_limit(120_000)
        );
        assert_eq!(
            rewritten.instructions[1],
            ComputeBudgetInstruction::set_compute_unit_price(50_000)
        );
        assert_eq!(rewritten.instructions[2], a);
        assert!(sanity_check_budget_layout(&rewritten.instructions).is_ok());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let skeleton = skeleton_with(vec![
            program_ix(1),
            ComputeBudgetInstruction::set_compute_unit_limit(1),
            program_ix(2),
        ]);

        let once = apply_compute_budget(skeleton.clone(), &BUDGET);
        let twice = apply_compute_budget(once.clone(), &BUDGET);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_on_empty_skeleton() {
        let rewritten = apply_compute_budget(skeleton_with(vec![]), &BUDGET);
        assert_eq!(rewritten.instructions.len(), 2);
        assert!(rewritten.instructions.iter().all(is_budget_instruction));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_rejects_missing_budget() {
        let result = sanity_check_budget_layout(&[program_ix(1)]);
        if let Err(TransactionBuilderError::InvalidInstructionOrder(msg)) = result {
            assert!(msg.contains("set_compute_unit_limit"));
        } else {
            panic!("Expected InvalidInstructionOrder error");
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_rejects_swapped_order() {
        let instructions = vec![
            ComputeBudgetInstruction::set_compute_unit_price(1),
            ComputeBudgetInstruction::set_compute_unit_limit(1),
            program_ix(1),
        ];
        assert!(sanity_check_budget_layout(&instructions).is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_rejects_trailing_budget() {
        let mut instructions = budget_instructions(&BUDGET).to_vec();
        instructions.push(program_ix(1));
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(9));

        match sanity_check_budget_layout(&instructions) {
            Err(TransactionBuilderError::InvalidInstructionOrder(msg)) => {
                assert!(msg.contains("position 3"))
            }
            other => panic!("Expected InvalidInstructionOrder error, got {other:?}"),
        }
    }
}
