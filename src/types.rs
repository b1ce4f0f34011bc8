//! Core data types shared by the builder, the RPC seam and the submission loop

use serde::{Deserialize, Serialize};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    transaction::TransactionError,
};
use std::fmt;

use crate::rpc_manager::RpcManagerError;

/// Unsigned transaction under construction
///
/// Instructions keep their insertion order. The skeleton is mutable until it
/// is handed to the signer; after that only the signed bytes travel on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSkeleton {
    pub instructions: Vec<Instruction>,
    pub fee_payer: Pubkey,
    pub recent_blockhash: Hash,
}

impl TransactionSkeleton {
    pub fn new(fee_payer: Pubkey, recent_blockhash: Hash) -> Self {
        Self {
            instructions: Vec::new(),
            fee_payer,
            recent_blockhash,
        }
    }

    /// Append an instruction, builder style
    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Compile into the canonical legacy message whose bytes get signed
    pub fn compile_message(&self) -> Message {
        Message::new_with_blockhash(
            &self.instructions,
            Some(&self.fee_payer),
            &self.recent_blockhash,
        )
    }
}

/// Compute budget derived for one submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeBudget {
    /// Compute unit ceiling (set-compute-unit-limit)
    pub unit_limit: u32,
    /// Price per compute unit in micro-lamports (set-compute-unit-price)
    pub micro_lamport_price: u64,
}

/// Prioritization fee observed for one recent slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityFeeSample {
    pub slot: u64,
    pub fee: u64,
}

/// Durability tier reported for a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationLevel {
    /// Seen by the node (processed) but not yet voted on by a supermajority
    Pending,
    Confirmed,
    Finalized,
}

impl ConfirmationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationLevel::Pending => "pending",
            ConfirmationLevel::Confirmed => "confirmed",
            ConfirmationLevel::Finalized => "finalized",
        }
    }
}

/// Status returned by a signature-status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationStatus {
    pub level: ConfirmationLevel,
    pub slot: u64,
    /// Definite on-chain execution failure
    pub error: Option<TransactionError>,
}

impl ConfirmationStatus {
    pub fn pending(slot: u64) -> Self {
        Self {
            level: ConfirmationLevel::Pending,
            slot,
            error: None,
        }
    }

    pub fn confirmed(slot: u64) -> Self {
        Self {
            level: ConfirmationLevel::Confirmed,
            slot,
            error: None,
        }
    }

    pub fn finalized(slot: u64) -> Self {
        Self {
            level: ConfirmationLevel::Finalized,
            slot,
            error: None,
        }
    }

    pub fn failed(slot: u64, error: TransactionError) -> Self {
        Self {
            level: ConfirmationLevel::Pending,
            slot,
            error: Some(error),
        }
    }

    /// Confirmed or finalized, without an execution error
    pub fn is_landed(&self) -> bool {
        self.error.is_none() && self.level >= ConfirmationLevel::Confirmed
    }
}

/// Lifecycle of one submission, reported to observers in this order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Created,
    Signed,
    Sent { signature: Signature },
    Confirmed {
        signature: Signature,
        status: ConfirmationStatus,
    },
}

impl SubmissionState {
    /// Position in the lifecycle; states only ever move to a higher rank
    pub fn rank(&self) -> u8 {
        match self {
            SubmissionState::Created => 0,
            SubmissionState::Signed => 1,
            SubmissionState::Sent { .. } => 2,
            SubmissionState::Confirmed { .. } => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Created => "created",
            SubmissionState::Signed => "signed",
            SubmissionState::Sent { .. } => "sent",
            SubmissionState::Confirmed { .. } => "confirmed",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionState::Sent { signature } => write!(f, "sent({signature})"),
            SubmissionState::Confirmed { signature, status } => {
                write!(f, "confirmed({signature}, {})", status.level.as_str())
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Which leg of a retry iteration failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOperation {
    Broadcast,
    StatusPoll,
}

impl SubmissionOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionOperation::Broadcast => "broadcast",
            SubmissionOperation::StatusPoll => "status_poll",
        }
    }
}

/// A swallowed round-trip failure inside the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientFailure {
    /// 1-based retry iteration
    pub attempt: u32,
    pub operation: SubmissionOperation,
    pub error: RpcManagerError,
}

/// Everything an observer can be told about a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    State(SubmissionState),
    TransientFailure(TransientFailure),
}
