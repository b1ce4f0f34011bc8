//! Lander - Solana transaction landing library
//!
//! Budgets, signs and lands transactions on a Solana-compatible network:
//! - **tx_builder**: compute budget estimation, instruction rewriting, signing
//! - **submission**: rebroadcast and confirmation polling
//! - **lander**: the end-to-end `sign_and_send` pipeline
//! - **rpc_manager**: the JSON-RPC seam every network call goes through

pub mod compat;
pub mod config;
pub mod lander;
pub mod metrics;
pub mod observability;
pub mod structured_logging;
pub mod submission;
pub mod test_utils;
pub mod types;
pub mod wallet;

// Component modules with non-standard paths (directories with spaces)
#[path = "rpc manager/mod.rs"]
pub mod rpc_manager;

pub mod tx_builder;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use lander::TransactionLander;
pub use submission::{NoopObserver, StateCallback, SubmissionObserver};
pub use tx_builder::{SignedTransaction, TransactionBuilderError};
pub use types::{
    ComputeBudget, ConfirmationLevel, ConfirmationStatus, SubmissionEvent, SubmissionState,
    TransactionSkeleton,
};

pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
