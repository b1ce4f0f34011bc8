//! Transaction builder
//!
//! Turns an unsigned [`TransactionSkeleton`](crate::types::TransactionSkeleton)
//! into immutable, signed wire bytes:
//! - **errors**: error taxonomy shared with the submission loop
//! - **instructions**: compute-budget strip/inject rewriting
//! - **simulate**: unsigned simulation transaction
//! - **budget**: compute unit and priority fee estimation
//! - **signing**: detached signing into required signer slots
//! - **output**: frozen signed transaction and its wire bytes
//! - **builder**: blockhash refresh and the prepare/sign pipeline
//!
//! ## Instruction layout
//!
//! ```text
//! [0] set_compute_unit_limit
//! [1] set_compute_unit_price
//! [2..] caller instructions, original order
//! ```

pub mod budget;
pub mod builder;
pub mod errors;
pub mod instructions;
pub mod output;
pub mod signing;
pub mod simulate;

pub use budget::{
    scale_compute_units, select_priority_fee, BudgetEstimator, FeePolicy,
    DEFAULT_COMPUTE_UNIT_MARGIN_PCT, MAX_CU_PRICE, MIN_CU_PRICE,
};
pub use builder::{PreparedTransaction, TxBuilder};
pub use errors::TransactionBuilderError;
pub use instructions::{
    apply_compute_budget, budget_instructions, inject_budget_instructions, is_budget_instruction,
    sanity_check_budget_layout, strip_budget_instructions,
};
pub use output::SignedTransaction;
pub use signing::sign_skeleton;
pub use simulate::build_simulation_transaction;
