//! Compute budget estimation from live network signals
//!
//! - Compute units: simulate the unsigned transaction and add a safety margin
//!   (120% by default) for state drift between simulation and landing
//! - Priority fee: reduce recent per-slot prioritization fees with a
//!   [`FeePolicy`] and clamp into `[min_cu_price, max_cu_price]`
//!
//! The two estimates are independent round-trips and run concurrently.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::FeeConfig;
use crate::metrics::metrics;
use crate::rpc_manager::SubmissionRpc;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::simulate::build_simulation_transaction;
use crate::types::{ComputeBudget, PriorityFeeSample, TransactionSkeleton};

/// 10k micro-lamports per CU: about 0.03 cents at 150k CUs and $250 SOL
pub const MIN_CU_PRICE: u64 = 10_000;
/// 10M micro-lamports per CU: about $0.38 at 150k CUs and $250 SOL
pub const MAX_CU_PRICE: u64 = 10_000_000;
/// Simulated units are scaled by this percentage
pub const DEFAULT_COMPUTE_UNIT_MARGIN_PCT: u64 = 120;

/// How recent fee samples are reduced to a single price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeePolicy {
    /// Largest sample seen
    #[default]
    Max,
    /// Middle sample; mean of the two middle samples for even counts
    Median,
}

/// Scale simulated units by `margin_pct`, rounding half up
///
/// `scale_compute_units(100_000, 120) == 120_000`
pub fn scale_compute_units(units: u64, margin_pct: u64) -> u32 {
    let scaled = (units as u128 * margin_pct as u128 + 50) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Reduce fee samples to a price and clamp it
///
/// Clamping is `min(max(fee, min_price), max_price)`, so an inverted range
/// resolves to `max_price` instead of panicking.
pub fn select_priority_fee(
    samples: &[PriorityFeeSample],
    policy: FeePolicy,
    min_price: u64,
    max_price: u64,
) -> Result<u64, TransactionBuilderError> {
    if samples.is_empty() {
        return Err(TransactionBuilderError::no_fee_samples());
    }

    let selected = match policy {
        FeePolicy::Max => samples.iter().map(|s| s.fee).max().unwrap_or_default(),
        FeePolicy::Median => {
            let mut fees: Vec<u64> = samples.iter().map(|s| s.fee).collect();
            fees.sort_unstable();
            let mid = fees.len() / 2;
            if fees.len() % 2 == 0 {
                // Average without overflow
                fees[mid - 1] / 2 + fees[mid] / 2 + (fees[mid - 1] % 2 + fees[mid] % 2) / 2
            } else {
                fees[mid]
            }
        }
    };

    Ok(selected.max(min_price).min(max_price))
}

/// Estimates a [`ComputeBudget`] over a shared RPC client
#[derive(Clone)]
pub struct BudgetEstimator {
    rpc: Arc<dyn SubmissionRpc>,
    config: FeeConfig,
}

impl BudgetEstimator {
    pub fn new(rpc: Arc<dyn SubmissionRpc>, config: FeeConfig) -> Self {
        Self { rpc, config }
    }

    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    /// Simulate the skeleton and scale the consumed units
    ///
    /// A simulation that reports no consumed units counts as zero.
    pub async fn estimate_compute_units(
        &self,
        skeleton: &TransactionSkeleton,
    ) -> Result<u32, TransactionBuilderError> {
        let sim_tx = build_simulation_transaction(skeleton);

        let consumed = self
            .rpc
            .simulate_compute_units(&sim_tx)
            .await
            .map_err(|e| TransactionBuilderError::estimation_failed(format!("simulation: {}", e)))?;

        let units = consumed.unwrap_or_else(|| {
            warn!("Simulation returned no consumed units, treating as 0");
            0
        });

        let estimated = scale_compute_units(units, self.config.compute_unit_margin_pct);
        debug!(
            simulated_cu = units,
            estimated_cu = estimated,
            margin_pct = self.config.compute_unit_margin_pct,
            "CU estimation from simulation"
        );
        Ok(estimated)
    }

    /// Sample recent prioritization fees and select a clamped price
    pub async fn estimate_priority_fee(&self) -> Result<u64, TransactionBuilderError> {
        let samples = self
            .rpc
            .recent_prioritization_fees()
            .await
            .map_err(|e| {
                TransactionBuilderError::estimation_failed(format!("prioritization fees: {}", e))
            })?;

        let fee = select_priority_fee(
            &samples,
            self.config.policy,
            self.config.min_cu_price,
            self.config.max_cu_price,
        )?;

        debug!(
            num_samples = samples.len(),
            policy = ?self.config.policy,
            priority_fee = fee,
            "Priority fee estimation"
        );
        Ok(fee)
    }

    /// Run both estimates concurrently
    pub async fn estimate(
        &self,
        skeleton: &TransactionSkeleton,
    ) -> Result<ComputeBudget, TransactionBuilderError> {
        let (micro_lamport_price, unit_limit) = tokio::try_join!(
            self.estimate_priority_fee(),
            self.estimate_compute_units(skeleton)
        )?;

        let m = metrics();
        m.priority_fee_micro_lamports
            .set(i64::try_from(micro_lamport_price).unwrap_or(i64::MAX));
        m.compute_unit_limit.set(i64::from(unit_limit));

        Ok(ComputeBudget {
            unit_limit,
            micro_lamport_price,
        })
    }
}
