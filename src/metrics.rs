//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub submissions_total: IntCounter,
    pub submissions_landed: IntCounter,
    pub submissions_failed: IntCounter,
    pub submissions_timed_out: IntCounter,
    pub broadcast_attempts: IntCounter,
    /// Swallowed round-trip failures, labelled by operation
    pub transient_failures: IntCounterVec,

    // Gauges
    pub priority_fee_micro_lamports: IntGauge,
    pub compute_unit_limit: IntGauge,
    pub active_submissions: IntGauge,

    // Histograms
    pub landing_latency: Histogram,
    pub rpc_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let submissions_total = IntCounter::with_opts(Opts::new(
            "submissions_total",
            "Total number of submissions started",
        ))?;

        let submissions_landed = IntCounter::with_opts(Opts::new(
            "submissions_landed",
            "Submissions confirmed or finalized",
        ))?;

        let submissions_failed = IntCounter::with_opts(Opts::new(
            "submissions_failed",
            "Submissions that failed on-chain",
        ))?;

        let submissions_timed_out = IntCounter::with_opts(Opts::new(
            "submissions_timed_out",
            "Submissions that exhausted the retry budget",
        ))?;

        let broadcast_attempts = IntCounter::with_opts(Opts::new(
            "broadcast_attempts",
            "Raw transaction broadcasts issued",
        ))?;

        let transient_failures = IntCounterVec::new(
            Opts::new(
                "transient_failures",
                "Swallowed broadcast / status poll failures",
            ),
            &["operation"],
        )?;

        let priority_fee_micro_lamports = IntGauge::with_opts(Opts::new(
            "priority_fee_micro_lamports",
            "Last estimated compute unit price",
        ))?;

        let compute_unit_limit = IntGauge::with_opts(Opts::new(
            "compute_unit_limit",
            "Last estimated compute unit limit",
        ))?;

        let active_submissions = IntGauge::with_opts(Opts::new(
            "active_submissions",
            "Submissions currently in the retry loop",
        ))?;

        let landing_latency = Histogram::with_opts(
            HistogramOpts::new(
                "landing_latency_seconds",
                "Time from first broadcast to confirmation",
            )
            .buckets(vec![0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]),
        )?;

        let rpc_latency = Histogram::with_opts(
            HistogramOpts::new("rpc_latency_seconds", "RPC call latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(submissions_landed.clone()))?;
        registry.register(Box::new(submissions_failed.clone()))?;
        registry.register(Box::new(submissions_timed_out.clone()))?;
        registry.register(Box::new(broadcast_attempts.clone()))?;
        registry.register(Box::new(transient_failures.clone()))?;
        registry.register(Box::new(priority_fee_micro_lamports.clone()))?;
        registry.register(Box::new(compute_unit_limit.clone()))?;
        registry.register(Box::new(active_submissions.clone()))?;
        registry.register(Box::new(landing_latency.clone()))?;
        registry.register(Box::new(rpc_latency.clone()))?;

        Ok(Self {
            registry,
            submissions_total,
            submissions_landed,
            submissions_failed,
            submissions_timed_out,
            broadcast_attempts,
            transient_failures,
            priority_fee_micro_lamports,
            compute_unit_limit,
            active_submissions,
            landing_latency,
            rpc_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
