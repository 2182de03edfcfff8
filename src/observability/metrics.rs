//! Prometheus metrics implementation.
//!
//! Key metrics:
//! - shelf_operations_total: Counter of operations by outcome
//! - shelf_operation_latency_seconds: Histogram of operation latency
//! - shelf_cache_lookups_total: Counter of page cache hits, misses and errors
//! - shelf_side_effect_failures_total: Counter of failed invalidations and publishes

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Shelf metrics registry.
pub struct Metrics {
    registry: Registry,
    /// Operations by name and outcome.
    pub operations_total: IntCounterVec,
    /// Operation latency in seconds.
    pub operation_latency: HistogramVec,
    /// Page cache lookups by result.
    pub cache_lookups: IntCounterVec,
    /// Best-effort side effects that failed.
    pub side_effect_failures: IntCounterVec,
}

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("shelf_operations_total", "Total number of catalog operations"),
            &["operation", "outcome"],
        )?;
        let operation_latency = HistogramVec::new(
            HistogramOpts::new(
                "shelf_operation_latency_seconds",
                "Catalog operation latency from validation to response",
            ),
            &["operation"],
        )?;
        let cache_lookups = IntCounterVec::new(
            Opts::new("shelf_cache_lookups_total", "Page cache lookups"),
            &["result"],
        )?;
        let side_effect_failures = IntCounterVec::new(
            Opts::new(
                "shelf_side_effect_failures_total",
                "Cache invalidations and change publishes that failed",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(operation_latency.clone()))?;
        registry.register(Box::new(cache_lookups.clone()))?;
        registry.register(Box::new(side_effect_failures.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            operation_latency,
            cache_lookups,
            side_effect_failures,
        })
    }
}

/// Initialize the metrics system.
///
/// This should be called once at startup. Subsequent calls are ignored.
pub fn init_metrics() {
    METRICS.get_or_init(|| match Metrics::new() {
        Ok(metrics) => metrics,
        // Metric names are static; registration only fails on a programming error.
        Err(e) => panic!("invalid metric definition: {e}"),
    });
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Registry to expose on the scrape endpoint.
///
/// Initializes metrics if needed.
pub fn prometheus_registry() -> Registry {
    init_metrics();
    METRICS
        .get()
        .map_or_else(Registry::new, |m| m.registry.clone())
}

/// Record one finished operation.
pub fn record_operation(operation: &str, outcome: &str, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        m.operations_total
            .with_label_values(&[operation, outcome])
            .inc();
        m.operation_latency
            .with_label_values(&[operation])
            .observe(latency_seconds);
    }
}

/// Record a page cache lookup (`hit`, `miss` or `error`).
pub fn record_cache_lookup(result: &str) {
    if let Some(m) = METRICS.get() {
        m.cache_lookups.with_label_values(&[result]).inc();
    }
}

/// Record a failed best-effort side effect (`cache` or `publish`).
pub fn record_side_effect_failure(kind: &str) {
    if let Some(m) = METRICS.get() {
        m.side_effect_failures.with_label_values(&[kind]).inc();
    }
}
