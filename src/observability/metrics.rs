//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `tenant_stack_reconciliations_total` - Total number of reconciliations
//! - `tenant_stack_reconciliation_errors_total` - Total number of reconciliation errors
//! - `tenant_stack_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `tenant_stack_resources_created_total` - Total number of child resources created
//! - `tenant_stack_namespaces_created_total` - Total number of tenant namespaces created
//! - `tenant_stack_cleanups_total` - Total number of completed tenant cleanups

use anyhow::Result;
use prometheus::{Histogram, IntCounter, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tenant_stack_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tenant_stack_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "tenant_stack_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static RESOURCES_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tenant_stack_resources_created_total",
        "Total number of child resources created",
    )
    .expect("Failed to create RESOURCES_CREATED_TOTAL metric - this should never happen")
});

static NAMESPACES_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tenant_stack_namespaces_created_total",
        "Total number of tenant namespaces created",
    )
    .expect("Failed to create NAMESPACES_CREATED_TOTAL metric - this should never happen")
});

static CLEANUPS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tenant_stack_cleanups_total",
        "Total number of completed tenant cleanups",
    )
    .expect("Failed to create CLEANUPS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(RESOURCES_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NAMESPACES_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CLEANUPS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_resources_created(count: i64) {
    #[allow(clippy::cast_sign_loss, reason = "We ensure non-negative with max(0)")]
    let count_u64 = count.max(0) as u64;
    RESOURCES_CREATED_TOTAL.inc_by(count_u64);
}

pub fn increment_namespaces_created() {
    NAMESPACES_CREATED_TOTAL.inc();
}

pub fn increment_cleanups() {
    CLEANUPS_TOTAL.inc();
}
