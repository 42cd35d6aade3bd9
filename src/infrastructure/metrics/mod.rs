//! Prometheus metrics for the template service.
//!
//! - Store metrics (operations by backend and outcome, latency)
//! - Substitution metrics (successful renders, token mismatches)
//! - Template inventory gauge

mod helpers;

pub use helpers::{encode_metrics, StoreMetrics, SubstitutionMetrics, TemplateInventoryMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "templates";

lazy_static! {
    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Store operations by backend, operation and outcome
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_operations_total", METRIC_PREFIX),
        "Total template store operations",
        &["backend", "operation", "outcome"]
    ).unwrap();

    /// Store operation latency
    pub static ref STORE_OPERATION_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_store_operation_latency_seconds", METRIC_PREFIX),
        "Template store operation latency in seconds",
        &["backend", "operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]
    ).unwrap();

    // ============================================================================
    // Substitution Metrics
    // ============================================================================

    /// Template renders by outcome
    pub static ref SUBSTITUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_substitutions_total", METRIC_PREFIX),
        "Total template substitutions",
        &["outcome"]
    ).unwrap();

    // ============================================================================
    // Inventory
    // ============================================================================

    /// Number of stored templates
    pub static ref TEMPLATES_TOTAL: IntGauge = register_int_gauge!(
        format!("{}_total", METRIC_PREFIX),
        "Number of stored email templates"
    ).unwrap();
}
