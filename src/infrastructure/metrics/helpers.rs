//! Metrics helper structs for convenient metric recording

use std::time::Instant;

use prometheus::{Encoder, TextEncoder};

use crate::template::{TemplateError, TemplateResult};

use super::{STORE_OPERATIONS_TOTAL, STORE_OPERATION_LATENCY, SUBSTITUTIONS_TOTAL, TEMPLATES_TOTAL};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording store metrics
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record the outcome and latency of a store operation
    pub fn observe<T>(backend: &str, operation: &str, start: Instant, result: &TemplateResult<T>) {
        STORE_OPERATION_LATENCY
            .with_label_values(&[backend, operation])
            .observe(start.elapsed().as_secs_f64());

        STORE_OPERATIONS_TOTAL
            .with_label_values(&[backend, operation, Self::outcome(result)])
            .inc();
    }

    fn outcome<T>(result: &TemplateResult<T>) -> &'static str {
        match result {
            Ok(_) => "ok",
            Err(TemplateError::NotFound(_)) => "not_found",
            Err(TemplateError::NameConflict(_)) => "conflict",
            Err(TemplateError::Timeout { .. }) => "timeout",
            Err(_) => "error",
        }
    }
}

/// Helper struct for substitution metrics
pub struct SubstitutionMetrics;

impl SubstitutionMetrics {
    /// Record a fully rendered template
    pub fn record_success() {
        SUBSTITUTIONS_TOTAL.with_label_values(&["ok"]).inc();
    }

    /// Record a render that failed on a missing token value
    pub fn record_mismatch() {
        SUBSTITUTIONS_TOTAL.with_label_values(&["token_mismatch"]).inc();
    }
}

/// Helper struct for the template inventory gauge
pub struct TemplateInventoryMetrics;

impl TemplateInventoryMetrics {
    pub fn set_total(count: usize) {
        TEMPLATES_TOTAL.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(StoreMetrics::outcome(&Ok::<_, TemplateError>(())), "ok");
        assert_eq!(
            StoreMetrics::outcome::<()>(&Err(TemplateError::NotFound("x".into()))),
            "not_found"
        );
        assert_eq!(
            StoreMetrics::outcome::<()>(&Err(TemplateError::NameConflict("x".into()))),
            "conflict"
        );
        assert_eq!(
            StoreMetrics::outcome::<()>(&Err(TemplateError::timeout(
                "get",
                Duration::from_secs(1)
            ))),
            "timeout"
        );
    }

    #[test]
    fn test_encode_contains_recorded_metric() {
        StoreMetrics::observe::<()>("memory", "get", Instant::now(), &Ok(()));
        let output = encode_metrics().unwrap();
        assert!(output.contains("templates_store_operations_total"));
    }
}
