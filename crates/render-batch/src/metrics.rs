//! Batch API metrics collection.
//!
//! - Request counters by operation and status
//! - Latency histograms

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total Batch API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "batch_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "batch_latency_seconds";
}

/// Record metrics for a completed Batch API request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.starts_with("batch_"));
        assert!(names::LATENCY_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_request("create_job", 200, 12.5);
    }
}
