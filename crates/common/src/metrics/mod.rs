//! Metrics and observability utilities
//!
//! Prometheus metrics with latency histograms and standardized naming.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Bookshop metrics
pub const METRICS_PREFIX: &str = "bookshop";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.075, 0.100, 0.150, 0.250, 0.500, 1.000, 2.500, 5.000,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_orders_placed_total", METRICS_PREFIX),
        Unit::Count,
        "Orders created at checkout"
    );

    describe_counter!(
        format!("{}_order_status_changes_total", METRICS_PREFIX),
        Unit::Count,
        "Order status transitions"
    );

    describe_counter!(
        format!("{}_login_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Token requests by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

pub fn record_order_placed() {
    counter!(format!("{}_orders_placed_total", METRICS_PREFIX)).increment(1);
}

pub fn record_order_status_change(from: &str, to: &str) {
    counter!(
        format!("{}_order_status_changes_total", METRICS_PREFIX),
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

pub fn record_login(success: bool) {
    counter!(
        format!("{}_login_attempts_total", METRICS_PREFIX),
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_metrics();
        RequestMetrics::start("GET", "/api/books/").finish(200);
        record_order_placed();
        record_order_status_change("pending", "paid");
        record_login(false);
    }

    #[test]
    fn test_latency_buckets_are_sorted() {
        assert!(LATENCY_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }
}
