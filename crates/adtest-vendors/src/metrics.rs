//! Vendor request metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Vendor requests by vendor, operation and status.
    pub const REQUESTS_TOTAL: &str = "adtest_vendor_requests_total";

    /// Vendor request latency in seconds.
    pub const LATENCY_SECONDS: &str = "adtest_vendor_latency_seconds";

    /// Completed polling loops by operation and outcome.
    pub const POLLS_TOTAL: &str = "adtest_vendor_polls_total";
}

pub fn record_request(
    vendor: &'static str,
    operation: &'static str,
    status: u16,
    latency_secs: f64,
) {
    counter!(
        names::REQUESTS_TOTAL,
        "vendor" => vendor,
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "vendor" => vendor,
        "operation" => operation
    )
    .record(latency_secs);
}

pub fn record_poll(outcome: &'static str) {
    counter!(names::POLLS_TOTAL, "outcome" => outcome).increment(1);
}
