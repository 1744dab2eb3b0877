//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "adtest_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "adtest_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "adtest_http_requests_in_flight";

    // Background work
    pub const PERSONA_SEARCHES_TOTAL: &str = "adtest_persona_searches_total";
    pub const PERSONAS_SAVED_TOTAL: &str = "adtest_personas_saved_total";
    pub const PERSONA_RESPONSES_TOTAL: &str = "adtest_persona_responses_total";
    pub const VIDEO_ANALYSES_TOTAL: &str = "adtest_video_analyses_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "adtest_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the end of a background persona search.
pub fn record_persona_search(outcome: &str) {
    counter!(names::PERSONA_SEARCHES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

pub fn record_personas_saved(count: usize) {
    counter!(names::PERSONAS_SAVED_TOTAL).increment(count as u64);
}

/// Record one persona reaction request.
pub fn record_persona_response(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(names::PERSONA_RESPONSES_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_video_analysis(outcome: &str) {
    counter!(names::VIDEO_ANALYSES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Route template for the request, so path parameters don't explode label
/// cardinality. Unmatched requests share one label.
pub(crate) fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
