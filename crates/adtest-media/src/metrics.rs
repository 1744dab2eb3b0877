//! Pipeline metrics.

use metrics::{counter, histogram};
use std::time::Duration;

/// Metric names as constants for consistency.
pub mod names {
    pub const PIPELINE_RUNS_TOTAL: &str = "adtest_pipeline_runs_total";
    pub const PIPELINE_DURATION_SECONDS: &str = "adtest_pipeline_duration_seconds";
    pub const TRANSFORM_DURATION_SECONDS: &str = "adtest_transform_duration_seconds";
}

/// Record a finished pipeline run. `outcome` is `compliant`, `transformed` or an error kind.
pub fn record_pipeline_run(outcome: &str, elapsed: Duration) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::PIPELINE_RUNS_TOTAL, &labels).increment(1);
    histogram!(names::PIPELINE_DURATION_SECONDS, &labels).record(elapsed.as_secs_f64());
}

/// Record wall-clock time of one ffmpeg run.
pub fn record_transform_duration(elapsed: Duration) {
    histogram!(names::TRANSFORM_DURATION_SECONDS).record(elapsed.as_secs_f64());
}
