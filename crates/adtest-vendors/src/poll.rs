//! Polling of long-running vendor tasks.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{VendorError, VendorResult};
use crate::metrics::record_poll;

/// How often and how long to poll.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
    /// Name used in logs and in the timeout error
    pub operation: String,
}

impl PollConfig {
    pub fn new(operation: impl Into<String>, interval: Duration, max_wait: Duration) -> Self {
        Self {
            interval,
            max_wait,
            operation: operation.into(),
        }
    }

    /// Entity-search webset: every 0.5 s for up to 5 minutes.
    pub fn webset(webset_id: &str) -> Self {
        Self::new(
            format!("Webset {}", webset_id),
            Duration::from_millis(500),
            Duration::from_secs(300),
        )
    }

    /// Video indexing: every 5 s for up to 30 minutes.
    pub fn indexing(subject: &str) -> Self {
        Self::new(
            format!("Indexing {}", subject),
            Duration::from_secs(5),
            Duration::from_secs(1800),
        )
    }
}

/// Call `fetch` until `status_of` reports a terminal status.
///
/// Returns the first snapshot whose status is in `terminal`. Errors from
/// `fetch` end the loop immediately. Once `max_wait` has elapsed without a
/// terminal status the loop fails with [`VendorError::Timeout`].
pub async fn poll_until_terminal<T, S, F, Fut>(
    config: &PollConfig,
    mut fetch: F,
    status_of: impl Fn(&T) -> S,
    terminal: &[S],
) -> VendorResult<T>
where
    S: PartialEq + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = VendorResult<T>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    while started.elapsed() < config.max_wait {
        attempts += 1;
        let snapshot = fetch().await?;
        let status = status_of(&snapshot);
        debug!(operation = %config.operation, attempt = attempts, status = %status, "Polling");

        if terminal.contains(&status) {
            info!(
                operation = %config.operation,
                status = %status,
                attempts,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Reached terminal status"
            );
            record_poll("terminal");
            return Ok(snapshot);
        }

        tokio::time::sleep(config.interval).await;
    }

    warn!(operation = %config.operation, attempts, "Polling timed out");
    record_poll("timeout");
    Err(VendorError::Timeout {
        operation: config.operation.clone(),
        waited_secs: config.max_wait.as_secs(),
    })
}
