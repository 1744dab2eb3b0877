//! Shared request plumbing for vendor clients.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{VendorError, VendorResult};
use crate::metrics::record_request;

pub(crate) fn build_client(timeout: Duration) -> VendorResult<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("adtest-vendors/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Send a request and turn any non-success status into [`VendorError::Api`].
pub(crate) async fn send(
    vendor: &'static str,
    operation: &'static str,
    request: RequestBuilder,
) -> VendorResult<Response> {
    let start = Instant::now();
    let result = request.send().await;
    let elapsed = start.elapsed().as_secs_f64();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            record_request(vendor, operation, 0, elapsed);
            warn!(vendor, operation, error = %e, "Vendor request did not complete");
            return Err(e.into());
        }
    };

    let status = response.status();
    record_request(vendor, operation, status.as_u16(), elapsed);
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(vendor, operation, status = status.as_u16(), body = %body, "Vendor API error");
    Err(VendorError::Api {
        vendor,
        status: status.as_u16(),
        body,
    })
}

/// [`send`], then decode the JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    vendor: &'static str,
    operation: &'static str,
    request: RequestBuilder,
) -> VendorResult<T> {
    let bytes = send(vendor, operation, request).await?.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| VendorError::invalid_response(vendor, format!("{}: {}", operation, e)))
}
