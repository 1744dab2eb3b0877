//! Vendor client error types.

use thiserror::Error;

/// Result type for vendor operations.
pub type VendorResult<T> = Result<T, VendorError>;

/// Errors returned by vendor clients.
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("Configuration error: {0}")]
    NotConfigured(String),

    /// Non-success HTTP status from the vendor, body kept verbatim.
    #[error("{vendor} API error: {body}")]
    Api {
        vendor: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} did not complete within {waited_secs} seconds")]
    Timeout { operation: String, waited_secs: u64 },

    #[error("{0}")]
    TaskFailed(String),

    #[error("Invalid {vendor} response: {message}")]
    InvalidResponse { vendor: &'static str, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VendorError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn invalid_response(vendor: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidResponse {
            vendor,
            message: msg.into(),
        }
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }

    /// Vendor HTTP status, when the vendor answered with one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            VendorError::Api { status, .. } => Some(*status),
            VendorError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            VendorError::Timeout { .. } => true,
            VendorError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}
