//! Axum HTTP API server.
//!
//! This crate provides:
//! - Persona search, persona reactions and ad video analysis endpoints
//! - Outbound voice call endpoints
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, CallPresets, IndexSettings};
