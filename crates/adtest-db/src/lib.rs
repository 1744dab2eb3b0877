//! Relational store client for the AdTest backend.
//!
//! Talks to Supabase over its PostgREST interface:
//! - `jobs`: one row per ad-testing job
//! - `ads`: the ad under test, including its analysis description
//! - `persona`: candidate personas found by the search sync
//! - `persona_responses`: synthetic reactions per persona
//!
//! Requests are retried with exponential backoff on network errors,
//! rate limiting and 5xx responses.

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod store;

#[cfg(test)]
mod client_tests;

pub use client::{DbConfig, SupabaseDb};
pub use error::{DbError, DbResult};
pub use retry::RetryConfig;
pub use store::AdStore;
