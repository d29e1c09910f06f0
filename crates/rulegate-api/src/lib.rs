//! Async client for the rule shim API.
//!
//! The API exposes exactly one boolean resource, reachable through two
//! JSON endpoints with bearer-token auth: `GET v1/rule` reads the current
//! state and `POST v1/rule/enable` sets it. [`RuleClient`] wraps both and
//! normalizes every outcome into [`ApiError`] -- nothing here panics
//! across the crate boundary, and nothing retries. `rulegate-core` maps
//! these errors into user-facing diagnostics.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{RuleClient, RuleState};
pub use error::ApiError;
pub use transport::TransportConfig;
