//! State management layer between `rulegate-api` and UI consumers.
//!
//! - **[`Session`]** — owns one (configuration snapshot, remote client,
//!   controller) unit tied to a cancellation token. A settings change
//!   builds a fresh session rather than mutating this one; the old
//!   session abandons its in-flight work on teardown.
//!
//! - **[`RuleController`]** — sequences the three user-facing operations
//!   (load, toggle, refresh) and owns the single active [`ViewState`],
//!   published through `tokio::sync::watch` channels alongside an
//!   error-message side-channel and a refresh overlay flag.
//!
//! Operations are deliberately not serialized: each spawns its own task
//! and the last write to the view state wins. With a single user driving
//! coarse-grained actions, this race is tolerated rather than guarded.

pub mod config;
pub mod controller;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConnectionConfig;
pub use controller::{RuleController, ViewState};
pub use session::Session;

// Re-export the API surface consumers need alongside the controller.
pub use rulegate_api::{ApiError, RuleClient, RuleState, TransportConfig};
