// ── Rule controller ──
//
// Owns the single active view state and sequences the three user-facing
// operations: load, toggle, refresh. Optimistic updates are applied
// before the network round-trip and rolled back on failure.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use rulegate_api::{ApiError, RuleClient};

// ── ViewState ────────────────────────────────────────────────────

/// View state observable by consumers.
///
/// Exactly one variant is active at a time; transitions are driven only
/// by [`RuleController`]. This is pure in-memory session state with no
/// persisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Loaded { enabled: bool },
    Error { message: String },
}

// ── Controller ───────────────────────────────────────────────────

/// The state controller for the single remote rule.
///
/// Cheaply cloneable via `Arc`. Each operation spawns an independent
/// Tokio task and returns its `JoinHandle`, so callers never block;
/// consumers observe outcomes through the [`view_state`](Self::view_state),
/// [`error_message`](Self::error_message), and
/// [`refreshing`](Self::refreshing) watch channels.
///
/// Operations are not queued or serialized: a `toggle()` issued while a
/// `load()` is in flight may be overwritten by whichever completes last.
/// Failed operations surface once and must be re-triggered by the
/// caller; there is no retry logic at this layer.
#[derive(Clone)]
pub struct RuleController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    client: RuleClient,
    view_state: watch::Sender<ViewState>,
    error_message: watch::Sender<Option<String>>,
    refreshing: watch::Sender<bool>,
    cancel: CancellationToken,
    // Retain one receiver per channel so `Sender::send` keeps updating the
    // stored value even when no consumer is currently subscribed (with zero
    // receivers `send` is a no-op that returns `Err`).
    _view_state_rx: watch::Receiver<ViewState>,
    _error_message_rx: watch::Receiver<Option<String>>,
    _refreshing_rx: watch::Receiver<bool>,
}

impl RuleController {
    /// Create a controller in the [`ViewState::Loading`] state.
    ///
    /// The cancellation token ties the controller to its owning session:
    /// once cancelled, in-flight operations return without writing into
    /// the controller.
    pub fn new(client: RuleClient, cancel: CancellationToken) -> Self {
        let (view_state, view_state_rx) = watch::channel(ViewState::Loading);
        let (error_message, error_message_rx) = watch::channel(None);
        let (refreshing, refreshing_rx) = watch::channel(false);

        Self {
            inner: Arc::new(ControllerInner {
                client,
                view_state,
                error_message,
                refreshing,
                cancel,
                _view_state_rx: view_state_rx,
                _error_message_rx: error_message_rx,
                _refreshing_rx: refreshing_rx,
            }),
        }
    }

    // ── Operations ───────────────────────────────────────────────

    /// Reload the rule state from the server.
    ///
    /// Sets the view state to [`ViewState::Loading`] before the fetch
    /// starts, so a failure lands in [`ViewState::Error`] even when a
    /// loaded state was displayed before the call. Must be called from
    /// within a Tokio runtime.
    pub fn load(&self) -> JoinHandle<()> {
        let _ = self.inner.view_state.send(ViewState::Loading);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = inner.cancel.cancelled() => return,
                res = inner.client.fetch_rule() => res,
            };

            match result {
                Ok(rule) => {
                    debug!(enabled = rule.enabled, "rule state loaded");
                    let _ = inner.view_state.send(ViewState::Loaded {
                        enabled: rule.enabled,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "rule fetch failed");
                    inner.surface_error(&err);
                }
            }
        })
    }

    /// Flip the rule, optimistically.
    ///
    /// No-op unless the current state is [`ViewState::Loaded`] (returns
    /// `None`, silently). The flipped value is visible to observers
    /// before the network round-trip starts; a failed POST reverts to
    /// the pre-toggle value and surfaces the error. Must be called from
    /// within a Tokio runtime.
    pub fn toggle(&self) -> Option<JoinHandle<()>> {
        let previous = match &*self.inner.view_state.borrow() {
            ViewState::Loaded { enabled } => *enabled,
            ViewState::Loading | ViewState::Error { .. } => return None,
        };
        let desired = !previous;

        // Optimistic update, applied before the request is issued.
        let _ = self
            .inner
            .view_state
            .send(ViewState::Loaded { enabled: desired });

        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = inner.cancel.cancelled() => return,
                res = inner.client.set_rule(desired) => res,
            };

            if let Err(err) = result {
                warn!(error = %err, desired, "rule update failed, reverting");
                let _ = inner
                    .view_state
                    .send(ViewState::Loaded { enabled: previous });
                inner.surface_error(&err);
            }
        }))
    }

    /// Re-fetch the rule without passing through `Loading`.
    ///
    /// Drives the [`refreshing`](Self::refreshing) overlay flag true for
    /// the duration of the call and applies the outcome exactly as
    /// [`load()`](Self::load) applies it. A failure while a loaded state
    /// is displayed keeps that state on screen; the error is surfaced
    /// only through the message side-channel. Must be called from within
    /// a Tokio runtime.
    pub fn refresh(&self) -> JoinHandle<()> {
        let _ = self.inner.refreshing.send(true);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = inner.cancel.cancelled() => return,
                res = inner.client.fetch_rule() => res,
            };

            match result {
                Ok(rule) => {
                    let _ = inner.view_state.send(ViewState::Loaded {
                        enabled: rule.enabled,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "refresh failed");
                    inner.surface_error(&err);
                }
            }

            let _ = inner.refreshing.send(false);
        })
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to view state changes.
    pub fn view_state(&self) -> watch::Receiver<ViewState> {
        self.inner.view_state.subscribe()
    }

    /// Snapshot of the current view state.
    pub fn current_state(&self) -> ViewState {
        self.inner.view_state.borrow().clone()
    }

    /// Subscribe to the user-facing error message side-channel.
    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.inner.error_message.subscribe()
    }

    /// Snapshot of the current error message.
    pub fn current_error(&self) -> Option<String> {
        self.inner.error_message.borrow().clone()
    }

    /// Subscribe to the refresh overlay flag.
    pub fn refreshing(&self) -> watch::Receiver<bool> {
        self.inner.refreshing.subscribe()
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        *self.inner.refreshing.borrow()
    }

    /// Clear the error message side-channel.
    ///
    /// Consumers call this after the message has been shown (e.g. a
    /// dismissed snackbar); errors are never cleared implicitly.
    pub fn clear_error(&self) {
        let _ = self.inner.error_message.send(None);
    }
}

impl ControllerInner {
    /// Publish a user-facing message; downgrade the view state to
    /// [`ViewState::Error`] only when no loaded state is currently
    /// displayed, so a transient failure never replaces known-good data.
    fn surface_error(&self, err: &ApiError) {
        let message = user_message(err);
        let _ = self.error_message.send(Some(message.clone()));

        let showing_loaded = matches!(&*self.view_state.borrow(), ViewState::Loaded { .. });
        if !showing_loaded {
            let _ = self.view_state.send(ViewState::Error { message });
        }
    }
}

/// Map an API error to the message shown to the user.
fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::ConfigurationMissing => "Configuration not set".into(),
        ApiError::Unauthorized => "Invalid token".into(),
        ApiError::NetworkFailure(_) => "Network error".into(),
        ApiError::Unknown { message } if message.is_empty() => "Network error".into(),
        ApiError::Unknown { message } => message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_invalid_token() {
        assert_eq!(user_message(&ApiError::Unauthorized), "Invalid token");
    }

    #[test]
    fn configuration_missing_maps_to_its_own_message() {
        assert_eq!(
            user_message(&ApiError::ConfigurationMissing),
            "Configuration not set"
        );
    }

    #[test]
    fn unknown_carries_the_server_message() {
        let err = ApiError::Unknown {
            message: "HTTP 500 Internal Server Error".into(),
        };
        assert_eq!(user_message(&err), "HTTP 500 Internal Server Error");
    }

    #[test]
    fn empty_unknown_falls_back_to_network_error() {
        let err = ApiError::Unknown {
            message: String::new(),
        };
        assert_eq!(user_message(&err), "Network error");
    }
}
