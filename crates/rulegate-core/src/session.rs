// ── Session ──
//
// One (config snapshot, client, controller) unit. A configuration
// change constructs a fresh session instead of mutating this one in
// place, so client and controller always agree on their settings.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use rulegate_api::{ApiError, RuleClient, TransportConfig};

use crate::config::ConnectionConfig;
use crate::controller::RuleController;

/// Owns the remote client and controller for one configuration snapshot.
///
/// Dropping or [`reconfigure`](Self::reconfigure)-ing the session
/// cancels its token, abandoning in-flight operations: a response that
/// arrives afterwards is discarded rather than written into the
/// torn-down controller.
pub struct Session {
    config: ConnectionConfig,
    controller: RuleController,
    cancel: CancellationToken,
}

impl Session {
    /// Build a session from a configuration snapshot.
    ///
    /// An incomplete snapshot produces an unconfigured client whose
    /// operations fail fast with a configuration error; the session is
    /// still usable, so consumers can render that failure and point the
    /// user at the settings flow.
    pub fn new(config: ConnectionConfig) -> Result<Self, ApiError> {
        let cancel = CancellationToken::new();
        let transport = build_transport(&config);

        let client = match config.connection() {
            Some((base_url, token)) => RuleClient::from_parts(base_url, token, &transport)?,
            None => RuleClient::unconfigured(),
        };

        let controller = RuleController::new(client, cancel.child_token());

        Ok(Self {
            config,
            controller,
            cancel,
        })
    }

    /// Replace this session with one built from a new snapshot.
    ///
    /// In-flight operations of the old session are abandoned before the
    /// new client/controller pair is constructed.
    pub fn reconfigure(self, config: ConnectionConfig) -> Result<Self, ApiError> {
        self.cancel.cancel();
        debug!("session torn down for reconfiguration");
        Self::new(config)
    }

    /// The configuration snapshot this session was built from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The state controller owned by this session.
    pub fn controller(&self) -> &RuleController {
        &self.controller
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn build_transport(config: &ConnectionConfig) -> TransportConfig {
    TransportConfig {
        connect_timeout: config.connect_timeout,
        timeout: config.request_timeout,
    }
}
