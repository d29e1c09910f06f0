// Connection configuration snapshot owned by a session.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default total request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable configuration snapshot for a [`Session`](crate::Session).
///
/// A settings change never mutates an existing snapshot; it produces a
/// fresh one (and with it a fresh session), so in-flight operations keep
/// the configuration they started with. The token is held as a
/// [`SecretString`] and never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Remote base URL. `None` or empty means "not configured".
    pub base_url: Option<String>,
    /// Bearer token for the shim API. `None` or empty means "not configured".
    pub api_token: Option<SecretString>,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total request timeout.
    pub request_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// The (base URL, token) pair, present only when both are non-empty.
    pub fn connection(&self) -> Option<(&str, &SecretString)> {
        let base_url = self.base_url.as_deref().filter(|u| !u.trim().is_empty())?;
        let token = self
            .api_token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())?;
        Some((base_url, token))
    }

    /// Whether both base URL and token are configured.
    pub fn is_complete(&self) -> bool {
        self.connection().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_incomplete() {
        assert!(!ConnectionConfig::default().is_complete());
    }

    #[test]
    fn complete_when_both_fields_present() {
        let config = ConnectionConfig {
            base_url: Some("https://example.com/".into()),
            api_token: Some(SecretString::from("tok")),
            ..ConnectionConfig::default()
        };
        assert!(config.is_complete());
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let config = ConnectionConfig {
            base_url: Some(String::new()),
            api_token: Some(SecretString::from("tok")),
            ..ConnectionConfig::default()
        };
        assert!(!config.is_complete());

        let config = ConnectionConfig {
            base_url: Some("https://example.com/".into()),
            api_token: Some(SecretString::from("")),
            ..ConnectionConfig::default()
        };
        assert!(!config.is_complete());
    }
}
