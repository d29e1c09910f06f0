// Shared transport configuration for building reqwest::Client instances.

use std::time::Duration;

use crate::error::ApiError;

/// Timeout settings applied to every request.
///
/// Operations must not hang indefinitely: both the TCP connect and the
/// total request are bounded, and exceeding either surfaces as
/// [`ApiError::NetworkFailure`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total request timeout (connect, transfer, and body read).
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by [`RuleClient`](crate::RuleClient) to install the
    /// `Authorization` header on every request.
    pub fn build_client_with_headers(
        &self,
        headers: reqwest::header::HeaderMap,
    ) -> Result<reqwest::Client, ApiError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(concat!("rulegate/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Unknown {
                message: format!("failed to build HTTP client: {e}"),
            })
    }
}
