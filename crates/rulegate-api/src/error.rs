use thiserror::Error;

/// Top-level error type for the `rulegate-api` crate.
///
/// Every client operation returns a value or one of these variants;
/// `rulegate-core` maps them into user-facing messages and state
/// transitions, so the set is deliberately small.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL or API token is missing. No request was attempted --
    /// calls fail before reaching the network so nothing leaks to a
    /// placeholder endpoint.
    #[error("Configuration not set")]
    ConfigurationMissing,

    /// The server rejected the bearer token (HTTP 401 or 403).
    #[error("invalid or rejected API token")]
    Unauthorized,

    /// Transport-level failure: timeout, DNS, connection refused.
    #[error("network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    /// Any other non-success status, or a response body that could not
    /// be parsed.
    #[error("{message}")]
    Unknown { message: String },
}

impl ApiError {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The client itself never retries; callers decide.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }

    /// Returns `true` if the stored credentials were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
