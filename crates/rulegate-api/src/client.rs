// Hand-crafted async HTTP client for the rule shim API.
//
// Base path: the configured base URL (always trailing-slash terminated).
// Auth: `Authorization: Bearer <token>` header.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::transport::TransportConfig;

// ── Wire types ───────────────────────────────────────────────────────

/// Current state of the remote rule, as returned by `GET v1/rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleState {
    pub enabled: bool,
}

/// Error response shape some shim deployments return on failure.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the rule shim API.
///
/// Holds the remote endpoint with the bearer token installed as a
/// sensitive default header. An unconfigured client (missing base URL
/// or token) fails every operation with
/// [`ApiError::ConfigurationMissing`] without touching the network.
pub struct RuleClient {
    remote: Option<Remote>,
}

struct Remote {
    http: reqwest::Client,
    base_url: Url,
}

impl RuleClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a base URL, bearer token, and transport config.
    ///
    /// The base URL is normalized to always carry a trailing slash so
    /// relative endpoint paths join correctly, including under a path
    /// prefix (`https://host/shim/`). An empty URL or token yields an
    /// unconfigured client rather than an error.
    pub fn from_parts(
        base_url: &str,
        api_token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, ApiError> {
        if base_url.trim().is_empty() || api_token.expose_secret().is_empty() {
            return Ok(Self::unconfigured());
        }

        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {}", api_token.expose_secret()))
            .map_err(|e| ApiError::Unknown {
                message: format!("invalid API token header value: {e}"),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(base_url)?;

        Ok(Self {
            remote: Some(Remote { http, base_url }),
        })
    }

    /// A client with no connection settings.
    ///
    /// Every operation returns [`ApiError::ConfigurationMissing`].
    pub fn unconfigured() -> Self {
        Self { remote: None }
    }

    /// Whether this client has a complete connection configuration.
    pub fn is_configured(&self) -> bool {
        self.remote.is_some()
    }

    fn remote(&self) -> Result<&Remote, ApiError> {
        self.remote.as_ref().ok_or(ApiError::ConfigurationMissing)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch the current rule state.
    pub async fn fetch_rule(&self) -> Result<RuleState, ApiError> {
        self.remote()?.get("v1/rule").await
    }

    /// Set the rule to the desired state. Any 2xx response is success.
    pub async fn set_rule(&self, enabled: bool) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body {
            enabled: bool,
        }

        self.remote()?
            .post_no_response("v1/rule/enable", &Body { enabled })
            .await
    }
}

// ── Transport mechanics ──────────────────────────────────────────────

impl Remote {
    /// Join a relative path (e.g. `"v1/rule"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/`, so joining `v1/…` works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_empty(resp).await
    }
}

/// Normalize a base URL so relative joins resolve under it.
fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw).map_err(|e| ApiError::Unknown {
        message: format!("invalid base URL: {e}"),
    })?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = body.get(..200).unwrap_or(&body);
            ApiError::Unknown {
                message: format!("malformed response body: {e} (preview: {preview:?})"),
            }
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), ApiError> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> ApiError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return ApiError::Unauthorized;
    }

    let raw = resp.text().await.unwrap_or_default();

    if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
        ApiError::Unknown {
            message: err.message.unwrap_or_else(|| format!("HTTP {status}")),
        }
    } else {
        ApiError::Unknown {
            message: if raw.is_empty() {
                format!("HTTP {status}")
            } else {
                raw
            },
        }
    }
}
