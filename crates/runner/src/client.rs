//! HTTP client for dispatching generation work to the runner.
//!
//! [`RunnerClient::connect`] is the fallible step: it mints a
//! short-lived dispatch token on behalf of the requesting user and
//! builds the HTTP client. Once constructed, [`start_generation`]
//! (`RunnerClient::start_generation`) calls are independent of each
//! other — the caller decides whether to await them.

use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use easel_core::types::DbId;

use crate::RunnerError;

/// Request timeout for start-generation calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for reaching the runner service.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// HTTP base URL, e.g. `http://runner:8700`.
    pub base_url: String,
    /// Shared HS256 secret for minting dispatch tokens.
    pub token_secret: String,
    /// Dispatch token lifetime in seconds.
    pub token_ttl_secs: u64,
}

/// The identity dispatch is performed on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct RunnerIdentity {
    pub user_id: DbId,
}

/// Claims carried by a dispatch token.
#[derive(Debug, Serialize, Deserialize)]
struct DispatchClaims {
    /// Requesting user's ID.
    sub: String,
    /// Expiry (seconds since epoch).
    exp: i64,
    /// Issued-at (seconds since epoch).
    iat: i64,
}

/// One unit of work handed to the runner.
#[derive(Debug, Clone, Serialize)]
pub struct StartGeneration {
    pub task_id: DbId,
    pub generation_id: DbId,
    pub model: String,
    pub provider: String,
    pub params: serde_json::Value,
}

/// A ready-to-dispatch connection to the runner service.
pub struct RunnerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

// The dispatch token is a bearer credential; keep it out of debug output.
impl std::fmt::Debug for RunnerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RunnerClient {
    /// Construct a dispatch client for one user.
    ///
    /// Mints the short-lived dispatch token and builds the HTTP client.
    /// Failure here means dispatch cannot begin at all; the caller is
    /// expected to compensate for any work that was already persisted.
    pub async fn connect(
        config: &RunnerConfig,
        identity: RunnerIdentity,
    ) -> Result<Self, RunnerError> {
        let token = mint_dispatch_token(config, identity)?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RunnerError::Connection(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(
            user_id = identity.user_id,
            base_url = %config.base_url,
            "Runner dispatch client ready",
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Ask the runner to start executing one generation.
    ///
    /// The runner acknowledges acceptance; execution and status
    /// reporting happen on its side.
    pub async fn start_generation(&self, req: &StartGeneration) -> Result<(), RunnerError> {
        let url = format!("{}/api/v1/generations", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(req)
            .send()
            .await
            .map_err(|e| RunnerError::Request(format!("POST {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(RunnerError::Request(format!(
                "Runner rejected task {}: HTTP {}",
                req.task_id,
                response.status()
            )));
        }

        Ok(())
    }
}

/// Mint a short-lived HS256 dispatch token for `identity`.
fn mint_dispatch_token(
    config: &RunnerConfig,
    identity: RunnerIdentity,
) -> Result<String, RunnerError> {
    if config.token_secret.is_empty() {
        return Err(RunnerError::Credential(
            "RUNNER_TOKEN_SECRET is not configured".to_string(),
        ));
    }

    let now = chrono::Utc::now();
    let claims = DispatchClaims {
        sub: identity.user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::seconds(config.token_ttl_secs as i64)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
    .map_err(|e| RunnerError::Credential(format!("Failed to mint dispatch token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config(secret: &str) -> RunnerConfig {
        RunnerConfig {
            base_url: "http://runner.test:8700/".to_string(),
            token_secret: secret.to_string(),
            token_ttl_secs: 300,
        }
    }

    #[test]
    fn mints_token_with_configured_secret() {
        let token = mint_dispatch_token(&config("s3cret"), RunnerIdentity { user_id: 42 }).unwrap();
        // Three dot-separated JWT segments.
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn refuses_empty_secret() {
        let err =
            mint_dispatch_token(&config(""), RunnerIdentity { user_id: 42 }).unwrap_err();
        assert_matches!(err, RunnerError::Credential(_));
    }

    #[tokio::test]
    async fn connect_fails_without_secret() {
        let err = RunnerClient::connect(&config(""), RunnerIdentity { user_id: 1 })
            .await
            .unwrap_err();
        assert_matches!(err, RunnerError::Credential(_));
    }

    #[tokio::test]
    async fn debug_output_redacts_token() {
        let client = RunnerClient::connect(&config("s3cret"), RunnerIdentity { user_id: 1 })
            .await
            .unwrap();
        let rendered = format!("{client:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&client.token));
    }

    #[tokio::test]
    async fn connect_trims_trailing_slash() {
        let client = RunnerClient::connect(&config("s3cret"), RunnerIdentity { user_id: 1 })
            .await
            .unwrap();
        assert_eq!(client.base_url, "http://runner.test:8700");
    }
}
