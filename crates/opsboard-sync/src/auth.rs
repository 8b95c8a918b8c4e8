//! # Credential Provider
//!
//! Obtains an app-only bearer token with the OAuth 2.0 client-credentials
//! grant.
//!
//! ## Token Exchange
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Credentials Flow                            │
//! │                                                                         │
//! │  ┌────────────────┐                        ┌─────────────────────────┐  │
//! │  │ opsboard-sync  │  POST {authority}/     │  Identity Provider      │  │
//! │  │                │  {tenant}/oauth2/v2.0/ │                         │  │
//! │  │                │  token                 │                         │  │
//! │  │                │───────────────────────►│                         │  │
//! │  │                │  client_id, scope,     │                         │  │
//! │  │                │  client_secret,        │                         │  │
//! │  │                │  grant_type            │                         │  │
//! │  │                │                        │                         │  │
//! │  │                │◄───────────────────────│  { access_token, ... }  │  │
//! │  └────────────────┘                        └─────────────────────────┘  │
//! │                                                                         │
//! │  Failure → wait (exponential backoff) → retry, up to N attempts.        │
//! │  Exhausted → AuthError → controller switches to demo data.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Token Lifetime
//! Every refresh cycle requests a fresh token. Nothing is cached across
//! cycles, so expiry handling never comes into play.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ProviderSettings, RefreshSettings};
use crate::error::AuthError;

// =============================================================================
// Credential
// =============================================================================

/// A bearer token valid for the current refresh cycle.
#[derive(Clone)]
pub struct Credential {
    token: String,
    /// When the token was issued to us.
    pub obtained_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential {
            token: token.into(),
            obtained_at: Utc::now(),
        }
    }

    /// Raw token value for the `Authorization` header.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Error body returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

// =============================================================================
// Provider
// =============================================================================

/// Exchanges client credentials for bearer tokens.
pub struct CredentialProvider {
    client: reqwest::Client,
    provider: ProviderSettings,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    /// Failed acquisitions since the last success.
    consecutive_failures: AtomicU32,
}

impl CredentialProvider {
    pub fn new(client: reqwest::Client, provider: ProviderSettings, refresh: &RefreshSettings) -> Self {
        CredentialProvider {
            client,
            provider,
            max_attempts: refresh.auth_max_attempts.max(1),
            initial_backoff: Duration::from_millis(refresh.initial_backoff_ms),
            max_backoff: Duration::from_millis(refresh.max_backoff_ms),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Number of cycles in a row that failed to obtain a token.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Obtains a fresh token, retrying with backoff.
    ///
    /// Returns the last error once every attempt has failed.
    pub async fn acquire(&self) -> Result<Credential, AuthError> {
        let mut backoff = self.create_backoff();
        let mut attempt = 1u32;

        loop {
            match self.request_token().await {
                Ok(credential) => {
                    let previous = self.consecutive_failures.swap(0, Ordering::Relaxed);
                    if previous > 0 {
                        info!(previous_failures = previous, "Token acquisition recovered");
                    }
                    return Ok(credential);
                }
                Err(e) if attempt < self.max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or(self.max_backoff);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        ?delay,
                        error = %e,
                        "Token request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        attempts = attempt,
                        consecutive_failures = failures,
                        error = %e,
                        "Token acquisition exhausted"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Single token request.
    async fn request_token(&self) -> Result<Credential, AuthError> {
        let url = self.provider.token_url();
        debug!(%url, "Requesting token");

        let form = [
            ("client_id", self.provider.client_id.as_str()),
            ("scope", self.provider.scope.as_str()),
            ("client_secret", self.provider.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::new(None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::new(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::new(Some(status.as_u16()), describe_error(&body)));
        }

        // An error payload can arrive with a 200 status.
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|_| AuthError::new(Some(status.as_u16()), describe_error(&body)))?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::new(Some(status.as_u16()), "empty access_token"));
        }

        debug!(expires_in = ?parsed.expires_in, "Token obtained");
        Ok(Credential::new(parsed.access_token))
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Builds the most useful message out of a token error body.
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error: Some(code),
            error_description: Some(description),
        }) => format!("{}: {}", code, description),
        Ok(TokenErrorResponse {
            error_description: Some(description),
            ..
        }) => description,
        Ok(TokenErrorResponse { error: Some(code), .. }) => code,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}
