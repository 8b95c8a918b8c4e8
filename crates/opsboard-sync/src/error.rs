//! # Sync Error Types
//!
//! Error types for the refresh pipeline.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐  │
//! │  │  AuthError      │  │  LookupError    │  │  FetchError             │  │
//! │  │                 │  │                 │  │                         │  │
//! │  │  Token request  │  │  Site id        │  │  One list failed        │  │
//! │  │  failed         │  │  resolution     │  │                         │  │
//! │  │                 │  │  failed         │  │                         │  │
//! │  │  → demo data    │  │  → demo data    │  │  → empty list           │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │  ConfigError  - missing/invalid configuration                   │    │
//! │  │               → fatal at startup, scheduler never starts        │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Credential exchange failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Token request failed{}: {detail}", status_suffix(.status))]
pub struct AuthError {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Provider `error_description`, response body, or transport message.
    pub detail: String,
}

impl AuthError {
    pub fn new(status: Option<u16>, detail: impl Into<String>) -> Self {
        AuthError {
            status,
            detail: detail.into(),
        }
    }

    /// True for failures worth retrying immediately (network, 5xx, 429).
    pub fn is_transient(&self) -> bool {
        match self.status {
            None => true,
            Some(code) => code == 429 || code >= 500,
        }
    }
}

/// Site resolution failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Site lookup failed{}: {detail}", status_suffix(.status))]
pub struct LookupError {
    pub status: Option<u16>,
    pub detail: String,
}

impl LookupError {
    pub fn new(status: Option<u16>, detail: impl Into<String>) -> Self {
        LookupError {
            status,
            detail: detail.into(),
        }
    }
}

/// One list fetch failed. Never surfaced; the fetcher substitutes an empty list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Fetching list '{list}' failed{}: {detail}", status_suffix(.status))]
pub struct FetchError {
    pub list: String,
    pub status: Option<u16>,
    pub detail: String,
}

impl FetchError {
    pub fn new(list: impl Into<String>, status: Option<u16>, detail: impl Into<String>) -> Self {
        FetchError {
            list: list.into(),
            status,
            detail: detail.into(),
        }
    }

    /// True when the provider rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Missing or invalid configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is missing or empty.
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// A value is present but unusable.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    LoadFailed(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

// =============================================================================
// Umbrella Error
// =============================================================================

/// Any failure of a refresh cycle or of engine setup.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The whole cycle exceeded its time budget.
    #[error("Refresh cycle timed out after {0} seconds")]
    Timeout(u64),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Http(err.to_string())
    }
}

impl SyncError {
    /// Returns true if a later cycle may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Auth(e) => e.is_transient(),
            SyncError::Lookup(_) | SyncError::Timeout(_) | SyncError::Http(_) => true,
            SyncError::Config(_) => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }
}
