//! # Dashboard Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     MICROSOFT_TENANT_ID / MICROSOFT_CLIENT_ID / MICROSOFT_CLIENT_SECRET │
//! │     OPSBOARD_SITE_PATH, OPSBOARD_REFRESH_INTERVAL_MS, ...               │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     $OPSBOARD_CONFIG, or                                                │
//! │     ~/.config/opsboard/opsboard.toml (Linux)                            │
//! │     ~/Library/Application Support/io.opsboard.opsboard/ (macOS)         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     Graph endpoints, 5 minute refresh, 3 credential attempts            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [provider]
//! tenant_id = "00000000-0000-0000-0000-000000000000"
//! client_id = "11111111-1111-1111-1111-111111111111"
//! # client_secret is best supplied via MICROSOFT_CLIENT_SECRET
//!
//! [site]
//! path = "contoso.sharepoint.com:/sites/it"
//! ticket_list = "Issue tracker"
//! asset_list = "IT Asset List Copy"
//!
//! [refresh]
//! refresh_interval_ms = 300000
//! ```
//!
//! Tenant, client, secret, site path and list names have no defaults: they
//! must come from the file or the environment, otherwise loading fails with
//! [`ConfigError::MissingRequired`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ConfigError;

// =============================================================================
// List API Flavor
// =============================================================================

/// Which REST surface the list items are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListApi {
    /// Microsoft Graph `sites/{id}/lists/{name}/items?$expand=fields`.
    #[default]
    Graph,

    /// SharePoint REST `_api/web/lists/getbytitle('{name}')/items`
    /// (delegated-permission variant, `d` payloads).
    SharepointRest,
}

impl std::fmt::Display for ListApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListApi::Graph => write!(f, "graph"),
            ListApi::SharepointRest => write!(f, "sharepoint_rest"),
        }
    }
}

impl std::str::FromStr for ListApi {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "graph" => Ok(ListApi::Graph),
            "sharepoint_rest" | "sharepoint" | "rest" | "delegated" => Ok(ListApi::SharepointRest),
            other => Err(ConfigError::InvalidValue {
                key: "provider.list_api".into(),
                reason: format!("unknown list API '{}', expected graph or sharepoint_rest", other),
            }),
        }
    }
}

// =============================================================================
// Provider Settings
// =============================================================================

/// Identity and data provider settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub client_id: String,

    /// Never logged; `Debug` prints a placeholder.
    #[serde(default, skip_serializing)]
    pub client_secret: String,

    #[serde(default = "default_scope")]
    pub scope: String,

    #[serde(default = "default_authority_url")]
    pub authority_url: String,

    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,

    #[serde(default)]
    pub list_api: ListApi,

    /// Site URL for the SharePoint REST flavor, e.g.
    /// `https://contoso.sharepoint.com/sites/it`.
    #[serde(default)]
    pub sharepoint_site_url: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("scope", &self.scope)
            .field("authority_url", &self.authority_url)
            .field("graph_base_url", &self.graph_base_url)
            .field("list_api", &self.list_api)
            .field("sharepoint_site_url", &self.sharepoint_site_url)
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

fn default_scope() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_authority_url() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scope: default_scope(),
            authority_url: default_authority_url(),
            graph_base_url: default_graph_base_url(),
            list_api: ListApi::default(),
            sharepoint_site_url: None,
        }
    }
}

impl ProviderSettings {
    /// Token endpoint for the configured tenant.
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

// =============================================================================
// Site Settings
// =============================================================================

/// The site and the two lists the dashboard reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Graph site path, `{hostname}:/{server-relative-path}`.
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub ticket_list: String,

    #[serde(default)]
    pub asset_list: String,
}

// =============================================================================
// Refresh Settings
// =============================================================================

/// Refresh cadence, retry policy and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Interval between scheduled refreshes (milliseconds).
    #[serde(default = "default_refresh_interval", alias = "refreshIntervalMs")]
    pub refresh_interval_ms: u64,

    /// Upper bound on a whole refresh cycle (seconds).
    #[serde(default = "default_cycle_timeout")]
    pub cycle_timeout_secs: u64,

    /// Per-request HTTP timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Credential attempts per cycle before falling back to demo data.
    #[serde(default = "default_auth_max_attempts")]
    pub auth_max_attempts: u32,

    /// Initial delay between credential attempts (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum delay between credential attempts (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Substitute the canned dataset when live data is unavailable.
    #[serde(default = "default_true")]
    pub demo_fallback: bool,

    /// Number of tickets in the recent-tickets projection.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_refresh_interval() -> u64 {
    300_000
}
fn default_cycle_timeout() -> u64 {
    60
}
fn default_request_timeout() -> u64 {
    30
}
fn default_auth_max_attempts() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    500
}
fn default_max_backoff() -> u64 {
    5_000
}
fn default_true() -> bool {
    true
}
fn default_recent_limit() -> usize {
    opsboard_core::metrics::DEFAULT_RECENT_LIMIT
}

impl Default for RefreshSettings {
    fn default() -> Self {
        RefreshSettings {
            refresh_interval_ms: default_refresh_interval(),
            cycle_timeout_secs: default_cycle_timeout(),
            request_timeout_secs: default_request_timeout(),
            auth_max_attempts: default_auth_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            demo_fallback: default_true(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl RefreshSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub site: SiteSettings,

    #[serde(default)]
    pub refresh: RefreshSettings,
}

impl DashboardConfig {
    /// Loads configuration from file and environment, then validates it.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`$OPSBOARD_CONFIG` or the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("OPSBOARD_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading dashboard config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document without touching the environment.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("provider.tenant_id", &self.provider.tenant_id),
            ("provider.client_id", &self.provider.client_id),
            ("provider.client_secret", &self.provider.client_secret),
            ("site.path", &self.site.path),
            ("site.ticket_list", &self.site.ticket_list),
            ("site.asset_list", &self.site.asset_list),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired(key.to_string()));
            }
        }

        validate_url("provider.authority_url", &self.provider.authority_url)?;
        validate_url("provider.graph_base_url", &self.provider.graph_base_url)?;

        if self.provider.list_api == ListApi::SharepointRest {
            match self.provider.sharepoint_site_url.as_deref() {
                Some(url) if !url.trim().is_empty() => {
                    validate_url("provider.sharepoint_site_url", url)?
                }
                _ => {
                    return Err(ConfigError::MissingRequired(
                        "provider.sharepoint_site_url".into(),
                    ))
                }
            }
        }

        if self.refresh.refresh_interval_ms == 0 {
            return Err(invalid("refresh.refresh_interval_ms", "must be greater than 0"));
        }
        if self.refresh.auth_max_attempts == 0 {
            return Err(invalid("refresh.auth_max_attempts", "must be at least 1"));
        }
        if self.refresh.cycle_timeout_secs == 0 {
            return Err(invalid("refresh.cycle_timeout_secs", "must be greater than 0"));
        }
        if self.refresh.initial_backoff_ms > self.refresh.max_backoff_ms {
            return Err(invalid(
                "refresh.initial_backoff_ms",
                "must not exceed refresh.max_backoff_ms",
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("MICROSOFT_TENANT_ID") {
            debug!(tenant_id = %id, "Overriding tenant ID from environment");
            self.provider.tenant_id = id;
        }

        if let Ok(id) = std::env::var("MICROSOFT_CLIENT_ID") {
            debug!(client_id = %id, "Overriding client ID from environment");
            self.provider.client_id = id;
        }

        if let Ok(secret) = std::env::var("MICROSOFT_CLIENT_SECRET") {
            self.provider.client_secret = secret;
        }

        if let Ok(api) = std::env::var("OPSBOARD_LIST_API") {
            match api.parse() {
                Ok(parsed) => self.provider.list_api = parsed,
                Err(_) => warn!(list_api = %api, "Unknown list API in environment"),
            }
        }

        if let Ok(url) = std::env::var("OPSBOARD_SHAREPOINT_SITE_URL") {
            self.provider.sharepoint_site_url = Some(url);
        }

        if let Ok(path) = std::env::var("OPSBOARD_SITE_PATH") {
            debug!(site_path = %path, "Overriding site path from environment");
            self.site.path = path;
        }

        if let Ok(name) = std::env::var("OPSBOARD_TICKET_LIST") {
            self.site.ticket_list = name;
        }

        if let Ok(name) = std::env::var("OPSBOARD_ASSET_LIST") {
            self.site.asset_list = name;
        }

        if let Ok(interval) = std::env::var("OPSBOARD_REFRESH_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(ms) => {
                    debug!(interval_ms = ms, "Overriding refresh interval from environment");
                    self.refresh.refresh_interval_ms = ms;
                }
                Err(_) => warn!(value = %interval, "Ignoring non-numeric OPSBOARD_REFRESH_INTERVAL_MS"),
            }
        }

        if let Ok(flag) = std::env::var("OPSBOARD_DEMO_FALLBACK") {
            self.refresh.demo_fallback = flag != "false" && flag != "0";
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "opsboard", "opsboard")
            .map(|dirs| dirs.config_dir().join("opsboard.toml"))
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(key, &e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(key, &format!("unsupported scheme '{}'", other))),
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DashboardConfig {
        let mut config = DashboardConfig::default();
        config.provider.tenant_id = "tenant".into();
        config.provider.client_id = "client".into();
        config.provider.client_secret = "secret".into();
        config.site.path = "contoso.sharepoint.com:/sites/it".into();
        config.site.ticket_list = "Issue tracker".into();
        config.site.asset_list = "IT Asset List Copy".into();
        config
    }

    #[test]
    fn test_default_refresh_settings() {
        let config = DashboardConfig::default();
        assert_eq!(config.refresh.refresh_interval_ms, 300_000);
        assert_eq!(config.refresh.auth_max_attempts, 3);
        assert_eq!(config.refresh.recent_limit, 5);
        assert!(config.refresh.demo_fallback);
        assert_eq!(config.provider.list_api, ListApi::Graph);
    }

    #[test]
    fn test_missing_required_values() {
        let err = DashboardConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref k) if k == "provider.tenant_id"));

        let mut config = valid_config();
        config.provider.client_secret = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref k) if k == "provider.client_secret"));

        let mut config = valid_config();
        config.site.asset_list.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.provider.graph_base_url = "ftp://graph".into();
        assert!(config.validate().is_err());

        config = valid_config();
        config.refresh.refresh_interval_ms = 0;
        assert!(config.validate().is_err());

        config = valid_config();
        config.refresh.auth_max_attempts = 0;
        assert!(config.validate().is_err());

        config = valid_config();
        config.provider.list_api = ListApi::SharepointRest;
        assert!(config.validate().is_err());
        config.provider.sharepoint_site_url = Some("https://contoso.sharepoint.com/sites/it".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_list_api_parsing() {
        assert_eq!("graph".parse::<ListApi>().unwrap(), ListApi::Graph);
        assert_eq!("delegated".parse::<ListApi>().unwrap(), ListApi::SharepointRest);
        assert!("soap".parse::<ListApi>().is_err());
    }

    #[test]
    fn test_toml_parsing_with_camel_case_interval() {
        let config = DashboardConfig::from_toml(
            r#"
            [provider]
            tenant_id = "t"
            client_id = "c"
            list_api = "sharepoint_rest"
            sharepoint_site_url = "https://contoso.sharepoint.com/sites/it"

            [site]
            path = "contoso.sharepoint.com:/sites/it"
            ticket_list = "Issue tracker"
            asset_list = "Assets"

            [refresh]
            refreshIntervalMs = 60000
            "#,
        )
        .unwrap();

        assert_eq!(config.refresh.refresh_interval_ms, 60_000);
        assert_eq!(config.refresh.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.provider.list_api, ListApi::SharepointRest);
        assert_eq!(config.provider.scope, "https://graph.microsoft.com/.default");
    }

    #[test]
    fn test_token_url() {
        let mut config = valid_config();
        config.provider.authority_url = "https://login.example.com/".into();
        assert_eq!(
            config.provider.token_url(),
            "https://login.example.com/tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = valid_config();
        let debug = format!("{:?}", config.provider);
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("<redacted>"));

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[provider]"));
        assert!(!toml_str.contains("client_secret"));
    }
}
