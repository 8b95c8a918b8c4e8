//! # opsboard-sync: Sync Engine for Opsboard
//!
//! Keeps the dashboard snapshot fresh: obtains credentials, reads the two
//! provider lists, computes metrics and publishes the result, falling back
//! to demo data when the provider is unreachable.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Components                           │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐     │
//! │  │RefreshScheduler│  │ SyncController │  │   CredentialProvider   │     │
//! │  │                │  │                │  │                        │     │
//! │  │ Interval timer │─►│ Single-flight  │─►│ client_credentials     │     │
//! │  │ Visibility     │  │ cycle + demo   │  │ grant with backoff     │     │
//! │  │ Manual / F5    │  │ fallback       │  └────────────────────────┘     │
//! │  └────────────────┘  │                │  ┌────────────────────────┐     │
//! │                      │                │─►│   ResourceLocator      │     │
//! │                      │                │  │   site path → site id  │     │
//! │                      │                │  └────────────────────────┘     │
//! │                      │                │  ┌────────────────────────┐     │
//! │                      │                │─►│   ListFetcher          │     │
//! │                      └───────┬────────┘  │   tickets ∥ assets     │     │
//! │                              │           └────────────────────────┘     │
//! │                              ▼                                          │
//! │           watch<MetricsSnapshot>, watch<ConnectionStatus>,              │
//! │           DashboardEventEmitter                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use opsboard_sync::{DashboardConfig, RefreshScheduler, SyncController};
//!
//! # async fn run() -> opsboard_sync::SyncResult<()> {
//! let config = DashboardConfig::load(None)?;
//! let interval = config.refresh.refresh_interval();
//!
//! let controller = Arc::new(SyncController::new(config)?);
//! let scheduler = RefreshScheduler::new(controller.clone(), interval);
//! scheduler.launch().await;
//!
//! if let Some(snapshot) = controller.snapshot() {
//!     println!("{} overdue tickets", snapshot.overdue_tickets);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod locator;
pub mod scheduler;

// Re-exports
pub use auth::{Credential, CredentialProvider};
pub use config::{DashboardConfig, ListApi, ProviderSettings, RefreshSettings, SiteSettings};
pub use controller::{
    DashboardEventEmitter, NoOpEmitter, RefreshOutcome, RefreshTrigger, SyncController,
};
pub use error::{AuthError, ConfigError, FetchError, LookupError, SyncError, SyncResult};
pub use fetcher::ListFetcher;
pub use locator::{ResourceLocator, SiteHandle};
pub use scheduler::{is_refresh_shortcut, RefreshScheduler, RefreshTarget, Visibility};
