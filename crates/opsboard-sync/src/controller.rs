//! # Sync Controller
//!
//! Runs refresh cycles and owns the published dashboard state.
//!
//! ## Refresh Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Refresh Cycle                                  │
//! │                                                                         │
//! │  refresh(trigger)                                                       │
//! │     │                                                                   │
//! │     ├── cycle in flight? ──► wait for it ──► Coalesced                  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Connecting ──► credential ──► site ──► tickets ┐                       │
//! │                 (retries)              assets  ─┴► metrics ──► Live     │
//! │                    │             │                                      │
//! │                    └──── fail ───┴──── or cycle timeout                 │
//! │                                   │                                     │
//! │                    demo_fallback? ├── yes ──► demo metrics ──► Demo     │
//! │                                   └── no  ──► Error (snapshot kept)     │
//! │                                                                         │
//! │  PUBLISHED STATE:                                                       │
//! │  ────────────────                                                       │
//! │  watch<Option<Arc<MetricsSnapshot>>>  - latest snapshot                 │
//! │  watch<ConnectionStatus>              - state + status line             │
//! │  DashboardEventEmitter                - push notifications              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed list fetch never reaches this level: the fetcher substitutes an
//! empty list and the cycle still ends `Live`.

use chrono::Local;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use opsboard_core::{demo, metrics, record, ConnectionState, ConnectionStatus, DataSource, MetricsSnapshot};

use crate::auth::CredentialProvider;
use crate::config::DashboardConfig;
use crate::error::{SyncError, SyncResult};
use crate::fetcher::ListFetcher;
use crate::locator::ResourceLocator;

pub const CONNECTING_MESSAGE: &str = "Connecting to Microsoft 365...";
pub const LIVE_MESSAGE: &str = "Connected to Microsoft 365";
pub const DEMO_MESSAGE: &str = "Connected to Microsoft 365 (Demo Data)";
pub const ERROR_MESSAGE: &str = "Unable to reach Microsoft 365";

// =============================================================================
// Triggers and Outcomes
// =============================================================================

/// What asked for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// First refresh after launch.
    Startup,
    /// Periodic timer tick.
    Interval,
    /// Refresh button.
    Manual,
    /// F5 / Ctrl+R.
    Keyboard,
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTrigger::Startup => write!(f, "startup"),
            RefreshTrigger::Interval => write!(f, "interval"),
            RefreshTrigger::Manual => write!(f, "manual"),
            RefreshTrigger::Keyboard => write!(f, "keyboard"),
        }
    }
}

/// How a refresh request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Live data published.
    Live,
    /// Demo data published after a failure.
    Demo,
    /// Nothing published; the controller is in the error state.
    Failed,
    /// Joined a cycle that was already running.
    Coalesced,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives state changes as they happen (implemented by the frontend host).
pub trait DashboardEventEmitter: Send + Sync {
    /// Emits a connection status change.
    fn emit_status(&self, status: &ConnectionStatus);

    /// Emits a newly published snapshot.
    fn emit_snapshot(&self, snapshot: &MetricsSnapshot);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl DashboardEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &ConnectionStatus) {}
    fn emit_snapshot(&self, _snapshot: &MetricsSnapshot) {}
}

// =============================================================================
// Sync Controller
// =============================================================================

pub struct SyncController {
    config: Arc<DashboardConfig>,

    credentials: CredentialProvider,
    locator: ResourceLocator,
    fetcher: ListFetcher,

    /// Event emitter for frontend notifications.
    emitter: Arc<dyn DashboardEventEmitter>,

    /// Held for the duration of a cycle.
    cycle_lock: Mutex<()>,

    snapshot_tx: watch::Sender<Option<Arc<MetricsSnapshot>>>,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl SyncController {
    /// Creates a controller that publishes only through its watch channels.
    pub fn new(config: DashboardConfig) -> SyncResult<Self> {
        Self::with_emitter(config, Arc::new(NoOpEmitter))
    }

    /// Creates a controller with a custom event emitter.
    pub fn with_emitter(config: DashboardConfig, emitter: Arc<dyn DashboardEventEmitter>) -> SyncResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.refresh.request_timeout())
            .build()?;

        let credentials = CredentialProvider::new(client.clone(), config.provider.clone(), &config.refresh);
        let locator = ResourceLocator::new(client.clone(), &config.provider.graph_base_url, &config.site.path);
        let fetcher = ListFetcher::new(client, &config.provider);

        let (snapshot_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(ConnectionStatus::default());

        Ok(SyncController {
            config: Arc::new(config),
            credentials,
            locator,
            fetcher,
            emitter,
            cycle_lock: Mutex::new(()),
            snapshot_tx,
            status_tx,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Latest published snapshot, if any cycle has produced one.
    pub fn snapshot(&self) -> Option<Arc<MetricsSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<Arc<MetricsSnapshot>>> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Cycles in a row that could not obtain a credential.
    pub fn consecutive_auth_failures(&self) -> u32 {
        self.credentials.consecutive_failures()
    }

    /// Runs one refresh cycle, or waits for the one already in flight.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let _guard = match self.cycle_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(%trigger, "Refresh already in flight, joining it");
                let _joined = self.cycle_lock.lock().await;
                return RefreshOutcome::Coalesced;
            }
        };

        let cycle_id = Uuid::new_v4();
        let span = info_span!("refresh_cycle", %cycle_id, %trigger);
        self.run_cycle().instrument(span).await
    }

    async fn run_cycle(&self) -> RefreshOutcome {
        info!("Refresh cycle started");
        self.set_status(ConnectionState::Connecting, CONNECTING_MESSAGE, self.status().source, None);

        let budget = self.config.refresh.cycle_timeout();
        let failure = match timeout(budget, self.fetch_live()).await {
            Ok(Ok(snapshot)) => {
                info!(
                    total_tickets = snapshot.total_tickets,
                    total_assets = snapshot.total_assets,
                    "Live snapshot published"
                );
                self.publish_snapshot(snapshot);
                self.set_status(ConnectionState::Connected, LIVE_MESSAGE, DataSource::Live, None);
                return RefreshOutcome::Live;
            }
            Ok(Err(e)) => e,
            Err(_) => SyncError::Timeout(budget.as_secs()),
        };

        self.recover(failure)
    }

    /// Credential, site, both lists, metrics.
    async fn fetch_live(&self) -> SyncResult<MetricsSnapshot> {
        let credential = self.credentials.acquire().await?;
        let site = self.locator.resolve(&credential).await?;

        let (raw_tickets, raw_assets) = self
            .fetcher
            .fetch_both(
                &credential,
                &site,
                &self.config.site.ticket_list,
                &self.config.site.asset_list,
            )
            .await;

        let tickets = record::tickets_from_raw(&raw_tickets);
        let assets = record::assets_from_raw(&raw_assets);

        Ok(metrics::compute_with_limit(
            &tickets,
            &assets,
            Local::now(),
            DataSource::Live,
            self.config.refresh.recent_limit,
        ))
    }

    /// Substitutes demo data, or enters the error state when that is disabled.
    fn recover(&self, failure: SyncError) -> RefreshOutcome {
        let detail = failure.to_string();
        let retryable = failure.is_retryable();

        if !self.config.refresh.demo_fallback {
            warn!(error = %detail, retryable, "Refresh failed, keeping previous snapshot");
            self.set_status(ConnectionState::Error, ERROR_MESSAGE, DataSource::Error, Some(detail));
            return RefreshOutcome::Failed;
        }

        warn!(error = %detail, retryable, "Refresh failed, falling back to demo data");
        self.publish_snapshot(demo_snapshot(self.config.refresh.recent_limit));
        self.set_status(ConnectionState::Connected, DEMO_MESSAGE, DataSource::Demo, Some(detail));
        RefreshOutcome::Demo
    }

    fn publish_snapshot(&self, snapshot: MetricsSnapshot) {
        self.emitter.emit_snapshot(&snapshot);
        self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
    }

    fn set_status(&self, state: ConnectionState, message: &str, source: DataSource, last_error: Option<String>) {
        let last_cycle_at = match state {
            ConnectionState::Connecting | ConnectionState::Idle => self.status_tx.borrow().last_cycle_at,
            ConnectionState::Connected | ConnectionState::Error => Some(Local::now()),
        };

        let status = ConnectionStatus {
            state,
            message: message.to_string(),
            source,
            last_error,
            last_cycle_at,
        };

        debug!(state = %status.state, source = %status.source, "Status changed");
        self.emitter.emit_status(&status);
        self.status_tx.send_replace(status);
    }
}

/// Metrics over the canned dataset, tagged `Demo`.
pub fn demo_snapshot(recent_limit: usize) -> MetricsSnapshot {
    let tickets = record::tickets_from_raw(&demo::demo_tickets());
    let assets = record::assets_from_raw(&demo::demo_assets());
    metrics::compute_with_limit(&tickets, &assets, Local::now(), DataSource::Demo, recent_limit)
}
