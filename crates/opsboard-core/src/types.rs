//! # Domain Types
//!
//! Types shared with the presentation layer. All of them derive `TS` so the
//! dashboard frontend consumes the exact same shapes.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌─────────────────┐    │
//! │  │  MetricsSnapshot    │   │   DataSource    │   │ ConnectionState │    │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ─────────────  │    │
//! │  │  overdue_tickets    │   │  Live           │   │  Idle           │    │
//! │  │  new_joiners        │   │  Demo           │   │  Connecting     │    │
//! │  │  renewals_due       │   │  Error          │   │  Connected      │    │
//! │  │  asset_alerts       │   └─────────────────┘   │  Error          │    │
//! │  │  totals             │                         └─────────────────┘    │
//! │  │  recent_tickets ────┼──► RecentTicket { .., badge: StatusBadge }     │
//! │  └─────────────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Data Source
// =============================================================================

/// Where the numbers in a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Fetched from the provider during this cycle.
    Live,
    /// Computed over the canned demo dataset.
    #[default]
    Demo,
    /// No snapshot could be produced.
    Error,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Live => write!(f, "live"),
            DataSource::Demo => write!(f, "demo"),
            DataSource::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Sync controller connection state.
///
/// ```text
///   Idle ──► Connecting ──┬──► Connected (Live | Demo)
///                ▲        └──► Error
///                └───── every refresh cycle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No cycle has run yet.
    #[default]
    Idle,
    /// A refresh cycle is in flight.
    Connecting,
    /// Last cycle produced a snapshot (live or demo).
    Connected,
    /// Last cycle produced nothing.
    Error,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error => write!(f, "error"),
        }
    }
}

/// Connection state plus the human-readable line shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConnectionStatus {
    pub state: ConnectionState,

    /// Status line for the header, e.g. "Connected to Microsoft 365 (Demo Data)".
    pub message: String,

    /// Source tag of the snapshot currently on display.
    pub source: DataSource,

    /// Underlying failure of the last cycle, kept for diagnostics only.
    pub last_error: Option<String>,

    /// When the last cycle finished.
    #[ts(as = "Option<String>")]
    pub last_cycle_at: Option<DateTime<Local>>,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus {
            state: ConnectionState::Idle,
            message: "Not connected".to_string(),
            source: DataSource::Demo,
            last_error: None,
            last_cycle_at: None,
        }
    }
}

// =============================================================================
// Status Badge
// =============================================================================

/// Display badge for a ticket status.
///
/// Purely cosmetic: the overdue metric uses its own exact-match rule and
/// never consults this classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusBadge {
    Closed,
    Overdue,
    InProgress,
    Default,
}

impl StatusBadge {
    /// Classifies a free-text status by substring, first match wins.
    pub fn classify(status: &str) -> Self {
        let lower = status.to_lowercase();
        if lower.contains("closed") || lower.contains("complete") {
            StatusBadge::Closed
        } else if lower.contains("overdue") || lower.contains("critical") {
            StatusBadge::Overdue
        } else if lower.contains("progress") || lower.contains("new") {
            StatusBadge::InProgress
        } else {
            StatusBadge::Default
        }
    }
}

// =============================================================================
// Recent Ticket
// =============================================================================

/// One row of the "recent tickets" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecentTicket {
    pub title: String,
    /// Category, or "General" when empty.
    pub category: String,
    /// Assignee, or "Unassigned" when empty.
    pub assignee: String,
    /// Status, or "Unknown" when empty.
    pub status: String,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Local>>,
    pub badge: StatusBadge,
}

// =============================================================================
// Metrics Snapshot
// =============================================================================

/// Fully computed metrics for one refresh cycle.
///
/// Immutable once produced; the controller swaps whole snapshots and never
/// mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MetricsSnapshot {
    /// Open tickets created more than 7 days ago.
    pub overdue_tickets: usize,

    /// Onboarding tickets that are "New" or "In Progress".
    pub new_joiners: usize,

    /// Assets whose warranty/licence expires within 30 days (or already has).
    pub renewals_due: usize,

    /// Assets flagged critical / at risk / expiring.
    pub asset_alerts: usize,

    pub total_tickets: usize,
    pub total_assets: usize,

    /// Days until the first due renewal (provider order), if any is due.
    pub next_renewal_in_days: Option<i64>,

    /// First few tickets in provider order.
    pub recent_tickets: Vec<RecentTicket>,

    #[ts(as = "String")]
    pub computed_at: DateTime<Local>,

    pub source: DataSource,
}

impl MetricsSnapshot {
    /// Human-readable "next renewal" detail line.
    pub fn next_renewal_label(&self) -> String {
        match self.next_renewal_in_days {
            Some(days) => format!("{} days", days),
            None => "None".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_display() {
        assert_eq!(DataSource::Live.to_string(), "live");
        assert_eq!(DataSource::Demo.to_string(), "demo");
    }

    #[test]
    fn test_badge_classification() {
        assert_eq!(StatusBadge::classify("Closed"), StatusBadge::Closed);
        assert_eq!(StatusBadge::classify("closed"), StatusBadge::Closed);
        assert_eq!(StatusBadge::classify("Completed"), StatusBadge::Closed);
        assert_eq!(StatusBadge::classify("Overdue"), StatusBadge::Overdue);
        assert_eq!(StatusBadge::classify("In Progress"), StatusBadge::InProgress);
        assert_eq!(StatusBadge::classify("New"), StatusBadge::InProgress);
        assert_eq!(StatusBadge::classify(""), StatusBadge::Default);
        assert_eq!(StatusBadge::classify("On hold"), StatusBadge::Default);
    }

    #[test]
    fn test_connection_status_default() {
        let status = ConnectionStatus::default();
        assert_eq!(status.state, ConnectionState::Idle);
        assert!(status.last_error.is_none());
    }

    #[test]
    fn test_next_renewal_label() {
        let mut snapshot = MetricsSnapshot {
            overdue_tickets: 0,
            new_joiners: 0,
            renewals_due: 0,
            asset_alerts: 0,
            total_tickets: 0,
            total_assets: 0,
            next_renewal_in_days: None,
            recent_tickets: Vec::new(),
            computed_at: Local::now(),
            source: DataSource::Live,
        };
        assert_eq!(snapshot.next_renewal_label(), "None");
        snapshot.next_renewal_in_days = Some(12);
        assert_eq!(snapshot.next_renewal_label(), "12 days");
    }
}
