//! # Metrics Engine
//!
//! Pure function from raw ticket/asset records to a [`MetricsSnapshot`].
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Metric Definitions                             │
//! │                                                                         │
//! │  overdue_tickets   created < now - 7d   AND  status != "Closed"         │
//! │                    (exact, case-sensitive; unparseable date = no)       │
//! │                                                                         │
//! │  new_joiners       category ~ "onboarding" (case-insensitive)           │
//! │                    AND status ∈ { "In Progress", "New" } (exact)        │
//! │                                                                         │
//! │  renewals_due      expiry <= now + 30d                                  │
//! │                    (no parseable expiry = excluded)                     │
//! │                                                                         │
//! │  asset_alerts      status ~ "critical" | "risk" | "expiring"            │
//! │                    (lowercased substring)                               │
//! │                                                                         │
//! │  All windows are millisecond offsets from `now` in the local zone.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Running [`compute`] twice on the same input yields equal snapshots.

use chrono::{DateTime, Duration, Local};

use crate::dates::{days_until_ceil, DAY_MS};
use crate::record::{AssetRecord, TicketRecord};
use crate::types::{DataSource, MetricsSnapshot, RecentTicket, StatusBadge};

// =============================================================================
// Constants
// =============================================================================

/// Age after which an open ticket counts as overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 7;

/// Look-ahead window for warranty/licence renewals.
pub const RENEWAL_WINDOW_DAYS: i64 = 30;

/// Default length of the recent-tickets projection.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// The only status that closes a ticket for the overdue rule.
pub const CLOSED_STATUS: &str = "Closed";

const JOINER_STATUSES: &[&str] = &["In Progress", "New"];
const ALERT_KEYWORDS: &[&str] = &["critical", "risk", "expiring"];

// =============================================================================
// Predicates
// =============================================================================

/// Overdue: open (status is not exactly "Closed") and created before the cutoff.
pub fn is_overdue(ticket: &TicketRecord, cutoff: DateTime<Local>) -> bool {
    match ticket.created_at {
        Some(created) => created < cutoff && ticket.status != CLOSED_STATUS,
        None => false,
    }
}

pub fn is_new_joiner(ticket: &TicketRecord) -> bool {
    ticket.category.to_lowercase().contains("onboarding")
        && JOINER_STATUSES.contains(&ticket.status.as_str())
}

/// Renewal due: has a parseable expiry at or before the horizon.
pub fn is_renewal_due(asset: &AssetRecord, horizon: DateTime<Local>) -> bool {
    asset.expires_at.is_some_and(|expiry| expiry <= horizon)
}

pub fn is_asset_alert(asset: &AssetRecord) -> bool {
    let status = asset.status.to_lowercase();
    ALERT_KEYWORDS.iter().any(|kw| status.contains(kw))
}

// =============================================================================
// Projection
// =============================================================================

/// First `limit` tickets in provider order, with display defaults applied.
pub fn recent_tickets(tickets: &[TicketRecord], limit: usize) -> Vec<RecentTicket> {
    tickets
        .iter()
        .take(limit)
        .map(|t| RecentTicket {
            title: t.title.clone(),
            category: or_default(&t.category, "General"),
            assignee: or_default(&t.assignee, "Unassigned"),
            status: or_default(&t.status, "Unknown"),
            created_at: t.created_at,
            badge: StatusBadge::classify(&t.status),
        })
        .collect()
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

// =============================================================================
// Compute
// =============================================================================

/// Computes a snapshot with the default recent-ticket limit.
pub fn compute(
    tickets: &[TicketRecord],
    assets: &[AssetRecord],
    now: DateTime<Local>,
    source: DataSource,
) -> MetricsSnapshot {
    compute_with_limit(tickets, assets, now, source, DEFAULT_RECENT_LIMIT)
}

/// Computes a snapshot, projecting at most `recent_limit` recent tickets.
pub fn compute_with_limit(
    tickets: &[TicketRecord],
    assets: &[AssetRecord],
    now: DateTime<Local>,
    source: DataSource,
    recent_limit: usize,
) -> MetricsSnapshot {
    let overdue_cutoff = now - Duration::milliseconds(OVERDUE_AFTER_DAYS * DAY_MS);
    let renewal_horizon = now + Duration::milliseconds(RENEWAL_WINDOW_DAYS * DAY_MS);

    let overdue_tickets = tickets
        .iter()
        .filter(|t| is_overdue(t, overdue_cutoff))
        .count();

    let new_joiners = tickets.iter().filter(|t| is_new_joiner(t)).count();

    let mut due = assets.iter().filter(|a| is_renewal_due(a, renewal_horizon));
    let next_renewal_in_days = due
        .next()
        .and_then(|first| first.expires_at)
        .map(|expiry| days_until_ceil(now, expiry));
    let renewals_due = usize::from(next_renewal_in_days.is_some()) + due.count();

    let asset_alerts = assets.iter().filter(|a| is_asset_alert(a)).count();

    MetricsSnapshot {
        overdue_tickets,
        new_joiners,
        renewals_due,
        asset_alerts,
        total_tickets: tickets.len(),
        total_assets: assets.len(),
        next_renewal_in_days,
        recent_tickets: recent_tickets(tickets, recent_limit),
        computed_at: now,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;
    use serde_json::{json, Value};

    fn ticket(value: Value) -> TicketRecord {
        TicketRecord::from_raw(&RawRecord::from_item(value).unwrap())
    }

    fn asset(value: Value) -> AssetRecord {
        AssetRecord::from_raw(&RawRecord::from_item(value).unwrap())
    }

    fn rfc(dt: DateTime<Local>) -> String {
        dt.to_rfc3339()
    }

    #[test]
    fn test_closed_old_ticket_is_not_overdue() {
        let now = Local::now();
        let tickets = vec![ticket(json!({
            "Status": "Closed",
            "Created": rfc(now - Duration::days(10)),
        }))];
        let snapshot = compute(&tickets, &[], now, DataSource::Live);
        assert_eq!(snapshot.overdue_tickets, 0);
    }

    #[test]
    fn test_open_old_ticket_is_overdue() {
        let now = Local::now();
        let tickets = vec![ticket(json!({
            "Status": "In Progress",
            "Created": rfc(now - Duration::days(10)),
        }))];
        assert_eq!(compute(&tickets, &[], now, DataSource::Live).overdue_tickets, 1);
    }

    #[test]
    fn test_closed_match_is_case_sensitive() {
        let now = Local::now();
        let old = rfc(now - Duration::days(10));
        let tickets = vec![
            ticket(json!({ "Status": "closed", "Created": old })),
            ticket(json!({ "Status": "Complete", "Created": old })),
            ticket(json!({ "Status": "Closed", "Created": old })),
        ];
        assert_eq!(compute(&tickets, &[], now, DataSource::Live).overdue_tickets, 2);
    }

    #[test]
    fn test_recent_or_undated_ticket_is_not_overdue() {
        let now = Local::now();
        let tickets = vec![
            ticket(json!({ "Status": "New", "Created": rfc(now - Duration::days(6)) })),
            ticket(json!({ "Status": "New" })),
            ticket(json!({ "Status": "New", "Created": "not a date" })),
        ];
        assert_eq!(compute(&tickets, &[], now, DataSource::Live).overdue_tickets, 0);
    }

    #[test]
    fn test_overdue_is_subset_of_not_closed() {
        let now = Local::now();
        let statuses = ["Closed", "closed", "New", "In Progress", "", "Resolved"];
        let ages = [0, 3, 7, 8, 30];
        let tickets: Vec<_> = statuses
            .iter()
            .flat_map(|s| {
                ages.iter().map(move |d| {
                    ticket(json!({ "Status": s, "Created": rfc(now - Duration::days(*d)) }))
                })
            })
            .collect();

        let cutoff = now - Duration::days(OVERDUE_AFTER_DAYS);
        for t in &tickets {
            if is_overdue(t, cutoff) {
                assert_ne!(t.status, "Closed");
            }
        }
        let open = tickets.iter().filter(|t| t.status != "Closed").count();
        assert!(compute(&tickets, &[], now, DataSource::Live).overdue_tickets <= open);
    }

    #[test]
    fn test_onboarding_new_is_joiner() {
        let tickets = vec![ticket(json!({ "Category": "Onboarding", "Status": "New" }))];
        assert_eq!(compute(&tickets, &[], Local::now(), DataSource::Live).new_joiners, 1);
    }

    #[test]
    fn test_joiner_rules() {
        let tickets = vec![
            ticket(json!({ "category": "Staff onboarding", "status": "In Progress" })),
            ticket(json!({ "Category": "Onboarding", "Status": "new" })),
            ticket(json!({ "Category": "Onboarding", "Status": "Closed" })),
            ticket(json!({ "Category": "Support", "Status": "New" })),
        ];
        assert_eq!(compute(&tickets, &[], Local::now(), DataSource::Live).new_joiners, 1);
    }

    #[test]
    fn test_renewal_window_boundary() {
        let now = Local::now();
        let inside = vec![asset(json!({ "WarrantyExpiry": rfc(now + Duration::days(29)) }))];
        let outside = vec![asset(json!({ "WarrantyExpiry": rfc(now + Duration::days(31)) }))];

        assert_eq!(compute(&[], &inside, now, DataSource::Live).renewals_due, 1);
        assert_eq!(compute(&[], &outside, now, DataSource::Live).renewals_due, 0);
    }

    #[test]
    fn test_expired_asset_counts_as_due() {
        let now = Local::now();
        let assets = vec![asset(json!({ "ExpiryDate": rfc(now - Duration::days(3)) }))];
        let snapshot = compute(&[], &assets, now, DataSource::Live);
        assert_eq!(snapshot.renewals_due, 1);
        assert_eq!(snapshot.next_renewal_in_days, Some(-3));
    }

    #[test]
    fn test_asset_without_expiry_is_never_due() {
        let now = Local::now();
        let assets = vec![
            asset(json!({ "Title": "No expiry" })),
            asset(json!({ "WarrantyExpiry": "" })),
            asset(json!({ "WarrantyExpiry": "TBD" })),
            asset(json!({ "RenewalDate": rfc(now) })),
        ];
        let snapshot = compute(&[], &assets, now, DataSource::Live);
        assert_eq!(snapshot.renewals_due, 0);
        assert_eq!(snapshot.next_renewal_in_days, None);
    }

    #[test]
    fn test_expiry_alias_priority() {
        let now = Local::now();
        let assets = vec![asset(json!({
            "WarrantyExpiry": rfc(now + Duration::days(90)),
            "ExpiryDate": rfc(now + Duration::days(1)),
        }))];
        assert_eq!(compute(&[], &assets, now, DataSource::Live).renewals_due, 0);
    }

    #[test]
    fn test_next_renewal_uses_first_due_asset() {
        let now = Local::now();
        let assets = vec![
            asset(json!({ "WarrantyExpiry": rfc(now + Duration::days(200)) })),
            asset(json!({ "WarrantyExpiry": rfc(now + Duration::days(10)) })),
            asset(json!({ "WarrantyExpiry": rfc(now + Duration::days(2)) })),
        ];
        let snapshot = compute(&[], &assets, now, DataSource::Live);
        assert_eq!(snapshot.renewals_due, 2);
        assert_eq!(snapshot.next_renewal_in_days, Some(10));
    }

    #[test]
    fn test_asset_alerts_substring() {
        let assets = vec![
            asset(json!({ "Status": "CRITICAL" })),
            asset(json!({ "status": "At Risk" })),
            asset(json!({ "Status": "Expiring Soon" })),
            asset(json!({ "Status": "In Use" })),
        ];
        let snapshot = compute(&[], &assets, Local::now(), DataSource::Live);
        assert_eq!(snapshot.asset_alerts, 3);
        assert_eq!(snapshot.total_assets, 4);
    }

    #[test]
    fn test_recent_tickets_projection() {
        let tickets: Vec<_> = (0..7)
            .map(|i| ticket(json!({ "Title": format!("T{}", i) })))
            .collect();
        let snapshot = compute(&tickets, &[], Local::now(), DataSource::Live);
        assert_eq!(snapshot.recent_tickets.len(), 5);
        assert_eq!(snapshot.recent_tickets[0].title, "T0");
        assert_eq!(snapshot.recent_tickets[4].title, "T4");
        assert_eq!(snapshot.recent_tickets[0].category, "General");
        assert_eq!(snapshot.recent_tickets[0].assignee, "Unassigned");
        assert_eq!(snapshot.recent_tickets[0].status, "Unknown");
        assert_eq!(snapshot.recent_tickets[0].badge, StatusBadge::Default);
    }

    #[test]
    fn test_custom_recent_limit() {
        let tickets: Vec<_> = (0..3).map(|_| ticket(json!({ "Title": "x" }))).collect();
        let snapshot = compute_with_limit(&tickets, &[], Local::now(), DataSource::Live, 2);
        assert_eq!(snapshot.recent_tickets.len(), 2);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let now = Local::now();
        let tickets = vec![
            ticket(json!({ "Status": "New", "Category": "Onboarding", "Created": rfc(now - Duration::days(9)) })),
            ticket(json!({ "Status": "Closed", "Created": rfc(now - Duration::days(20)) })),
        ];
        let assets = vec![asset(json!({ "Status": "Risk", "WarrantyExpiry": rfc(now + Duration::days(5)) }))];

        let first = compute(&tickets, &assets, now, DataSource::Live);
        let second = compute(&tickets, &assets, now, DataSource::Live);
        assert_eq!(first, second);
    }

    #[test]
    fn test_totals_and_source() {
        let tickets = vec![ticket(json!({})), ticket(json!({}))];
        let snapshot = compute(&tickets, &[], Local::now(), DataSource::Demo);
        assert_eq!(snapshot.total_tickets, 2);
        assert_eq!(snapshot.total_assets, 0);
        assert_eq!(snapshot.source, DataSource::Demo);
    }
}
