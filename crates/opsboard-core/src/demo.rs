//! # Demo Dataset
//!
//! Canned tickets and assets shown whenever live data is unavailable. The
//! records are built as raw provider items so they travel through the same
//! alias chains as live data.

use serde_json::{json, Value};

use crate::record::RawRecord;

/// Raw demo helpdesk tickets.
pub fn demo_tickets() -> Vec<RawRecord> {
    to_records(json!([
        {
            "Title": "New laptop setup for John Doe",
            "Status": "In Progress",
            "Priority": "High",
            "Assignee": "IT Team",
            "Created": "2025-12-01",
            "Category": "Onboarding"
        },
        {
            "Title": "VPN access issue",
            "Status": "New",
            "Priority": "Medium",
            "Assignee": "IT Team",
            "Created": "2025-12-05",
            "Category": "Support"
        },
        {
            "Title": "Printer not working",
            "Status": "Overdue",
            "Priority": "High",
            "Assignee": "IT Team",
            "Created": "2025-11-28",
            "Category": "Hardware"
        },
        {
            "Title": "Email configuration for Sarah",
            "Status": "In Progress",
            "Priority": "Medium",
            "Assignee": "IT Team",
            "Created": "2025-12-04",
            "Category": "Onboarding"
        }
    ]))
}

/// Raw demo IT assets.
pub fn demo_assets() -> Vec<RawRecord> {
    to_records(json!([
        {
            "Title": "Laptop - Dell XPS 15",
            "Status": "In Use",
            "WarrantyExpiry": "2026-03-15",
            "Type": "Hardware",
            "AssignedTo": "John Doe"
        },
        {
            "Title": "Microsoft Office License",
            "Status": "Active",
            "WarrantyExpiry": "2025-12-31",
            "Type": "Software",
            "AssignedTo": "HR Department"
        },
        {
            "Title": "Server Backup License",
            "Status": "Expiring Soon",
            "WarrantyExpiry": "2025-12-15",
            "Type": "Software",
            "AssignedTo": "IT Team"
        }
    ]))
}

fn to_records(items: Value) -> Vec<RawRecord> {
    match items {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| RawRecord::from_item(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AssetRecord, TicketRecord, STATUS, WARRANTY_EXPIRY};

    #[test]
    fn test_demo_sizes() {
        assert_eq!(demo_tickets().len(), 4);
        assert_eq!(demo_assets().len(), 3);
    }

    #[test]
    fn test_demo_uses_alias_chains() {
        let tickets = demo_tickets();
        assert_eq!(tickets[1].field(STATUS), "New");

        let assets = demo_assets();
        assert_eq!(assets[2].field(WARRANTY_EXPIRY), "2025-12-15");
    }

    #[test]
    fn test_demo_dates_parse() {
        assert!(demo_tickets()
            .iter()
            .map(TicketRecord::from_raw)
            .all(|t| t.created_at.is_some()));
        assert!(demo_assets()
            .iter()
            .map(AssetRecord::from_raw)
            .all(|a| a.expires_at.is_some()));
    }
}
