//! # Provider Records
//!
//! Loosely-typed list items and the typed views the metrics engine reads.
//!
//! ## Field Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Ordered-Alias Field Access                          │
//! │                                                                         │
//! │  Upstream lists are inconsistently cased. Each logical field has an     │
//! │  ordered alias chain; the first alias holding a non-empty value wins.   │
//! │                                                                         │
//! │   status  ──►  "Status" ──► "status"                                    │
//! │   created ──►  "Created" ──► "created" ──► "createdDateTime"            │
//! │   expiry  ──►  "WarrantyExpiry" ──► "warrantyExpiry" ──► "ExpiryDate"   │
//! │                                                                         │
//! │  Nothing matched  ──►  ""   (never an error)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Graph list items nest the list columns under `fields`; [`RawRecord::from_item`]
//! flattens them so the same alias chains work for Graph, the delegated REST
//! shape, and the canned demo dataset.

use std::borrow::Cow;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dates::parse_timestamp;
use crate::error::{CoreError, CoreResult};

// =============================================================================
// Alias Chains
// =============================================================================

pub const TITLE: &[&str] = &["Title", "title"];
pub const STATUS: &[&str] = &["Status", "status"];
pub const CATEGORY: &[&str] = &["Category", "category"];
pub const ASSIGNEE: &[&str] = &["Assignee", "assignee"];
pub const CREATED: &[&str] = &["Created", "created", "createdDateTime"];

pub const WARRANTY_EXPIRY: &[&str] = &["WarrantyExpiry", "warrantyExpiry", "ExpiryDate"];
pub const ASSET_TYPE: &[&str] = &["Type", "type"];
pub const ASSIGNED_TO: &[&str] = &["AssignedTo", "assignedTo"];

// =============================================================================
// Raw Record
// =============================================================================

/// A single list item as returned by the provider: string keys to JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Builds a record from a provider list item.
    ///
    /// Keys under a nested `fields` object are lifted to the top level and
    /// take precedence over item-level keys with the same name.
    pub fn from_item(item: Value) -> CoreResult<Self> {
        let mut map = match item {
            Value::Object(map) => map,
            other => {
                return Err(CoreError::NotAnObject {
                    kind: json_kind(&other),
                })
            }
        };

        if let Some(Value::Object(fields)) = map.remove("fields") {
            for (key, value) in fields {
                map.insert(key, value);
            }
        }

        Ok(RawRecord(map))
    }

    /// Resolves a field through an ordered alias chain.
    ///
    /// Returns the first alias whose value is a non-empty string (numbers are
    /// rendered as text). Null, booleans, objects and empty strings are
    /// skipped. Returns `""` when no alias matches.
    pub fn field(&self, aliases: &[&str]) -> Cow<'_, str> {
        for alias in aliases {
            match self.0.get(*alias) {
                Some(Value::String(s)) if !s.is_empty() => return Cow::Borrowed(s.as_str()),
                Some(Value::Number(n)) => return Cow::Owned(n.to_string()),
                _ => continue,
            }
        }
        Cow::Borrowed("")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Ticket Record
// =============================================================================

/// Typed view of a helpdesk ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub title: String,
    pub status: String,
    pub category: String,
    pub assignee: String,
    /// Raw created value as the provider sent it.
    pub created: String,
    /// `created` parsed in the local zone; `None` when absent or unparseable.
    pub created_at: Option<DateTime<Local>>,
}

impl TicketRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        let created = raw.field(CREATED).into_owned();
        TicketRecord {
            title: raw.field(TITLE).into_owned(),
            status: raw.field(STATUS).into_owned(),
            category: raw.field(CATEGORY).into_owned(),
            assignee: raw.field(ASSIGNEE).into_owned(),
            created_at: parse_timestamp(&created),
            created,
        }
    }
}

impl From<&RawRecord> for TicketRecord {
    fn from(raw: &RawRecord) -> Self {
        TicketRecord::from_raw(raw)
    }
}

// =============================================================================
// Asset Record
// =============================================================================

/// Typed view of an IT asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub title: String,
    pub status: String,
    /// Raw expiry value (first non-empty of WarrantyExpiry, warrantyExpiry, ExpiryDate).
    pub warranty_expiry: String,
    pub asset_type: String,
    pub assigned_to: String,
    /// `warranty_expiry` parsed in the local zone.
    pub expires_at: Option<DateTime<Local>>,
}

impl AssetRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        let warranty_expiry = raw.field(WARRANTY_EXPIRY).into_owned();
        AssetRecord {
            title: raw.field(TITLE).into_owned(),
            status: raw.field(STATUS).into_owned(),
            asset_type: raw.field(ASSET_TYPE).into_owned(),
            assigned_to: raw.field(ASSIGNED_TO).into_owned(),
            expires_at: parse_timestamp(&warranty_expiry),
            warranty_expiry,
        }
    }
}

impl From<&RawRecord> for AssetRecord {
    fn from(raw: &RawRecord) -> Self {
        AssetRecord::from_raw(raw)
    }
}

/// Converts a batch of raw records into ticket views.
pub fn tickets_from_raw(raw: &[RawRecord]) -> Vec<TicketRecord> {
    raw.iter().map(TicketRecord::from_raw).collect()
}

/// Converts a batch of raw records into asset views.
pub fn assets_from_raw(raw: &[RawRecord]) -> Vec<AssetRecord> {
    raw.iter().map(AssetRecord::from_raw).collect()
}
