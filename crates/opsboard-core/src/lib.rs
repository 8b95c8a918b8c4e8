//! # opsboard-core: Pure Metrics Logic for Opsboard
//!
//! This crate holds everything the dashboard computes, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Opsboard Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    Dashboard Frontend                           │    │
//! │  │    Metric cards ──► Recent tickets ──► Connection indicator     │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ MetricsSnapshot / ConnectionStatus     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    opsboard-sync                                │    │
//! │  │    token ──► site ──► lists ──► metrics ──► publish             │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ opsboard-core (THIS CRATE) ★                    │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │  record   │  │  metrics  │  │   demo    │  │   types   │    │    │
//! │  │   │ RawRecord │  │  compute  │  │  canned   │  │ Snapshot  │    │    │
//! │  │   │  aliases  │  │  windows  │  │  dataset  │  │  Status   │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO NETWORK • NO TIMERS • PURE FUNCTIONS              │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`record`] - Raw provider records and ordered-alias field access
//! - [`dates`] - Lenient local-zone timestamp parsing
//! - [`metrics`] - The metrics engine
//! - [`demo`] - Canned fallback dataset
//! - [`types`] - Snapshot, connection and badge types shared with the frontend
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Local;
//! use opsboard_core::{demo, metrics, record, DataSource};
//!
//! let tickets = record::tickets_from_raw(&demo::demo_tickets());
//! let assets = record::assets_from_raw(&demo::demo_assets());
//!
//! let snapshot = metrics::compute(&tickets, &assets, Local::now(), DataSource::Demo);
//! assert_eq!(snapshot.total_tickets, 4);
//! assert_eq!(snapshot.new_joiners, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dates;
pub mod demo;
pub mod error;
pub mod metrics;
pub mod record;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use record::{AssetRecord, RawRecord, TicketRecord};
pub use types::*;
