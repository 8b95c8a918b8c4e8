//! # Error Types
//!
//! Domain-specific error types for opsboard-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  opsboard-core errors (this file)                                       │
//! │  └── CoreError        - Record decoding failures                        │
//! │                                                                         │
//! │  opsboard-sync errors (separate crate)                                  │
//! │  ├── AuthError        - Credential exchange failed                      │
//! │  ├── LookupError      - Site resolution failed                          │
//! │  ├── FetchError       - One list failed (always absorbed)               │
//! │  └── ConfigError      - Missing/invalid configuration (fatal)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Metric computation itself never fails: missing fields resolve to empty
//! strings and unparseable dates simply don't match any window.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A list item was not a JSON object.
    ///
    /// ## When This Occurs
    /// - Provider returned `"value": [1, 2]` or similar garbage
    /// - A delegated REST payload wrapped items one level deeper than expected
    #[error("List item is not an object (got {kind})")]
    NotAnObject { kind: &'static str },
}
