//! # Error Types
//!
//! Domain-specific error types for fixbay-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fixbay-core errors (this file)                                        │
//! │  ├── CoreError        - Domain invariant failures                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fixbay-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  reports app errors                                                    │
//! │  └── ApiError         - What the user sees (serialized)                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → User         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cost layer read from the backend breaks its own invariants.
    ///
    /// ## When This Occurs
    /// - `remaining_qty` greater than `received_qty`
    /// - `is_exhausted` flag disagrees with `remaining_qty == 0`
    /// - Negative quantities
    ///
    /// Layers are created and decremented server-side, so this points at
    /// bad upstream data rather than anything the reports did.
    #[error("Cost layer {layer_id} is inconsistent: {reason}")]
    InconsistentCostLayer { layer_id: String, reason: String },

    /// Unknown costing method string.
    #[error("Unknown costing method: {0}")]
    UnknownCostingMethod(String),

    /// Unknown aging bucket label.
    #[error("Unknown aging bucket: {0}")]
    UnknownAgingBucket(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Rendered per field by the caller.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Start of a range is after its end.
    #[error("{field} range is inverted: {from} is after {to}")]
    InvertedRange {
        field: String,
        from: String,
        to: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
