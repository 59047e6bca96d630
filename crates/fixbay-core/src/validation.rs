//! # Validation Module
//!
//! Input validation for report filters.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: CLI / dashboard form                                          │
//! │  └── Type parsing (dates, enums)                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Filter rules (lengths, ranges, required ids)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Aggregators                                                   │
//! │  └── Assume validated filters                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fixbay_core::validation::{parse_date, validate_date_range};
//!
//! let from = parse_date("from", "2024-01-01").unwrap();
//! let to = parse_date("to", "2024-01-31").unwrap();
//! validate_date_range("invoice_date", Some(from), Some(to)).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text search accepted by the report filters.
pub const MAX_SEARCH_LEN: usize = 100;

/// Longest identifier (product, branch) accepted by the report filters.
pub const MAX_ID_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a free-text search query.
///
/// ## Rules
/// - Can be empty (no filtering)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query, or `None` when it is empty.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    if query.is_empty() {
        return Ok(None);
    }

    Ok(Some(query.to_string()))
}

/// Validates a required identifier such as a product or branch id.
///
/// ## Example
/// ```rust
/// use fixbay_core::validation::validate_identifier;
///
/// assert!(validate_identifier("product_id", "p-001").is_ok());
/// assert!(validate_identifier("product_id", "   ").is_err());
/// ```
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD ({})", e),
        }
    })
}

/// Validates an optional inclusive date range.
///
/// Either end may be open. Both ends equal is a single-day range.
pub fn validate_date_range(
    field: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ValidationResult<()> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ValidationError::InvertedRange {
                field: field.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }
    Ok(())
}
