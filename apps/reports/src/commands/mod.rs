//! # Report Commands
//!
//! One module per subcommand. Each takes the open [`Database`], the
//! resolved settings and its parsed arguments, and returns the report type
//! from fixbay-core. Rendering happens afterwards in [`crate::render`].
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (shared argument helpers)
//! ├── valuation.rs  ◄─── Stock valuation + aging summary
//! ├── margin.rs     ◄─── Profit margin aggregation
//! └── layers.rs     ◄─── Cost layer drill-down
//! ```
//!
//! [`Database`]: fixbay_db::Database

use chrono::NaiveDate;

use fixbay_core::validation::{parse_date, validate_identifier, validate_search_query};

use crate::config::ReportSettings;
use crate::error::ApiError;

pub mod layers;
pub mod margin;
pub mod valuation;

/// Parses an optional `YYYY-MM-DD` argument.
pub(crate) fn optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    Ok(value.map(|v| parse_date(field, v)).transpose()?)
}

/// Trims an optional identifier; blank means "not given".
pub(crate) fn optional_identifier(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(Some(validate_identifier(field, v)?)),
        _ => Ok(None),
    }
}

/// Branch from the argument, else the configured default. A blank
/// argument counts as not given.
pub(crate) fn resolve_branch(arg: Option<&str>, settings: &ReportSettings) -> Result<Option<String>, ApiError> {
    match optional_identifier("branch", arg)? {
        Some(branch) => Ok(Some(branch)),
        None => optional_identifier("branch", settings.branch_id.as_deref()),
    }
}

/// Trims an optional search term; blank means "not given".
pub(crate) fn optional_search(value: Option<&str>) -> Result<Option<String>, ApiError> {
    match value {
        Some(v) => Ok(validate_search_query(v)?),
        None => Ok(None),
    }
}
