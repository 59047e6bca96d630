//! # Valuation Command
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Valuation Flow                                       │
//! │                                                                         │
//! │  ValuationArgs + ReportSettings                                        │
//! │       │  (args win; settings fill branch and include_zero_stock)       │
//! │       ▼                                                                 │
//! │  ValuationFilter ◄── method / bucket / date parsed and validated       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository::stock_positions(branch)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ValuationReport::build(positions, as_of, filter)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, info};

use fixbay_core::{AgingBucket, CostingMethod, ValuationFilter, ValuationReport};
use fixbay_db::Database;

use super::{optional_date, optional_identifier, optional_search, resolve_branch};
use crate::cli::ValuationArgs;
use crate::config::ReportSettings;
use crate::error::ApiError;

/// Builds the filter from arguments, falling back to settings.
pub fn build_filter(args: &ValuationArgs, settings: &ReportSettings) -> Result<ValuationFilter, ApiError> {
    Ok(ValuationFilter {
        branch_id: resolve_branch(args.branch.as_deref(), settings)?,
        category: optional_identifier("category", args.category.as_deref())?,
        costing_method: args
            .method
            .as_deref()
            .map(str::parse::<CostingMethod>)
            .transpose()?,
        aging_bucket: args
            .bucket
            .as_deref()
            .map(str::parse::<AgingBucket>)
            .transpose()?,
        search: optional_search(args.search.as_deref())?,
        include_zero_stock: args.include_zero || settings.include_zero_stock,
    })
}

/// Values stock on hand as of `args.as_of` (or `today`).
pub async fn valuation(
    db: &Database,
    settings: &ReportSettings,
    args: &ValuationArgs,
    today: NaiveDate,
) -> Result<ValuationReport, ApiError> {
    let start = Instant::now();

    let filter = build_filter(args, settings)?;
    let as_of = optional_date("as_of", args.as_of.as_deref())?.unwrap_or(today);
    debug!(?filter, %as_of, "Building valuation report");

    let positions = db
        .products()
        .stock_positions(filter.branch_id.as_deref())
        .await?;

    let report = ValuationReport::build(&positions, as_of, &filter);

    info!(
        positions = positions.len(),
        rows = report.rows.len(),
        total_value = %report.summary.total_value(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Valuation report built"
    );

    Ok(report)
}
