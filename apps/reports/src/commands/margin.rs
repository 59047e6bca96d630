//! # Margin Command
//!
//! Completed invoice lines in the date range and branch are fetched once,
//! then grouped per product by [`MarginReport::build`]. Category and search
//! narrow lines before grouping, so totals only cover what is shown. The
//! branch falls back to the configured default.

use std::time::Instant;
use tracing::{debug, info};

use fixbay_core::validation::validate_date_range;
use fixbay_core::{MarginFilter, MarginReport};
use fixbay_db::Database;

use super::{optional_date, optional_identifier, optional_search, resolve_branch};
use crate::cli::MarginArgs;
use crate::config::ReportSettings;
use crate::error::ApiError;

pub fn build_filter(args: &MarginArgs, settings: &ReportSettings) -> Result<MarginFilter, ApiError> {
    let from = optional_date("from", args.from.as_deref())?;
    let to = optional_date("to", args.to.as_deref())?;
    validate_date_range("invoice_date", from, to)?;

    Ok(MarginFilter {
        branch_id: resolve_branch(args.branch.as_deref(), settings)?,
        category: optional_identifier("category", args.category.as_deref())?,
        search: optional_search(args.search.as_deref())?,
        from,
        to,
    })
}

pub async fn margins(
    db: &Database,
    settings: &ReportSettings,
    args: &MarginArgs,
) -> Result<MarginReport, ApiError> {
    let start = Instant::now();

    let filter = build_filter(args, settings)?;
    debug!(?filter, "Building margin report");

    let lines = db
        .invoices()
        .completed_line_items(filter.from, filter.to, filter.branch_id.as_deref())
        .await?;

    let report = MarginReport::build(&lines, &filter);

    info!(
        lines = lines.len(),
        products = report.totals.product_count,
        gross_margin_percent = report.totals.gross_margin_percent,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Margin report built"
    );

    Ok(report)
}
