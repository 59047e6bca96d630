//! # Output Rendering
//!
//! Reports render either as terminal tables (comfy-table) or as the serde
//! JSON form of the report types, which matches the generated TypeScript
//! bindings.

use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use fixbay_core::{CostLayerReport, MarginReport, Money, ValuationReport};

use crate::error::ApiError;

// =============================================================================
// Output Format
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::validation(format!(
                "Unknown output format '{}'. Valid options: table, json",
                other
            ))),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// A report that knows its table layout.
pub trait Render: Serialize {
    fn table(&self) -> String;
}

pub fn render<T: Render>(report: &T, format: OutputFormat) -> Result<String, ApiError> {
    match format {
        OutputFormat::Table => Ok(report.table()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Right-aligns every column from `first` onwards (numeric columns).
fn align_numbers(table: &mut Table, first: usize) {
    let count = table.column_count();
    for index in first..count {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn money(cents: i64) -> String {
    Money::from_cents(cents).to_string()
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

impl Render for ValuationReport {
    fn table(&self) -> String {
        let mut rows = new_table(vec![
            "SKU", "Product", "Branch", "Method", "Bucket", "On Hand", "Reserved", "Available",
            "Unit Cost", "Value",
        ]);
        for row in &self.rows {
            rows.add_row(vec![
                row.sku.clone(),
                row.product_name.clone(),
                row.branch_id.clone(),
                row.costing_method.to_string(),
                row.aging_bucket.to_string(),
                row.on_hand_qty.to_string(),
                row.reserved_qty.to_string(),
                row.available_qty.to_string(),
                money(row.unit_cost_cents),
                money(row.total_value_cents),
            ]);
        }
        align_numbers(&mut rows, 5);

        let summary = &self.summary;
        let mut buckets = new_table(vec!["Aging", "Rows", "Quantity", "Value"]);
        for bucket in &summary.by_aging {
            buckets.add_row(vec![
                bucket.bucket.to_string(),
                bucket.row_count.to_string(),
                bucket.quantity.to_string(),
                money(bucket.value_cents),
            ]);
        }
        for method in &summary.by_method {
            buckets.add_row(vec![
                method.method.to_string(),
                method.row_count.to_string(),
                method.quantity.to_string(),
                money(method.value_cents),
            ]);
        }
        buckets.add_row(vec![
            "Total".to_string(),
            summary.row_count.to_string(),
            summary.total_quantity.to_string(),
            money(summary.total_value_cents),
        ]);
        align_numbers(&mut buckets, 1);

        format!(
            "Stock valuation as of {}\n{}\n{}\nAverage unit cost: {}",
            self.as_of,
            rows,
            buckets,
            money(summary.average_cost_cents)
        )
    }
}

impl Render for MarginReport {
    fn table(&self) -> String {
        let mut items = new_table(vec![
            "SKU", "Product", "Category", "Qty Sold", "Invoices", "Revenue", "COGS",
            "Gross Profit", "Margin",
        ]);
        for item in &self.items {
            items.add_row(vec![
                item.sku.clone(),
                item.product_name.clone(),
                item.category.clone().unwrap_or_default(),
                item.total_quantity_sold.to_string(),
                item.invoice_count.to_string(),
                money(item.total_revenue_cents),
                money(item.total_cogs_cents),
                money(item.gross_profit_cents),
                percent(item.gross_margin_percent),
            ]);
        }
        let totals = &self.totals;
        items.add_row(vec![
            "Total".to_string(),
            format!("{} products", totals.product_count),
            String::new(),
            totals.total_quantity_sold.to_string(),
            String::new(),
            money(totals.total_revenue_cents),
            money(totals.total_cogs_cents),
            money(totals.gross_profit_cents),
            percent(totals.gross_margin_percent),
        ]);
        align_numbers(&mut items, 3);

        let mut out = format!("Profit margins\n{}", items);
        if let Some(top) = &self.top_performer {
            out.push_str(&format!(
                "\nTop performer:    {} ({})",
                top.product_name,
                percent(top.gross_margin_percent)
            ));
        }
        if let Some(bottom) = &self.bottom_performer {
            out.push_str(&format!(
                "\nBottom performer: {} ({})",
                bottom.product_name,
                percent(bottom.gross_margin_percent)
            ));
        }
        out
    }
}

impl Render for CostLayerReport {
    fn table(&self) -> String {
        let mut layers = new_table(vec![
            "Received", "Branch", "Source", "Received Qty", "Remaining", "Consumed",
            "Unit Cost", "Remaining Value", "Bucket", "Status",
        ]);
        for view in &self.layers {
            let layer = &view.layer;
            layers.add_row(vec![
                layer.received_date.to_string(),
                layer.branch_id.clone(),
                format!("{:?}", layer.source_type).to_lowercase(),
                layer.received_qty.to_string(),
                layer.remaining_qty.to_string(),
                view.consumed_qty.to_string(),
                money(layer.unit_cost_cents),
                money(view.remaining_value_cents),
                view.aging_bucket.to_string(),
                if layer.is_exhausted { "exhausted" } else { "active" }.to_string(),
            ]);
        }
        align_numbers(&mut layers, 3);

        let mut trail = new_table(vec!["Consumed At", "Quantity", "Unit Cost", "Total", "Reference"]);
        for c in &self.consumptions {
            let reference = match (&c.reference_type, &c.reference_id) {
                (Some(kind), Some(id)) => format!("{} {}", kind, id),
                (Some(kind), None) => kind.clone(),
                _ => String::new(),
            };
            trail.add_row(vec![
                c.consumed_at.format("%Y-%m-%d %H:%M").to_string(),
                c.quantity.to_string(),
                money(c.unit_cost_cents),
                money(c.total_cost().cents()),
                reference,
            ]);
        }

        let s = &self.summary;
        format!(
            "Cost layers for {}\n{}\nActive: {}  Exhausted: {}  Remaining: {} units, {}  Weighted cost: {}\n\nConsumption trail\n{}",
            self.product_id,
            layers,
            s.active_layers,
            s.exhausted_layers,
            s.total_remaining_qty,
            money(s.total_remaining_value_cents),
            money(s.weighted_unit_cost_cents),
            trail
        )
    }
}
