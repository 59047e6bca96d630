//! # Profit Margin Aggregation
//!
//! Groups completed invoice lines by product and derives revenue, cost of
//! goods sold and gross margin.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceLineItem[]                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  keep status == completed                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MarginFilter (category, search, date range)   ← BEFORE grouping       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  group by product_id                                                    │
//! │    revenue = Σ line total                                               │
//! │    cogs    = Σ qty × cost_price                                         │
//! │    profit  = revenue - cogs                                             │
//! │    margin% = profit / revenue × 100   (0 when revenue is 0)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sort by gross profit, descending                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Revenue is the stored line total, so line discounts are honored. COGS uses
//! the product's cost price at report time, not the cost of the layers that
//! were actually consumed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{InvoiceLineItem, InvoiceStatus};

// =============================================================================
// Filter
// =============================================================================

/// Line-level filter applied before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginFilter {
    /// Branch that issued the invoice.
    pub branch_id: Option<String>,
    /// Case-insensitive exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring of SKU or product name.
    pub search: Option<String>,
    /// Inclusive lower bound on invoice date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on invoice date.
    pub to: Option<NaiveDate>,
}

impl MarginFilter {
    /// Whether a line is eligible. Non-completed invoices never are.
    pub fn matches(&self, line: &InvoiceLineItem) -> bool {
        if line.status != InvoiceStatus::Completed {
            return false;
        }

        if self.branch_id.as_ref().is_some_and(|b| *b != line.branch_id) {
            return false;
        }

        if let Some(category) = &self.category {
            let matches = line
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category));
            if !matches {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !line.sku.to_lowercase().contains(&needle)
                && !line.product_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if self.from.is_some_and(|from| line.invoice_date < from) {
            return false;
        }
        if self.to.is_some_and(|to| line.invoice_date > to) {
            return false;
        }

        true
    }
}

// =============================================================================
// Per-Product Item
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfitMarginItem {
    pub product_id: String,
    pub sku: String,
    pub product_name: String,
    pub category: Option<String>,
    pub total_quantity_sold: i64,
    pub total_revenue_cents: i64,
    #[serde(rename = "totalCOGSCents")]
    pub total_cogs_cents: i64,
    pub gross_profit_cents: i64,
    pub gross_margin_percent: f64,
    /// Distinct invoices the product appeared on.
    pub invoice_count: usize,
}

impl ProfitMarginItem {
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }

    #[inline]
    pub fn cogs(&self) -> Money {
        Money::from_cents(self.total_cogs_cents)
    }

    #[inline]
    pub fn gross_profit(&self) -> Money {
        Money::from_cents(self.gross_profit_cents)
    }
}

/// Accumulator for one product while grouping.
struct ProductAccumulator<'a> {
    first: &'a InvoiceLineItem,
    quantity: i64,
    revenue: Money,
    cogs: Money,
    invoices: HashSet<&'a str>,
}

impl<'a> ProductAccumulator<'a> {
    fn new(first: &'a InvoiceLineItem) -> Self {
        ProductAccumulator {
            first,
            quantity: 0,
            revenue: Money::zero(),
            cogs: Money::zero(),
            invoices: HashSet::new(),
        }
    }

    fn push(&mut self, line: &'a InvoiceLineItem) {
        self.quantity += line.quantity;
        self.revenue += line.revenue();
        self.cogs += line.cost_value();
        self.invoices.insert(line.invoice_id.as_str());
    }

    fn finish(self) -> ProfitMarginItem {
        let gross_profit = self.revenue - self.cogs;
        ProfitMarginItem {
            product_id: self.first.product_id.clone(),
            sku: self.first.sku.clone(),
            product_name: self.first.product_name.clone(),
            category: self.first.category.clone(),
            total_quantity_sold: self.quantity,
            total_revenue_cents: self.revenue.cents(),
            total_cogs_cents: self.cogs.cents(),
            gross_profit_cents: gross_profit.cents(),
            gross_margin_percent: gross_profit.percent_of(self.revenue),
            invoice_count: self.invoices.len(),
        }
    }
}

/// Aggregates invoice lines into one item per product, sorted by gross
/// profit descending. Ties keep first-seen order.
pub fn aggregate(lines: &[InvoiceLineItem], filter: &MarginFilter) -> Vec<ProfitMarginItem> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, ProductAccumulator<'_>> = HashMap::new();

    for line in lines.iter().filter(|l| filter.matches(l)) {
        let key = line.product_id.as_str();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                ProductAccumulator::new(line)
            })
            .push(line);
    }

    let mut items: Vec<ProfitMarginItem> = order
        .into_iter()
        .filter_map(|key| groups.remove(key))
        .map(ProductAccumulator::finish)
        .collect();

    items.sort_by(|a, b| b.gross_profit_cents.cmp(&a.gross_profit_cents));
    items
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MarginTotals {
    pub product_count: usize,
    pub total_quantity_sold: i64,
    pub total_revenue_cents: i64,
    #[serde(rename = "totalCOGSCents")]
    pub total_cogs_cents: i64,
    pub gross_profit_cents: i64,
    /// Overall margin, weighted by revenue.
    pub gross_margin_percent: f64,
}

impl MarginTotals {
    pub fn from_items(items: &[ProfitMarginItem]) -> Self {
        let revenue: Money = items.iter().map(ProfitMarginItem::revenue).sum();
        let cogs: Money = items.iter().map(ProfitMarginItem::cogs).sum();
        let gross_profit = revenue - cogs;

        MarginTotals {
            product_count: items.len(),
            total_quantity_sold: items.iter().map(|i| i.total_quantity_sold).sum(),
            total_revenue_cents: revenue.cents(),
            total_cogs_cents: cogs.cents(),
            gross_profit_cents: gross_profit.cents(),
            gross_margin_percent: gross_profit.percent_of(revenue),
        }
    }
}

/// What the profit margin screen renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MarginReport {
    pub items: Vec<ProfitMarginItem>,
    pub totals: MarginTotals,
    /// Highest margin percent.
    pub top_performer: Option<ProfitMarginItem>,
    /// Lowest margin percent.
    pub bottom_performer: Option<ProfitMarginItem>,
}

impl MarginReport {
    pub fn build(lines: &[InvoiceLineItem], filter: &MarginFilter) -> Self {
        let items = aggregate(lines, filter);
        let totals = MarginTotals::from_items(&items);

        // Stable re-sort of the profit-ordered list: equal margins keep
        // their gross-profit order.
        let mut by_margin: Vec<&ProfitMarginItem> = items.iter().collect();
        by_margin.sort_by(|a, b| b.gross_margin_percent.total_cmp(&a.gross_margin_percent));

        let top_performer = by_margin.first().map(|i| (*i).clone());
        let bottom_performer = by_margin.last().map(|i| (*i).clone());

        MarginReport {
            items,
            totals,
            top_performer,
            bottom_performer,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(
        invoice: &str,
        product: &str,
        qty: i64,
        total: i64,
        cost: i64,
        day: u32,
    ) -> InvoiceLineItem {
        InvoiceLineItem {
            invoice_id: invoice.to_string(),
            invoice_number: format!("INV-{}", invoice),
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            status: InvoiceStatus::Completed,
            branch_id: "main".to_string(),
            product_id: product.to_string(),
            sku: format!("SKU-{}", product),
            product_name: format!("Product {}", product),
            category: Some("Parts".to_string()),
            quantity: qty,
            unit_price_cents: if qty == 0 { 0 } else { total / qty },
            total_cents: total,
            cost_price_cents: cost,
        }
    }

    #[test]
    fn test_single_line_margin() {
        let lines = vec![line("1", "a", 2, 200, 60, 1)];
        let items = aggregate(&lines, &MarginFilter::default());

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.total_revenue_cents, 200);
        assert_eq!(item.total_cogs_cents, 120);
        assert_eq!(item.gross_profit_cents, 80);
        assert_eq!(item.gross_margin_percent, 40.0);
        assert_eq!(item.invoice_count, 1);
    }

    #[test]
    fn test_zero_revenue_has_zero_margin() {
        let lines = vec![line("1", "a", 1, 0, 500, 1)];
        let items = aggregate(&lines, &MarginFilter::default());
        assert_eq!(items[0].gross_profit_cents, -500);
        assert_eq!(items[0].gross_margin_percent, 0.0);
    }

    #[test]
    fn test_groups_by_product_and_sorts_by_profit() {
        let lines = vec![
            line("1", "a", 1, 1000, 900, 1),
            line("1", "b", 1, 5000, 1000, 1),
            line("2", "a", 3, 3000, 900, 2),
            line("3", "a", 1, 1000, 900, 3),
        ];
        let items = aggregate(&lines, &MarginFilter::default());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, "b");
        assert_eq!(items[1].product_id, "a");
        assert_eq!(items[1].total_quantity_sold, 5);
        assert_eq!(items[1].total_revenue_cents, 5000);
        assert_eq!(items[1].total_cogs_cents, 4500);
        assert_eq!(items[1].invoice_count, 3);
    }

    #[test]
    fn test_non_completed_invoices_are_ignored() {
        let mut draft = line("1", "a", 5, 5000, 100, 1);
        draft.status = InvoiceStatus::Draft;
        let mut cancelled = line("2", "a", 5, 5000, 100, 1);
        cancelled.status = InvoiceStatus::Cancelled;
        let lines = vec![draft, cancelled, line("3", "a", 1, 1000, 100, 1)];

        let items = aggregate(&lines, &MarginFilter::default());
        assert_eq!(items[0].total_quantity_sold, 1);
    }

    #[test]
    fn test_filters_apply_before_grouping() {
        let mut accessory = line("1", "c", 1, 700, 100, 5);
        accessory.category = Some("Accessories".to_string());
        let lines = vec![
            line("1", "a", 1, 1000, 100, 1),
            line("2", "a", 1, 1000, 100, 20),
            accessory,
        ];

        let by_category = MarginFilter {
            category: Some("ACCESSORIES".to_string()),
            ..Default::default()
        };
        let items = aggregate(&lines, &by_category);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "c");

        let by_date = MarginFilter {
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            to: NaiveDate::from_ymd_opt(2024, 3, 10),
            ..Default::default()
        };
        let items = aggregate(&lines, &by_date);
        let a = items.iter().find(|i| i.product_id == "a").unwrap();
        assert_eq!(a.total_revenue_cents, 1000);

        let by_search = MarginFilter {
            search: Some("sku-a".to_string()),
            ..Default::default()
        };
        assert_eq!(aggregate(&lines, &by_search).len(), 1);
    }

    #[test]
    fn test_branch_filter() {
        let mut north = line("3", "b", 1, 500, 100, 2);
        north.branch_id = "north".to_string();
        let lines = vec![line("1", "a", 1, 1000, 100, 1), north];

        let filter = MarginFilter {
            branch_id: Some("north".to_string()),
            ..Default::default()
        };
        let items = aggregate(&lines, &filter);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "b");

        assert_eq!(aggregate(&lines, &MarginFilter::default()).len(), 2);
    }

    #[test]
    fn test_report_totals_and_performers() {
        let lines = vec![
            // 10% margin, profit 1000
            line("1", "low", 1, 10_000, 9_000, 1),
            // 50% margin, profit 500
            line("1", "high", 1, 1_000, 500, 1),
            // 20% margin, profit 200
            line("2", "mid", 1, 1_000, 800, 2),
        ];
        let report = MarginReport::build(&lines, &MarginFilter::default());

        assert_eq!(report.items[0].product_id, "low");
        assert_eq!(report.top_performer.as_ref().unwrap().product_id, "high");
        assert_eq!(report.bottom_performer.as_ref().unwrap().product_id, "low");

        assert_eq!(report.totals.product_count, 3);
        assert_eq!(report.totals.total_revenue_cents, 12_000);
        assert_eq!(report.totals.total_cogs_cents, 10_300);
        assert_eq!(report.totals.gross_profit_cents, 1_700);
    }

    #[test]
    fn test_empty_report() {
        let report = MarginReport::build(&[], &MarginFilter::default());
        assert!(report.items.is_empty());
        assert!(report.top_performer.is_none());
        assert!(report.bottom_performer.is_none());
        assert_eq!(report.totals.gross_margin_percent, 0.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let items = aggregate(&[line("1", "a", 2, 200, 60, 1)], &MarginFilter::default());
        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["totalCOGSCents"], 120);
        assert_eq!(json["grossMarginPercent"], 40.0);
        assert_eq!(json["totalQuantitySold"], 2);
    }

    proptest! {
        #[test]
        fn prop_profit_is_revenue_minus_cogs(
            raw in proptest::collection::vec((0u8..5, 0i64..20, 0i64..50_000, 0i64..5_000), 0..30)
        ) {
            let lines: Vec<InvoiceLineItem> = raw
                .iter()
                .enumerate()
                .map(|(n, (product, qty, total, cost))| {
                    line(&n.to_string(), &product.to_string(), *qty, *total, *cost, 1)
                })
                .collect();

            let items = aggregate(&lines, &MarginFilter::default());
            for item in &items {
                prop_assert_eq!(item.gross_profit_cents, item.total_revenue_cents - item.total_cogs_cents);
                if item.total_revenue_cents == 0 {
                    prop_assert_eq!(item.gross_margin_percent, 0.0);
                }
            }
            for pair in items.windows(2) {
                prop_assert!(pair[0].gross_profit_cents >= pair[1].gross_profit_cents);
            }

            let totals = MarginTotals::from_items(&items);
            let line_revenue: i64 = lines.iter().map(|l| l.total_cents).sum();
            prop_assert_eq!(totals.total_revenue_cents, line_revenue);
        }
    }
}
