//! # Stock Valuation
//!
//! Projects (product, stock level) rows into valuation rows and rolls them up
//! into summary statistics.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Valuation Pipeline                                  │
//! │                                                                         │
//! │  StockPosition (product + stock level, fetched by fixbay-db)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  valuate() ← unit cost fallback chain, value, days held, aging bucket  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ValuationFilter::apply() ← branch / category / method / bucket / text │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  summarize() ← totals, per-bucket and per-method splits                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ValuationReport                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Unit Cost Selection
//! Both costing methods currently walk the same chain:
//! stock-level average → product average → product cost price.
//! FIFO rows do NOT consult cost layers here; whether they should is an
//! open question, so the chain is applied as-is.
//!
//! ## Example
//! ```rust
//! use fixbay_core::valuation::AgingBucket;
//!
//! assert_eq!(AgingBucket::from_days(30), AgingBucket::Days0To30);
//! assert_eq!(AgingBucket::from_days(31), AgingBucket::Days31To60);
//! assert_eq!(AgingBucket::from_days(91).label(), "90+");
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{CostingMethod, Product, StockLevel, StockPosition};

// =============================================================================
// Aging Bucket
// =============================================================================

/// Coarse classification of how long stock has been held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum AgingBucket {
    #[serde(rename = "0-30")]
    Days0To30,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    Over90,
}

impl AgingBucket {
    /// All buckets, youngest first.
    pub const ALL: [AgingBucket; 4] = [
        AgingBucket::Days0To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    /// Classifies a holding period in days.
    ///
    /// Negative spans (receipt dated after the report date) land in the
    /// youngest bucket.
    pub const fn from_days(days: i64) -> Self {
        if days <= 30 {
            AgingBucket::Days0To30
        } else if days <= 60 {
            AgingBucket::Days31To60
        } else if days <= 90 {
            AgingBucket::Days61To90
        } else {
            AgingBucket::Over90
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AgingBucket::Days0To30 => "0-30",
            AgingBucket::Days31To60 => "31-60",
            AgingBucket::Days61To90 => "61-90",
            AgingBucket::Over90 => "90+",
        }
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgingBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AgingBucket::ALL
            .into_iter()
            .find(|bucket| bucket.label() == s)
            .ok_or_else(|| CoreError::UnknownAgingBucket(s.to_string()))
    }
}

// =============================================================================
// Unit Cost Selection
// =============================================================================

/// Which field supplied a valuation row's unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnitCostSource {
    /// Branch stock level's running average.
    StockAverage,
    /// Product-wide average cost.
    ProductAverage,
    /// Product cost price.
    CostPrice,
    /// Nothing positive was available; valued at zero.
    Missing,
}

/// Picks the unit cost for a position.
///
/// Absent and non-positive values fall through to the next source.
pub fn select_unit_cost(product: &Product, level: &StockLevel) -> (Money, UnitCostSource) {
    // Same chain for FIFO and weighted average; see module docs.
    let candidates = [
        (level.average_unit_cost(), UnitCostSource::StockAverage),
        (product.average_cost(), UnitCostSource::ProductAverage),
        (Some(product.cost_price()), UnitCostSource::CostPrice),
    ];

    candidates
        .into_iter()
        .find_map(|(cost, source)| cost.filter(Money::is_positive).map(|c| (c, source)))
        .unwrap_or((Money::zero(), UnitCostSource::Missing))
}

/// Days between the last receipt (or product creation) and `as_of`,
/// clamped at zero.
pub fn days_held(product: &Product, level: &StockLevel, as_of: NaiveDate) -> i64 {
    let received = level
        .last_received_date
        .unwrap_or_else(|| product.created_at.date_naive());
    (as_of - received).num_days().max(0)
}

// =============================================================================
// Stock Valuation Row
// =============================================================================

/// Derived valuation of one product at one branch. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockValuation {
    pub product_id: String,
    pub sku: String,
    pub product_name: String,
    pub category: Option<String>,
    pub branch_id: String,
    pub costing_method: CostingMethod,
    pub on_hand_qty: i64,
    pub reserved_qty: i64,
    /// on_hand - reserved
    pub available_qty: i64,
    pub unit_cost_cents: i64,
    pub unit_cost_source: UnitCostSource,
    /// on_hand × unit_cost
    pub total_value_cents: i64,
    pub days_held: i64,
    pub aging_bucket: AgingBucket,
}

impl StockValuation {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_cents(self.total_value_cents)
    }
}

/// Values one stock position as of `as_of`.
pub fn valuate(position: &StockPosition, as_of: NaiveDate) -> StockValuation {
    let StockPosition { product, level } = position;

    let (unit_cost, unit_cost_source) = select_unit_cost(product, level);
    let days = days_held(product, level, as_of);

    StockValuation {
        product_id: product.id.clone(),
        sku: product.sku.clone(),
        product_name: product.name.clone(),
        category: product.category.clone(),
        branch_id: level.branch_id.clone(),
        costing_method: product.costing_method,
        on_hand_qty: level.quantity_on_hand,
        reserved_qty: level.quantity_reserved,
        available_qty: level.quantity_on_hand - level.quantity_reserved,
        unit_cost_cents: unit_cost.cents(),
        unit_cost_source,
        total_value_cents: unit_cost.multiply_quantity(level.quantity_on_hand).cents(),
        days_held: days,
        aging_bucket: AgingBucket::from_days(days),
    }
}

/// Values every position, preserving input order.
pub fn valuate_all(positions: &[StockPosition], as_of: NaiveDate) -> Vec<StockValuation> {
    positions.iter().map(|p| valuate(p, as_of)).collect()
}

// =============================================================================
// Filtering
// =============================================================================

/// Narrows valuation rows the way the valuation screen's filter bar does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationFilter {
    pub branch_id: Option<String>,
    /// Case-insensitive exact category match.
    pub category: Option<String>,
    pub costing_method: Option<CostingMethod>,
    pub aging_bucket: Option<AgingBucket>,
    /// Case-insensitive substring of SKU or name.
    pub search: Option<String>,
    /// Keep rows whose on-hand quantity is zero.
    pub include_zero_stock: bool,
}

impl ValuationFilter {
    pub fn matches(&self, row: &StockValuation) -> bool {
        if !self.include_zero_stock && row.on_hand_qty == 0 {
            return false;
        }

        if let Some(branch) = &self.branch_id {
            if &row.branch_id != branch {
                return false;
            }
        }

        if let Some(category) = &self.category {
            let matches = row
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category));
            if !matches {
                return false;
            }
        }

        if let Some(method) = self.costing_method {
            if row.costing_method != method {
                return false;
            }
        }

        if let Some(bucket) = self.aging_bucket {
            if row.aging_bucket != bucket {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !row.sku.to_lowercase().contains(&needle)
                && !row.product_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, rows: Vec<StockValuation>) -> Vec<StockValuation> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BucketTotal {
    pub bucket: AgingBucket,
    pub row_count: usize,
    pub quantity: i64,
    pub value_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MethodTotal {
    pub method: CostingMethod,
    pub row_count: usize,
    pub quantity: i64,
    pub value_cents: i64,
}

/// Roll-up of a set of valuation rows.
///
/// `by_aging` always lists all four buckets in order and `by_method` both
/// methods, so the dashboard cards never go missing on an empty slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSummary {
    pub row_count: usize,
    pub total_quantity: i64,
    pub total_value_cents: i64,
    /// total value / total quantity, 0 when there is no quantity.
    pub average_cost_cents: i64,
    pub by_aging: Vec<BucketTotal>,
    pub by_method: Vec<MethodTotal>,
}

impl ValuationSummary {
    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_cents(self.total_value_cents)
    }

    /// Totals for one bucket.
    pub fn bucket(&self, bucket: AgingBucket) -> Option<&BucketTotal> {
        self.by_aging.iter().find(|b| b.bucket == bucket)
    }

    /// Totals for one costing method.
    pub fn method(&self, method: CostingMethod) -> Option<&MethodTotal> {
        self.by_method.iter().find(|m| m.method == method)
    }
}

/// Aggregates valuation rows. Pure: the same rows always give the same
/// summary.
pub fn summarize(rows: &[StockValuation]) -> ValuationSummary {
    let mut by_aging: Vec<BucketTotal> = AgingBucket::ALL
        .into_iter()
        .map(|bucket| BucketTotal {
            bucket,
            row_count: 0,
            quantity: 0,
            value_cents: 0,
        })
        .collect();

    let mut by_method: Vec<MethodTotal> = CostingMethod::ALL
        .into_iter()
        .map(|method| MethodTotal {
            method,
            row_count: 0,
            quantity: 0,
            value_cents: 0,
        })
        .collect();

    let mut total_quantity = 0i64;
    let mut total_value = Money::zero();

    for row in rows {
        total_quantity += row.on_hand_qty;
        total_value += row.total_value();

        if let Some(slot) = by_aging.iter_mut().find(|b| b.bucket == row.aging_bucket) {
            slot.row_count += 1;
            slot.quantity += row.on_hand_qty;
            slot.value_cents += row.total_value_cents;
        }

        if let Some(slot) = by_method.iter_mut().find(|m| m.method == row.costing_method) {
            slot.row_count += 1;
            slot.quantity += row.on_hand_qty;
            slot.value_cents += row.total_value_cents;
        }
    }

    let average_cost = total_value
        .divide_by_quantity(total_quantity)
        .unwrap_or_default();

    ValuationSummary {
        row_count: rows.len(),
        total_quantity,
        total_value_cents: total_value.cents(),
        average_cost_cents: average_cost.cents(),
        by_aging,
        by_method,
    }
}

// =============================================================================
// Report
// =============================================================================

/// Rows plus their summary, as rendered by the valuation screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ValuationReport {
    #[ts(as = "String")]
    pub as_of: NaiveDate,
    pub rows: Vec<StockValuation>,
    pub summary: ValuationSummary,
}

impl ValuationReport {
    /// Values, filters, then summarizes. The summary covers the filtered
    /// rows only.
    pub fn build(positions: &[StockPosition], as_of: NaiveDate, filter: &ValuationFilter) -> Self {
        let rows = filter.apply(valuate_all(positions, as_of));
        let summary = summarize(&rows);
        ValuationReport {
            as_of,
            rows,
            summary,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
