//! # Domain Types
//!
//! Rows consumed from the backend. Fixbay reporting never owns these: they
//! are read, projected, and thrown away on every query.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Consumed Rows                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   StockLevel    │   │   CostLayer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, sku        │◄──│  product_id     │   │  product_id     │       │
//! │  │  cost_price     │   │  branch_id      │   │  branch_id      │       │
//! │  │  average_cost   │   │  on_hand        │   │  received_qty   │       │
//! │  │  costing_method │   │  reserved       │   │  remaining_qty  │       │
//! │  └─────────────────┘   │  avg_unit_cost  │   │  unit_cost      │       │
//! │                        └─────────────────┘   └────────┬────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐                     ┌────────────▼────────┐       │
//! │  │ InvoiceLineItem │                     │ CostLayerConsumption│       │
//! │  │  (joined with   │                     │  layer_id, qty      │       │
//! │  │   cost_price)   │                     │  consumed_at        │       │
//! │  └─────────────────┘                     └─────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Costing Method
// =============================================================================

/// How a product's inventory is costed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CostingMethod {
    /// Discrete cost layers consumed oldest-first.
    Fifo,
    /// One blended running average per product/branch.
    WeightedAverage,
}

impl CostingMethod {
    /// All methods, in report order.
    pub const ALL: [CostingMethod; 2] = [CostingMethod::Fifo, CostingMethod::WeightedAverage];

    /// Wire/database label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CostingMethod::Fifo => "fifo",
            CostingMethod::WeightedAverage => "weighted_average",
        }
    }
}

impl Default for CostingMethod {
    fn default() -> Self {
        CostingMethod::WeightedAverage
    }
}

impl fmt::Display for CostingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostingMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fifo" => Ok(CostingMethod::Fifo),
            "weighted_average" | "weighted-average" | "wac" => Ok(CostingMethod::WeightedAverage),
            other => Err(CoreError::UnknownCostingMethod(other.to_string())),
        }
    }
}

// =============================================================================
// Cost Layer Source
// =============================================================================

/// What created a cost layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CostLayerSource {
    /// Goods Received Note against a purchase order.
    Grn,
    /// Manual stock adjustment.
    Adjustment,
    /// Inbound inter-branch transfer.
    Transfer,
    /// Opening balance.
    Opening,
}

// =============================================================================
// Invoice Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    /// Only completed invoices count towards margins.
    Completed,
    Cancelled,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product as the reports see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Category used by report filters.
    pub category: Option<String>,

    /// Last purchase / list cost in cents.
    pub cost_price_cents: i64,

    /// Product-wide average cost in cents, when the backend maintains one.
    pub average_cost_cents: Option<i64>,

    pub costing_method: CostingMethod,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    #[inline]
    pub fn average_cost(&self) -> Option<Money> {
        self.average_cost_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// On-hand stock of one product at one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockLevel {
    pub product_id: String,
    pub branch_id: String,
    pub quantity_on_hand: i64,
    pub quantity_reserved: i64,
    /// Running weighted-average unit cost at this branch, in cents.
    pub average_unit_cost_cents: Option<i64>,
    /// Date of the most recent receipt into this branch.
    #[ts(as = "Option<String>")]
    pub last_received_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockLevel {
    #[inline]
    pub fn average_unit_cost(&self) -> Option<Money> {
        self.average_unit_cost_cents.map(Money::from_cents)
    }
}

/// A product joined with one of its stock levels.
///
/// This is the input row for valuation: one position per (product, branch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPosition {
    pub product: Product,
    pub level: StockLevel,
}

// =============================================================================
// Cost Layer
// =============================================================================

/// A FIFO cost layer: one receipt of stock at one unit cost.
///
/// ## Invariants (enforced server-side, checked by `layers::check_invariants`)
/// - `remaining_qty <= received_qty`
/// - `is_exhausted` iff `remaining_qty == 0`
///
/// Created on goods receipt and decremented on consumption by backend
/// procedures. Fixbay only reads layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostLayer {
    pub id: String,
    pub product_id: String,
    pub branch_id: String,
    pub source_type: CostLayerSource,
    /// GRN that created the layer, when `source_type` is `grn`.
    pub grn_id: Option<String>,
    pub received_qty: i64,
    pub remaining_qty: i64,
    pub unit_cost_cents: i64,
    #[ts(as = "String")]
    pub received_date: NaiveDate,
    pub is_exhausted: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CostLayer {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Value still sitting in this layer (remaining × unit cost).
    #[inline]
    pub fn remaining_value(&self) -> Money {
        self.unit_cost().multiply_quantity(self.remaining_qty)
    }

    /// Quantity already drawn from this layer.
    #[inline]
    pub fn consumed_qty(&self) -> i64 {
        self.received_qty - self.remaining_qty
    }
}

// =============================================================================
// Cost Layer Consumption
// =============================================================================

/// One draw against a cost layer (audit trail entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostLayerConsumption {
    pub id: String,
    pub layer_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    #[ts(as = "String")]
    pub consumed_at: DateTime<Utc>,
    /// What consumed the stock, e.g. "invoice" or "job_card".
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
}

impl CostLayerConsumption {
    /// Cost released by this consumption.
    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Invoice Line Item
// =============================================================================

/// An invoice line joined with its invoice header and the product's
/// cost price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLineItem {
    pub invoice_id: String,
    pub invoice_number: String,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub status: InvoiceStatus,
    /// Branch that issued the invoice.
    pub branch_id: String,
    pub product_id: String,
    pub sku: String,
    pub product_name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Line total as stored on the invoice (after line discounts).
    pub total_cents: i64,
    /// Product cost price at report time.
    pub cost_price_cents: i64,
}

impl InvoiceLineItem {
    /// Revenue contributed by this line (the stored total, not qty × price).
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Cost of goods sold for this line (qty × product cost price).
    #[inline]
    pub fn cost_value(&self) -> Money {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costing_method_parse() {
        assert_eq!("fifo".parse::<CostingMethod>().unwrap(), CostingMethod::Fifo);
        assert_eq!(
            "Weighted_Average".parse::<CostingMethod>().unwrap(),
            CostingMethod::WeightedAverage
        );
        assert!(matches!(
            "lifo".parse::<CostingMethod>(),
            Err(CoreError::UnknownCostingMethod(_))
        ));
    }

    #[test]
    fn test_costing_method_serde_labels() {
        let json = serde_json::to_string(&CostingMethod::WeightedAverage).unwrap();
        assert_eq!(json, "\"weighted_average\"");
        assert_eq!(CostingMethod::Fifo.to_string(), "fifo");
    }

    #[test]
    fn test_invoice_status_default() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Draft);
    }

    #[test]
    fn test_invoice_line_revenue_uses_total() {
        let line = InvoiceLineItem {
            invoice_id: "inv-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            status: InvoiceStatus::Completed,
            branch_id: "main".to_string(),
            product_id: "p-1".to_string(),
            sku: "LCD-IP12".to_string(),
            product_name: "iPhone 12 Screen".to_string(),
            category: Some("Parts".to_string()),
            quantity: 2,
            unit_price_cents: 10000,
            total_cents: 19000,
            cost_price_cents: 6000,
        };
        assert_eq!(line.revenue().cents(), 19000);
        assert_eq!(line.cost_value().cents(), 12000);
    }
}
