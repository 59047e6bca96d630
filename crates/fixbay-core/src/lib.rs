//! # fixbay-core: Pure Reporting Logic for Fixbay ERP
//!
//! Stock valuation, profit margin and cost layer aggregation as pure
//! functions over explicit row collections. Nothing in this crate touches a
//! database; rows arrive already fetched.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fixbay Reporting                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 fixbay-reports (CLI)                            │   │
//! │  │      valuation ──► margins ──► layers   (table / json)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fixbay-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ valuation │  │  margin   │  │  layers   │  │ validation│  │   │
//! │  │   │ buckets   │  │ revenue   │  │ fifo order│  │  filters  │  │   │
//! │  │   │ summary   │  │ cogs, %   │  │ summary   │  │  dates    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 fixbay-db (Read Models)                         │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Consumed rows (Product, StockLevel, CostLayer, InvoiceLineItem)
//! - [`money`] - Money type with integer arithmetic
//! - [`valuation`] - Stock valuation rows, aging buckets, summaries
//! - [`margin`] - Per-product profit margins
//! - [`layers`] - Cost layer ordering and roll-ups
//! - [`validation`] - Filter input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use fixbay_core::margin::{aggregate, MarginFilter};
//! use fixbay_core::types::{InvoiceLineItem, InvoiceStatus};
//! use chrono::NaiveDate;
//!
//! let line = InvoiceLineItem {
//!     invoice_id: "inv-1".into(),
//!     invoice_number: "INV-0001".into(),
//!     invoice_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
//!     status: InvoiceStatus::Completed,
//!     branch_id: "main".into(),
//!     product_id: "p-1".into(),
//!     sku: "LCD-IP12".into(),
//!     product_name: "iPhone 12 Screen".into(),
//!     category: None,
//!     quantity: 2,
//!     unit_price_cents: 100,
//!     total_cents: 200,
//!     cost_price_cents: 60,
//! };
//!
//! let items = aggregate(&[line], &MarginFilter::default());
//! assert_eq!(items[0].gross_profit_cents, 80);
//! assert_eq!(items[0].gross_margin_percent, 40.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod layers;
pub mod margin;
pub mod money;
pub mod types;
pub mod validation;
pub mod valuation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use layers::{CostLayerReport, CostLayerView, LayerSummary};
pub use margin::{MarginFilter, MarginReport, MarginTotals, ProfitMarginItem};
pub use money::Money;
pub use types::*;
pub use valuation::{
    AgingBucket, StockValuation, UnitCostSource, ValuationFilter, ValuationReport,
    ValuationSummary,
};
