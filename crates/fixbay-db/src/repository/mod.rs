//! # Repository Module
//!
//! Read models behind the reports.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Report command                                                         │
//! │       │                                                                 │
//! │       │  db.products().stock_positions(Some("main"))                   │
//! │       ▼                                                                 │
//! │  ProductRepository / CostLayerRepository / InvoiceRepository           │
//! │       │                                                                 │
//! │       │  SQL → *Record (sqlx::FromRow) → fixbay-core type              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products and stock positions
//! - [`CostLayerRepository`](cost_layer::CostLayerRepository) - FIFO layers (read-only)
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoices and completed lines

pub mod cost_layer;
pub mod invoice;
pub mod product;
