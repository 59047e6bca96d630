//! # Invoice Repository
//!
//! Invoices and their line items, read back as [`InvoiceLineItem`] rows
//! joined with each product's current cost price.
//!
//! ## Line Item Query
//! ```text
//! invoice_items ──► invoices (status = 'completed', date range)
//!       │
//!       └────────► products (sku, name, category, cost_price_cents)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use fixbay_core::{InvoiceLineItem, InvoiceStatus};

/// An invoice header as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub id: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub status: InvoiceStatus,
    pub branch_id: String,
    pub created_at: DateTime<Utc>,
}

/// One invoice line as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceItemRecord {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// After line discounts; this is what margin revenue uses.
    pub total_cents: i64,
}

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    pub async fn insert_invoice(&self, invoice: &InvoiceRecord) -> DbResult<()> {
        debug!(
            id = %invoice.id,
            number = %invoice.invoice_number,
            status = ?invoice.status,
            "Inserting invoice"
        );

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, invoice_date, status, branch_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(invoice.invoice_date)
        .bind(invoice.status)
        .bind(&invoice.branch_id)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_item(&self, item: &InvoiceItemRecord) -> DbResult<()> {
        debug!(invoice_id = %item.invoice_id, product_id = %item.product_id, "Inserting invoice item");

        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, product_id, quantity, unit_price_cents, total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.invoice_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_cents)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lines of completed invoices dated within `[from, to]`. Either bound
    /// may be open. `None` branch means every branch.
    pub async fn completed_line_items(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        branch_id: Option<&str>,
    ) -> DbResult<Vec<InvoiceLineItem>> {
        debug!(from = ?from, to = ?to, branch_id = ?branch_id, "Fetching completed invoice lines");

        let records = sqlx::query_as::<_, LineItemRecord>(
            r#"
            SELECT
                i.id AS invoice_id, i.invoice_number, i.invoice_date, i.status, i.branch_id,
                it.product_id, p.sku, p.name AS product_name, p.category,
                it.quantity, it.unit_price_cents, it.total_cents, p.cost_price_cents
            FROM invoice_items it
            INNER JOIN invoices i ON i.id = it.invoice_id
            INNER JOIN products p ON p.id = it.product_id
            WHERE i.status = 'completed'
            AND (?1 IS NULL OR i.invoice_date >= ?1)
            AND (?2 IS NULL OR i.invoice_date <= ?2)
            AND (?3 IS NULL OR i.branch_id = ?3)
            ORDER BY i.invoice_date, i.invoice_number, it.id
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "Invoice lines fetched");
        Ok(records.into_iter().map(InvoiceLineItem::from).collect())
    }
}

/// Helper to generate a new invoice or item ID.
pub fn generate_invoice_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LineItemRecord {
    invoice_id: String,
    invoice_number: String,
    invoice_date: NaiveDate,
    status: InvoiceStatus,
    branch_id: String,
    product_id: String,
    sku: String,
    product_name: String,
    category: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
    total_cents: i64,
    cost_price_cents: i64,
}

impl From<LineItemRecord> for InvoiceLineItem {
    fn from(r: LineItemRecord) -> Self {
        InvoiceLineItem {
            invoice_id: r.invoice_id,
            invoice_number: r.invoice_number,
            invoice_date: r.invoice_date,
            status: r.status,
            branch_id: r.branch_id,
            product_id: r.product_id,
            sku: r.sku,
            product_name: r.product_name,
            category: r.category,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
            total_cents: r.total_cents,
            cost_price_cents: r.cost_price_cents,
        }
    }
}
