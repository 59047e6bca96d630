//! # Cost Layer Repository
//!
//! Read-only access to FIFO cost layers and their consumption trail.
//!
//! Layers are created from GRNs and decremented by backend procedures. This
//! repository never writes them.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use fixbay_core::{CostLayer, CostLayerConsumption, CostLayerSource};

#[derive(Debug, Clone)]
pub struct CostLayerRepository {
    pool: SqlitePool,
}

impl CostLayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CostLayerRepository { pool }
    }

    /// Layers for a product, oldest receipt first (ties by creation time).
    pub async fn layers_for_product(
        &self,
        product_id: &str,
        branch_id: Option<&str>,
    ) -> DbResult<Vec<CostLayer>> {
        debug!(product_id = %product_id, branch_id = ?branch_id, "Fetching cost layers");

        let records = sqlx::query_as::<_, CostLayerRecord>(
            r#"
            SELECT
                id, product_id, branch_id, source_type, grn_id, received_qty,
                remaining_qty, unit_cost_cents, received_date, is_exhausted, created_at
            FROM cost_layers
            WHERE product_id = ?1
            AND (?2 IS NULL OR branch_id = ?2)
            ORDER BY received_date ASC, created_at ASC
            "#,
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(CostLayer::from).collect())
    }

    /// Consumptions drawn against a product's layers, newest first.
    ///
    /// The branch filter applies to the layer the stock was drawn from.
    pub async fn consumptions_for_product(
        &self,
        product_id: &str,
        branch_id: Option<&str>,
    ) -> DbResult<Vec<CostLayerConsumption>> {
        debug!(product_id = %product_id, branch_id = ?branch_id, "Fetching layer consumptions");

        let records = sqlx::query_as::<_, ConsumptionRecord>(
            r#"
            SELECT
                c.id, c.layer_id, c.product_id, c.quantity, c.unit_cost_cents,
                c.consumed_at, c.reference_type, c.reference_id
            FROM cost_layer_consumptions c
            INNER JOIN cost_layers l ON l.id = c.layer_id
            WHERE c.product_id = ?1
            AND (?2 IS NULL OR l.branch_id = ?2)
            ORDER BY c.consumed_at DESC
            "#,
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(CostLayerConsumption::from).collect())
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct CostLayerRecord {
    id: String,
    product_id: String,
    branch_id: String,
    source_type: CostLayerSource,
    grn_id: Option<String>,
    received_qty: i64,
    remaining_qty: i64,
    unit_cost_cents: i64,
    received_date: NaiveDate,
    is_exhausted: bool,
    created_at: DateTime<Utc>,
}

impl From<CostLayerRecord> for CostLayer {
    fn from(r: CostLayerRecord) -> Self {
        CostLayer {
            id: r.id,
            product_id: r.product_id,
            branch_id: r.branch_id,
            source_type: r.source_type,
            grn_id: r.grn_id,
            received_qty: r.received_qty,
            remaining_qty: r.remaining_qty,
            unit_cost_cents: r.unit_cost_cents,
            received_date: r.received_date,
            is_exhausted: r.is_exhausted,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ConsumptionRecord {
    id: String,
    layer_id: String,
    product_id: String,
    quantity: i64,
    unit_cost_cents: i64,
    consumed_at: DateTime<Utc>,
    reference_type: Option<String>,
    reference_id: Option<String>,
}

impl From<ConsumptionRecord> for CostLayerConsumption {
    fn from(r: ConsumptionRecord) -> Self {
        CostLayerConsumption {
            id: r.id,
            layer_id: r.layer_id,
            product_id: r.product_id,
            quantity: r.quantity,
            unit_cost_cents: r.unit_cost_cents,
            consumed_at: r.consumed_at,
            reference_type: r.reference_type,
            reference_id: r.reference_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use fixbay_core::{CostingMethod, Product};

    /// Layers are written by the backend; tests stand in for it with raw SQL.
    async fn insert_layer(
        db: &Database,
        id: &str,
        branch: &str,
        received: i64,
        remaining: i64,
        date: &str,
        created_at: &str,
    ) {
        sqlx::query(
            r#"
            INSERT INTO cost_layers (
                id, product_id, branch_id, source_type, grn_id, received_qty,
                remaining_qty, unit_cost_cents, received_date, is_exhausted, created_at
            ) VALUES (?1, 'p-1', ?2, 'grn', 'grn-1', ?3, ?4, 1000, ?5, ?6, ?7)
            "#,
        )
        .bind(id)
        .bind(branch)
        .bind(received)
        .bind(remaining)
        .bind(date)
        .bind(remaining == 0)
        .bind(created_at)
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn insert_consumption(db: &Database, id: &str, layer_id: &str, consumed_at: &str) {
        sqlx::query(
            r#"
            INSERT INTO cost_layer_consumptions (
                id, layer_id, product_id, quantity, unit_cost_cents, consumed_at,
                reference_type, reference_id
            ) VALUES (?1, ?2, 'p-1', 2, 1000, ?3, 'invoice', 'inv-1')
            "#,
        )
        .bind(id)
        .bind(layer_id)
        .bind(consumed_at)
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product {
                id: "p-1".to_string(),
                sku: "LCD-IP12".to_string(),
                name: "iPhone 12 Screen".to_string(),
                category: None,
                cost_price_cents: 1000,
                average_cost_cents: None,
                costing_method: CostingMethod::Fifo,
                is_active: true,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            })
            .await
            .unwrap();

        insert_layer(&db, "L3", "main", 10, 10, "2024-03-01", "2024-03-01T09:00:00+00:00").await;
        insert_layer(&db, "L1b", "main", 5, 0, "2024-01-10", "2024-01-10T15:00:00+00:00").await;
        insert_layer(&db, "L1a", "main", 100, 40, "2024-01-10", "2024-01-10T08:00:00+00:00").await;
        insert_layer(&db, "N1", "north", 8, 8, "2024-02-01", "2024-02-01T08:00:00+00:00").await;

        insert_consumption(&db, "c1", "L1a", "2024-01-20T10:00:00+00:00").await;
        insert_consumption(&db, "c2", "L1b", "2024-02-05T10:00:00+00:00").await;
        insert_consumption(&db, "c3", "N1", "2024-03-05T10:00:00+00:00").await;
        db
    }

    #[tokio::test]
    async fn test_layers_in_fifo_order() {
        let db = seeded().await;
        let layers = db.cost_layers().layers_for_product("p-1", Some("main")).await.unwrap();

        let ids: Vec<&str> = layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["L1a", "L1b", "L3"]);

        let first = &layers[0];
        assert_eq!(first.remaining_value().cents(), 40_000);
        assert!(!first.is_exhausted);
        assert!(layers[1].is_exhausted);
        assert_eq!(first.received_date, chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[tokio::test]
    async fn test_layers_all_branches() {
        let db = seeded().await;
        let layers = db.cost_layers().layers_for_product("p-1", None).await.unwrap();
        assert_eq!(layers.len(), 4);
        assert!(db
            .cost_layers()
            .layers_for_product("other", None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_consumptions_newest_first() {
        let db = seeded().await;
        let repo = db.cost_layers();

        let all = repo.consumptions_for_product("p-1", None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2", "c1"]);
        assert_eq!(all[0].total_cost().cents(), 2000);

        let main = repo.consumptions_for_product("p-1", Some("main")).await.unwrap();
        assert_eq!(main.len(), 2);
    }
}
