//! # Product Repository
//!
//! Products and their per-branch stock levels.
//!
//! ## Key Operations
//! - `stock_positions` feeds the valuation aggregator
//! - `insert` / `insert_stock_level` keep the projection current (and seed it)
//!
//! ## Stock Position Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_levels s ──INNER JOIN── products p  (p.is_active = 1)            │
//! │       │                                                                 │
//! │       ├── branch filter (optional)                                      │
//! │       ▼                                                                 │
//! │  ORDER BY p.name, s.branch_id                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StockPosition { product, level }  one per (product, branch)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use fixbay_core::{CostingMethod, Product, StockLevel, StockPosition};

/// Repository for product and stock level operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let positions = repo.stock_positions(Some("main")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT
                id, sku, name, category, cost_price_cents, average_cost_cents,
                costing_method, is_active, created_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Product::from))
    }

    /// Gets a product by SKU (case-sensitive, as stored).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT
                id, sku, name, category, cost_price_cents, average_cost_cents,
                costing_method, is_active, created_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Product::from))
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, category, cost_price_cents, average_cost_cents,
                costing_method, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.cost_price_cents)
        .bind(product.average_cost_cents)
        .bind(product.costing_method)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a stock level row for one (product, branch).
    pub async fn insert_stock_level(&self, level: &StockLevel) -> DbResult<()> {
        debug!(
            product_id = %level.product_id,
            branch_id = %level.branch_id,
            on_hand = level.quantity_on_hand,
            "Inserting stock level"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_levels (
                product_id, branch_id, quantity_on_hand, quantity_reserved,
                average_unit_cost_cents, last_received_date, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&level.product_id)
        .bind(&level.branch_id)
        .bind(level.quantity_on_hand)
        .bind(level.quantity_reserved)
        .bind(level.average_unit_cost_cents)
        .bind(level.last_received_date)
        .bind(level.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists every active product's stock position, optionally limited to
    /// one branch.
    ///
    /// Products without a stock level row at the branch are not returned.
    pub async fn stock_positions(&self, branch_id: Option<&str>) -> DbResult<Vec<StockPosition>> {
        debug!(branch_id = ?branch_id, "Fetching stock positions");

        let records = sqlx::query_as::<_, StockPositionRecord>(
            r#"
            SELECT
                p.id, p.sku, p.name, p.category, p.cost_price_cents,
                p.average_cost_cents, p.costing_method, p.is_active, p.created_at,
                s.branch_id, s.quantity_on_hand, s.quantity_reserved,
                s.average_unit_cost_cents, s.last_received_date, s.updated_at
            FROM stock_levels s
            INNER JOIN products p ON p.id = s.product_id
            WHERE p.is_active = 1
            AND (?1 IS NULL OR s.branch_id = ?1)
            ORDER BY p.name, s.branch_id
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "Stock positions fetched");
        Ok(records.into_iter().map(StockPosition::from).collect())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRecord {
    id: String,
    sku: String,
    name: String,
    category: Option<String>,
    cost_price_cents: i64,
    average_cost_cents: Option<i64>,
    costing_method: CostingMethod,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        Product {
            id: r.id,
            sku: r.sku,
            name: r.name,
            category: r.category,
            cost_price_cents: r.cost_price_cents,
            average_cost_cents: r.average_cost_cents,
            costing_method: r.costing_method,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct StockPositionRecord {
    id: String,
    sku: String,
    name: String,
    category: Option<String>,
    cost_price_cents: i64,
    average_cost_cents: Option<i64>,
    costing_method: CostingMethod,
    is_active: bool,
    created_at: DateTime<Utc>,
    branch_id: String,
    quantity_on_hand: i64,
    quantity_reserved: i64,
    average_unit_cost_cents: Option<i64>,
    last_received_date: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

impl From<StockPositionRecord> for StockPosition {
    fn from(r: StockPositionRecord) -> Self {
        let level = StockLevel {
            product_id: r.id.clone(),
            branch_id: r.branch_id,
            quantity_on_hand: r.quantity_on_hand,
            quantity_reserved: r.quantity_reserved,
            average_unit_cost_cents: r.average_unit_cost_cents,
            last_received_date: r.last_received_date,
            updated_at: r.updated_at,
        };
        let product = Product {
            id: r.id,
            sku: r.sku,
            name: r.name,
            category: r.category,
            cost_price_cents: r.cost_price_cents,
            average_cost_cents: r.average_cost_cents,
            costing_method: r.costing_method,
            is_active: r.is_active,
            created_at: r.created_at,
        };
        StockPosition { product, level }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;

    fn product(id: &str, sku: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            category: Some("Parts".to_string()),
            cost_price_cents: 6000,
            average_cost_cents: Some(5800),
            costing_method: CostingMethod::Fifo,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
        }
    }

    fn level(product_id: &str, branch_id: &str, on_hand: i64) -> StockLevel {
        StockLevel {
            product_id: product_id.to_string(),
            branch_id: branch_id.to_string(),
            quantity_on_hand: on_hand,
            quantity_reserved: 1,
            average_unit_cost_cents: Some(5900),
            last_received_date: NaiveDate::from_ymd_opt(2024, 4, 15),
            updated_at: Utc.with_ymd_and_hms(2024, 4, 15, 16, 30, 0).unwrap(),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_product() {
        let db = db().await;
        let repo = db.products();
        let p = product("p-1", "LCD-IP12", "iPhone 12 Screen");

        repo.insert(&p).await.unwrap();

        assert_eq!(repo.get_by_id("p-1").await.unwrap(), Some(p.clone()));
        assert_eq!(repo.get_by_sku("LCD-IP12").await.unwrap(), Some(p));
        assert_eq!(repo.get_by_id("missing").await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_unique_violation() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&product("p-1", "LCD-IP12", "A")).await.unwrap();

        let err = repo
            .insert(&product("p-2", "LCD-IP12", "B"))
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { field } => assert_eq!(field, "products.sku"),
            other => panic!("expected unique violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stock_level_requires_product() {
        let db = db().await;
        let err = db
            .products()
            .insert_stock_level(&level("ghost", "main", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_stock_positions_round_trip_and_order() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&product("p-b", "BAT-S21", "Galaxy S21 Battery")).await.unwrap();
        repo.insert(&product("p-a", "LCD-IP12", "iPhone 12 Screen")).await.unwrap();
        repo.insert_stock_level(&level("p-a", "north", 2)).await.unwrap();
        repo.insert_stock_level(&level("p-a", "main", 5)).await.unwrap();
        repo.insert_stock_level(&level("p-b", "main", 7)).await.unwrap();

        let all = repo.stock_positions(None).await.unwrap();
        let keys: Vec<(&str, &str)> = all
            .iter()
            .map(|p| (p.product.id.as_str(), p.level.branch_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("p-b", "main"), ("p-a", "main"), ("p-a", "north")]);

        let first = &all[1];
        assert_eq!(first.level, level("p-a", "main", 5));
        assert_eq!(first.product.costing_method, CostingMethod::Fifo);

        let north = repo.stock_positions(Some("north")).await.unwrap();
        assert_eq!(north.len(), 1);
        assert_eq!(north[0].level.quantity_on_hand, 2);
    }

    #[tokio::test]
    async fn test_inactive_products_are_excluded() {
        let db = db().await;
        let repo = db.products();
        let mut retired = product("p-1", "OLD-1", "Retired Part");
        retired.is_active = false;

        repo.insert(&retired).await.unwrap();
        repo.insert_stock_level(&level("p-1", "main", 4)).await.unwrap();

        assert!(repo.stock_positions(None).await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
