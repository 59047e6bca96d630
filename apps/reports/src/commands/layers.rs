//! # Cost Layer Command
//!
//! Drill-down for one product: its cost layers in FIFO order, each layer's
//! age, and the consumption trail newest first. The product may be given
//! by id or by SKU. Without `--branch` the configured default branch
//! applies; with neither, layers from every branch are shown.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use fixbay_core::validation::validate_identifier;
use fixbay_core::{CostLayerReport, Product};
use fixbay_db::Database;

use super::{optional_date, resolve_branch};
use crate::cli::LayerArgs;
use crate::config::ReportSettings;
use crate::error::ApiError;

/// Finds a product by id, then by SKU.
pub async fn resolve_product(db: &Database, key: &str) -> Result<Product, ApiError> {
    let key = validate_identifier("product", key)?;
    let products = db.products();

    if let Some(product) = products.get_by_id(&key).await? {
        return Ok(product);
    }

    debug!(key = %key, "No product with that id, trying SKU");
    products
        .get_by_sku(&key)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &key))
}

pub async fn layers(
    db: &Database,
    settings: &ReportSettings,
    args: &LayerArgs,
    today: NaiveDate,
) -> Result<CostLayerReport, ApiError> {
    let product = resolve_product(db, &args.product).await?;
    let branch = resolve_branch(args.branch.as_deref(), settings)?;
    let as_of = optional_date("as_of", args.as_of.as_deref())?.unwrap_or(today);

    let repo = db.cost_layers();
    let layers = repo.layers_for_product(&product.id, branch.as_deref()).await?;
    let consumptions = repo
        .consumptions_for_product(&product.id, branch.as_deref())
        .await?;

    if layers.is_empty() {
        warn!(sku = %product.sku, "Product has no cost layers");
    }

    let report = CostLayerReport::build(&product.id, layers, consumptions, as_of)?;

    info!(
        sku = %product.sku,
        active = report.summary.active_layers,
        exhausted = report.summary.exhausted_layers,
        consumptions = report.consumptions.len(),
        "Cost layer report built"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{database, date, product};
    use crate::error::ErrorCode;
    use fixbay_core::{AgingBucket, CostingMethod};

    async fn insert_layer(
        db: &Database,
        id: &str,
        branch: &str,
        received: i64,
        remaining: i64,
        exhausted: bool,
        received_date: &str,
    ) {
        sqlx::query(
            r#"
            INSERT INTO cost_layers (
                id, product_id, branch_id, source_type, grn_id, received_qty,
                remaining_qty, unit_cost_cents, received_date, is_exhausted, created_at
            ) VALUES (?1, 'p-1', ?2, 'grn', NULL, ?3, ?4, 250, ?5, ?6, ?7)
            "#,
        )
        .bind(id)
        .bind(branch)
        .bind(received)
        .bind(remaining)
        .bind(received_date)
        .bind(exhausted)
        .bind(format!("{}T08:00:00+00:00", received_date))
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn insert_consumption(db: &Database, id: &str, layer_id: &str, qty: i64, at: &str) {
        sqlx::query(
            r#"
            INSERT INTO cost_layer_consumptions (
                id, layer_id, product_id, quantity, unit_cost_cents, consumed_at,
                reference_type, reference_id
            ) VALUES (?1, ?2, 'p-1', ?3, 250, ?4, 'invoice', ?1)
            "#,
        )
        .bind(id)
        .bind(layer_id)
        .bind(qty)
        .bind(at)
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn seeded() -> Database {
        let db = database().await;
        db.products()
            .insert(&product("p-1", "BAT-S21", "Batteries", 300, CostingMethod::Fifo))
            .await
            .unwrap();

        insert_layer(&db, "L2", "main", 10, 10, false, "2024-05-20").await;
        insert_layer(&db, "L1", "main", 6, 0, true, "2024-01-15").await;
        insert_layer(&db, "N1", "north", 4, 1, false, "2024-03-01").await;

        insert_consumption(&db, "c1", "L1", 6, "2024-02-01T10:00:00+00:00").await;
        insert_consumption(&db, "c2", "N1", 3, "2024-04-01T10:00:00+00:00").await;
        db
    }

    fn args(product: &str) -> LayerArgs {
        LayerArgs {
            product: product.to_string(),
            as_of: Some("2024-06-01".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_layers_by_sku() {
        let db = seeded().await;
        let report = layers(&db, &ReportSettings::default(), &args("BAT-S21"), date(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(report.product_id, "p-1");
        let ids: Vec<&str> = report.layers.iter().map(|v| v.layer.id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "N1", "L2"]);

        assert_eq!(report.layers[0].aging_bucket, AgingBucket::Over90);
        assert_eq!(report.layers[2].aging_bucket, AgingBucket::Days0To30);

        assert_eq!(report.summary.active_layers, 2);
        assert_eq!(report.summary.exhausted_layers, 1);
        assert_eq!(report.summary.total_remaining_qty, 11);
        assert_eq!(report.summary.total_remaining_value_cents, 2_750);

        assert_eq!(report.consumptions.len(), 2);
        assert_eq!(report.consumptions[0].id, "c2");
    }

    #[tokio::test]
    async fn test_layers_by_id_for_one_branch() {
        let db = seeded().await;
        let args = LayerArgs {
            branch: Some("north".to_string()),
            ..args("p-1")
        };

        let report = layers(&db, &ReportSettings::default(), &args, date(2024, 6, 1))
            .await
            .unwrap();
        assert_eq!(report.layers.len(), 1);
        assert_eq!(report.layers[0].consumed_qty, 3);
        assert_eq!(report.consumptions.len(), 1);
        assert_eq!(report.summary.oldest_active_date, Some(date(2024, 3, 1)));
    }

    #[tokio::test]
    async fn test_settings_branch_applies_without_argument() {
        let db = seeded().await;
        let north = ReportSettings {
            branch_id: Some("north".to_string()),
            ..Default::default()
        };

        let report = layers(&db, &north, &args("p-1"), date(2024, 6, 1)).await.unwrap();
        assert_eq!(report.layers.len(), 1);
        assert_eq!(report.layers[0].layer.branch_id, "north");
        assert_eq!(report.consumptions.len(), 1);

        let blank = LayerArgs {
            branch: Some(" ".to_string()),
            ..args("p-1")
        };
        let report = layers(&db, &north, &blank, date(2024, 6, 1)).await.unwrap();
        assert!(report.layers.iter().all(|l| l.layer.branch_id == "north"));

        let main = LayerArgs {
            branch: Some("main".to_string()),
            ..args("p-1")
        };
        let report = layers(&db, &north, &main, date(2024, 6, 1)).await.unwrap();
        assert!(report.layers.iter().all(|l| l.layer.branch_id == "main"));
        assert_eq!(report.layers.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = seeded().await;
        let err = layers(&db, &ReportSettings::default(), &args("NOPE-1"), date(2024, 6, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("NOPE-1"));
    }

    #[tokio::test]
    async fn test_inconsistent_layer_is_reported() {
        let db = seeded().await;
        insert_layer(&db, "BAD", "main", 2, 5, false, "2024-05-01").await;

        let err = layers(&db, &ReportSettings::default(), &args("p-1"), date(2024, 6, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(err.message.contains("BAD"));
    }

    #[tokio::test]
    async fn test_product_without_layers() {
        let db = database().await;
        db.products()
            .insert(&product("p-1", "CBL-USBC", "Accessories", 200, CostingMethod::WeightedAverage))
            .await
            .unwrap();

        let report = layers(&db, &ReportSettings::default(), &args("CBL-USBC"), date(2024, 6, 1))
            .await
            .unwrap();
        assert!(report.layers.is_empty());
        assert_eq!(report.summary.weighted_unit_cost_cents, 0);
        assert_eq!(report.summary.oldest_active_date, None);
    }
}
