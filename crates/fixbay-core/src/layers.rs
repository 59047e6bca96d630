//! # Cost Layers
//!
//! Read-side helpers for the cost layers dialog: ordering, invariant checks
//! and per-layer/per-product roll-ups.
//!
//! ```text
//!   received_date ──►   oldest                               newest
//!                     ┌──────────┐ ┌──────────┐ ┌──────────┐
//!   fifo_order()      │ L1 40/100│ │ L2 25/25 │ │ L3 10/10 │   remaining/received
//!                     └──────────┘ └──────────┘ └──────────┘
//!                       consumed first ─────────────────►
//!
//!   consumption_trail()  newest consumption first
//! ```
//!
//! Layers are never written here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CostLayer, CostLayerConsumption};
use crate::valuation::AgingBucket;

// =============================================================================
// Invariants
// =============================================================================

/// Checks a layer read from the backend against its own invariants.
pub fn check_invariants(layer: &CostLayer) -> CoreResult<()> {
    let fail = |reason: String| CoreError::InconsistentCostLayer {
        layer_id: layer.id.clone(),
        reason,
    };

    if layer.received_qty < 0 || layer.remaining_qty < 0 {
        return Err(fail(format!(
            "negative quantity (received {}, remaining {})",
            layer.received_qty, layer.remaining_qty
        )));
    }

    if layer.remaining_qty > layer.received_qty {
        return Err(fail(format!(
            "remaining {} exceeds received {}",
            layer.remaining_qty, layer.received_qty
        )));
    }

    if layer.is_exhausted != (layer.remaining_qty == 0) {
        return Err(fail(format!(
            "is_exhausted is {} with {} remaining",
            layer.is_exhausted, layer.remaining_qty
        )));
    }

    Ok(())
}

// =============================================================================
// Ordering
// =============================================================================

/// Sorts layers oldest receipt first, ties by creation time.
pub fn fifo_order(mut layers: Vec<CostLayer>) -> Vec<CostLayer> {
    layers.sort_by(|a, b| {
        a.received_date
            .cmp(&b.received_date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    layers
}

/// Sorts consumptions newest first.
pub fn consumption_trail(mut consumptions: Vec<CostLayerConsumption>) -> Vec<CostLayerConsumption> {
    consumptions.sort_by(|a, b| b.consumed_at.cmp(&a.consumed_at));
    consumptions
}

// =============================================================================
// Views
// =============================================================================

/// One row of the cost layers dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostLayerView {
    pub layer: CostLayer,
    pub remaining_value_cents: i64,
    pub consumed_qty: i64,
    pub days_held: i64,
    pub aging_bucket: AgingBucket,
}

impl CostLayerView {
    pub fn new(layer: CostLayer, as_of: NaiveDate) -> Self {
        let days_held = (as_of - layer.received_date).num_days().max(0);
        CostLayerView {
            remaining_value_cents: layer.remaining_value().cents(),
            consumed_qty: layer.consumed_qty(),
            days_held,
            aging_bucket: AgingBucket::from_days(days_held),
            layer,
        }
    }
}

/// Totals across a product's layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub active_layers: usize,
    pub exhausted_layers: usize,
    pub total_remaining_qty: i64,
    pub total_remaining_value_cents: i64,
    /// Remaining value / remaining qty over active layers; 0 when none.
    pub weighted_unit_cost_cents: i64,
    #[ts(as = "Option<String>")]
    pub oldest_active_date: Option<NaiveDate>,
}

pub fn summarize_layers(layers: &[CostLayer]) -> LayerSummary {
    let (active, exhausted): (Vec<&CostLayer>, Vec<&CostLayer>) =
        layers.iter().partition(|l| !l.is_exhausted);

    let total_remaining_qty: i64 = active.iter().map(|l| l.remaining_qty).sum();
    let total_remaining_value: Money = active.iter().map(|l| l.remaining_value()).sum();

    LayerSummary {
        active_layers: active.len(),
        exhausted_layers: exhausted.len(),
        total_remaining_qty,
        total_remaining_value_cents: total_remaining_value.cents(),
        weighted_unit_cost_cents: total_remaining_value
            .divide_by_quantity(total_remaining_qty)
            .unwrap_or_default()
            .cents(),
        oldest_active_date: active.iter().map(|l| l.received_date).min(),
    }
}

/// Everything the cost layers dialog shows for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostLayerReport {
    pub product_id: String,
    pub layers: Vec<CostLayerView>,
    pub consumptions: Vec<CostLayerConsumption>,
    pub summary: LayerSummary,
}

impl CostLayerReport {
    /// Orders, validates and summarizes. Fails on the first inconsistent
    /// layer.
    pub fn build(
        product_id: &str,
        layers: Vec<CostLayer>,
        consumptions: Vec<CostLayerConsumption>,
        as_of: NaiveDate,
    ) -> CoreResult<Self> {
        for layer in &layers {
            check_invariants(layer)?;
        }

        let layers = fifo_order(layers);
        let summary = summarize_layers(&layers);

        Ok(CostLayerReport {
            product_id: product_id.to_string(),
            layers: layers
                .into_iter()
                .map(|l| CostLayerView::new(l, as_of))
                .collect(),
            consumptions: consumption_trail(consumptions),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CostLayerSource;
    use chrono::{TimeZone, Utc};

    fn layer(id: &str, received: i64, remaining: i64, cost: i64, day: u32) -> CostLayer {
        CostLayer {
            id: id.to_string(),
            product_id: "p-1".to_string(),
            branch_id: "main".to_string(),
            source_type: CostLayerSource::Grn,
            grn_id: Some("grn-1".to_string()),
            received_qty: received,
            remaining_qty: remaining,
            unit_cost_cents: cost,
            received_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            is_exhausted: remaining == 0,
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        }
    }

    fn consumption(id: &str, hour: u32) -> CostLayerConsumption {
        CostLayerConsumption {
            id: id.to_string(),
            layer_id: "L1".to_string(),
            product_id: "p-1".to_string(),
            quantity: 1,
            unit_cost_cents: 1000,
            consumed_at: Utc.with_ymd_and_hms(2024, 2, 1, hour, 0, 0).unwrap(),
            reference_type: Some("invoice".to_string()),
            reference_id: None,
        }
    }

    #[test]
    fn test_partially_consumed_layer() {
        let l = layer("L1", 100, 40, 10, 1);
        assert!(check_invariants(&l).is_ok());
        assert_eq!(l.remaining_value().cents(), 400);
        assert_eq!(l.consumed_qty(), 60);
        assert!(!l.is_exhausted);
    }

    #[test]
    fn test_invariant_violations() {
        let over = layer("L1", 10, 20, 10, 1);
        assert!(matches!(
            check_invariants(&over),
            Err(CoreError::InconsistentCostLayer { .. })
        ));

        let mut flag = layer("L2", 10, 0, 10, 1);
        flag.is_exhausted = false;
        assert!(check_invariants(&flag).is_err());

        let negative = layer("L3", 10, -1, 10, 1);
        assert!(check_invariants(&negative).is_err());
    }

    #[test]
    fn test_fifo_order_by_date_then_creation() {
        let mut same_day_later = layer("L-b", 5, 5, 10, 3);
        same_day_later.created_at = Utc.with_ymd_and_hms(2024, 1, 3, 18, 0, 0).unwrap();
        let ordered = fifo_order(vec![
            same_day_later,
            layer("L-c", 5, 5, 10, 9),
            layer("L-a", 5, 5, 10, 3),
            layer("L-0", 5, 0, 10, 1),
        ]);
        let ids: Vec<&str> = ordered.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["L-0", "L-a", "L-b", "L-c"]);
    }

    #[test]
    fn test_consumption_trail_newest_first() {
        let trail = consumption_trail(vec![consumption("c1", 8), consumption("c3", 17), consumption("c2", 12)]);
        let ids: Vec<&str> = trail.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2", "c1"]);
    }

    #[test]
    fn test_summary_ignores_exhausted_layers() {
        let layers = vec![
            layer("L1", 100, 0, 900, 1),
            layer("L2", 100, 40, 10, 2),
            layer("L3", 20, 20, 25, 5),
        ];
        let summary = summarize_layers(&layers);

        assert_eq!(summary.active_layers, 2);
        assert_eq!(summary.exhausted_layers, 1);
        assert_eq!(summary.total_remaining_qty, 60);
        assert_eq!(summary.total_remaining_value_cents, 400 + 500);
        assert_eq!(summary.weighted_unit_cost_cents, 15);
        assert_eq!(summary.oldest_active_date, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn test_summary_of_fully_consumed_product() {
        let summary = summarize_layers(&[layer("L1", 10, 0, 100, 1)]);
        assert_eq!(summary.weighted_unit_cost_cents, 0);
        assert_eq!(summary.oldest_active_date, None);
    }

    #[test]
    fn test_report_build() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = CostLayerReport::build(
            "p-1",
            vec![layer("L2", 10, 10, 50, 20), layer("L1", 100, 40, 10, 1)],
            vec![consumption("c1", 8), consumption("c2", 9)],
            as_of,
        )
        .unwrap();

        assert_eq!(report.layers[0].layer.id, "L1");
        assert_eq!(report.layers[0].remaining_value_cents, 400);
        assert_eq!(report.layers[0].days_held, 60);
        assert_eq!(report.layers[0].aging_bucket, AgingBucket::Days31To60);
        assert_eq!(report.consumptions[0].id, "c2");
        assert_eq!(report.summary.total_remaining_qty, 50);
    }

    #[test]
    fn test_report_rejects_inconsistent_layer() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let result = CostLayerReport::build("p-1", vec![layer("L1", 1, 5, 10, 1)], vec![], as_of);
        assert!(result.is_err());
    }
}
