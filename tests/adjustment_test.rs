use std::sync::Arc;

use assert_matches::assert_matches;
use chainops_inventory::engine::FifoEngine;
use chainops_inventory::errors::InventoryError;
use chainops_inventory::models::{
    AdjustStockRequest, InboundRequest, LotStatus, Money, MovementType, OutboundRequest,
};
use chainops_inventory::store::memory::InMemoryInventoryStore;
use chainops_inventory::store::InventoryStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn setup() -> (Arc<InMemoryInventoryStore>, FifoEngine) {
    let store = Arc::new(InMemoryInventoryStore::new());
    let engine = FifoEngine::new(store.clone());
    (store, engine)
}

async fn seed_lot(engine: &FifoEngine, qty: Decimal) -> i64 {
    engine
        .process_inbound(InboundRequest {
            material_id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            quantity: qty,
            unit_cost: Money::new(dec!(2), "USD"),
            lot_number: None,
            expiry_date: None,
            supplier_info: None,
            received_date: None,
            reference_id: None,
            notes: None,
        })
        .await
        .unwrap()
        .lot_id
}

fn adjust(lot_id: i64, delta: Decimal) -> AdjustStockRequest {
    AdjustStockRequest {
        lot_id,
        adjustment_quantity: delta,
        reason: "cycle count".into(),
        notes: None,
        approved_by: "ops-manager".into(),
    }
}

#[tokio::test]
async fn signed_delta_moves_quantity_and_writes_audit() {
    let (store, engine) = setup();
    let lot_id = seed_lot(&engine, dec!(50)).await;

    let result = engine.adjust_stock(adjust(lot_id, dec!(-20))).await.unwrap();
    assert_eq!(result.previous_quantity, dec!(50));
    assert_eq!(result.new_quantity, dec!(30));
    assert_eq!(result.status, LotStatus::Active);

    let audits = store.adjustments().await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].lot_id, lot_id);
    assert_eq!(audits[0].previous_quantity, dec!(50));
    assert_eq!(audits[0].new_quantity, dec!(30));
    assert_eq!(audits[0].delta, dec!(-20));
    assert_eq!(audits[0].approved_by, "ops-manager");

    // The audit trail is separate from the movement ledger.
    assert_eq!(store.movements().await.len(), 1); // the seeding purchase only
}

#[tokio::test]
async fn overdraw_is_rejected_not_clamped() {
    let (store, engine) = setup();
    let lot_id = seed_lot(&engine, dec!(50)).await;
    engine.adjust_stock(adjust(lot_id, dec!(-20))).await.unwrap();

    let err = engine.adjust_stock(adjust(lot_id, dec!(-1000))).await.unwrap_err();
    assert_matches!(
        err,
        InventoryError::InvalidAdjustment { available, delta, .. }
            if available == dec!(30) && delta == dec!(-1000)
    );

    // Quantity untouched, no audit row for the rejected attempt.
    let lot = store.get_lot(lot_id).await.unwrap().unwrap();
    assert_eq!(lot.available_quantity, dec!(30));
    assert_eq!(store.adjustments().await.len(), 1);
}

#[tokio::test]
async fn adjusting_to_zero_depletes_and_back_reactivates() {
    let (store, engine) = setup();
    let lot_id = seed_lot(&engine, dec!(10)).await;

    let result = engine.adjust_stock(adjust(lot_id, dec!(-10))).await.unwrap();
    assert_eq!(result.status, LotStatus::Depleted);

    let result = engine.adjust_stock(adjust(lot_id, dec!(4))).await.unwrap();
    assert_eq!(result.status, LotStatus::Active);
    assert_eq!(result.new_quantity, dec!(4));

    let lot = store.get_lot(lot_id).await.unwrap().unwrap();
    assert_eq!(lot.status, LotStatus::Active);
}

#[tokio::test]
async fn quarantined_lot_cannot_be_adjusted_or_consumed() {
    let (store, engine) = setup();
    let lot_id = seed_lot(&engine, dec!(10)).await;
    let lot = store.get_lot(lot_id).await.unwrap().unwrap();

    engine
        .transition_lot_status(lot_id, LotStatus::Quarantined, "quality hold", "qa")
        .await
        .unwrap();

    let err = engine.adjust_stock(adjust(lot_id, dec!(-1))).await.unwrap_err();
    assert_matches!(err, InventoryError::Validation(_));

    // Quarantined stock is invisible to the FIFO path.
    let result = engine
        .process_outbound(OutboundRequest {
            material_id: lot.material_id,
            store_id: lot.store_id,
            quantity: dec!(5),
            movement_type: MovementType::Usage,
            reference_id: None,
            notes: None,
        })
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.shortage_quantity, dec!(5));
    assert!(result.used_lots.is_empty());
}

#[tokio::test]
async fn missing_lot_is_a_typed_error() {
    let (_, engine) = setup();
    let err = engine.adjust_stock(adjust(9999, dec!(-1))).await.unwrap_err();
    assert_matches!(err, InventoryError::LotNotFound(9999));
}

#[tokio::test]
async fn zero_delta_is_rejected() {
    let (_, engine) = setup();
    let lot_id = seed_lot(&engine, dec!(10)).await;
    let err = engine.adjust_stock(adjust(lot_id, Decimal::ZERO)).await.unwrap_err();
    assert_matches!(err, InventoryError::Validation(_));
}
