use std::sync::Arc;

use chainops_inventory::engine::FifoEngine;
use chainops_inventory::models::{
    ExpiryAlertLevel, InboundRequest, LotStatus, Money, SuggestedAction,
};
use chainops_inventory::store::memory::InMemoryInventoryStore;
use chainops_inventory::store::InventoryStore;
use chrono::{DateTime, NaiveDate, Utc};
use rstest::rstest;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn setup() -> (Arc<InMemoryInventoryStore>, FifoEngine) {
    let store = Arc::new(InMemoryInventoryStore::new());
    let engine = FifoEngine::new(store.clone());
    (store, engine)
}

fn as_of() -> DateTime<Utc> {
    "2024-01-15T08:00:00Z".parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn seed_expiring(
    engine: &FifoEngine,
    store_id: Uuid,
    expiry: Option<NaiveDate>,
) -> i64 {
    engine
        .process_inbound(InboundRequest {
            material_id: Uuid::new_v4(),
            store_id,
            quantity: dec!(10),
            unit_cost: Money::new(dec!(2), "USD"),
            lot_number: None,
            expiry_date: expiry,
            supplier_info: None,
            received_date: Some(as_of() - chrono::Duration::days(30)),
            reference_id: None,
            notes: None,
        })
        .await
        .unwrap()
        .lot_id
}

#[rstest]
#[case("2024-01-10", -5, ExpiryAlertLevel::Expired, SuggestedAction::Dispose)]
#[case("2024-01-15", 0, ExpiryAlertLevel::Critical, SuggestedAction::Discount)]
#[case("2024-01-17", 2, ExpiryAlertLevel::Critical, SuggestedAction::Discount)]
#[case("2024-01-18", 3, ExpiryAlertLevel::Critical, SuggestedAction::Discount)]
#[case("2024-01-19", 4, ExpiryAlertLevel::Warning, SuggestedAction::UseFirst)]
#[tokio::test]
async fn classification_bands(
    #[case] expiry: &str,
    #[case] expected_days: i64,
    #[case] expected_level: ExpiryAlertLevel,
    #[case] expected_action: SuggestedAction,
) {
    let (_, engine) = setup();
    let store_id = Uuid::new_v4();
    seed_expiring(&engine, store_id, Some(date(expiry))).await;

    let flagged = engine.get_expiring_lots(store_id, 7, as_of()).await.unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].days_until_expiry, expected_days);
    assert_eq!(flagged[0].alert_level, expected_level);
    assert_eq!(flagged[0].suggested_action, expected_action);
}

#[tokio::test]
async fn lots_outside_the_window_or_without_expiry_are_skipped() {
    let (_, engine) = setup();
    let store_id = Uuid::new_v4();
    seed_expiring(&engine, store_id, Some(date("2024-01-30"))).await;
    seed_expiring(&engine, store_id, None).await;

    let flagged = engine.get_expiring_lots(store_id, 7, as_of()).await.unwrap();
    assert!(flagged.is_empty());
}

#[tokio::test]
async fn results_are_ordered_by_expiry_ascending() {
    let (_, engine) = setup();
    let store_id = Uuid::new_v4();
    seed_expiring(&engine, store_id, Some(date("2024-01-20"))).await;
    seed_expiring(&engine, store_id, Some(date("2024-01-16"))).await;
    seed_expiring(&engine, store_id, Some(date("2024-01-12"))).await;

    let flagged = engine.get_expiring_lots(store_id, 7, as_of()).await.unwrap();
    let days: Vec<i64> = flagged.iter().map(|f| f.days_until_expiry).collect();
    assert_eq!(days, vec![-3, 1, 5]);
}

#[tokio::test]
async fn scan_is_a_pure_read() {
    let (store, engine) = setup();
    let store_id = Uuid::new_v4();
    let lot_id = seed_expiring(&engine, store_id, Some(date("2024-01-10"))).await;

    engine.get_expiring_lots(store_id, 7, as_of()).await.unwrap();

    // Still Active; the sweep drives the transition separately.
    let lot = store.get_lot(lot_id).await.unwrap().unwrap();
    assert_eq!(lot.status, LotStatus::Active);

    engine
        .transition_lot_status(lot_id, LotStatus::Expired, "expiry sweep", "cron")
        .await
        .unwrap();
    let lot = store.get_lot(lot_id).await.unwrap().unwrap();
    assert_eq!(lot.status, LotStatus::Expired);

    // Expired stock is gone from the scanner too (it only reports Active lots).
    let flagged = engine.get_expiring_lots(store_id, 7, as_of()).await.unwrap();
    assert!(flagged.is_empty());
}
