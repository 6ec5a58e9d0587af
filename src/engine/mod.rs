//! FIFO lot-consumption engine.
//!
//! Consumes receipt lots strictly oldest-first, writes exactly one movement
//! record per operation, and keeps lot mutations and the ledger write in one
//! atomic unit through the persistence port. Writers against the same
//! material+store are serialized by a per-key async mutex; cross-process
//! races are caught by the per-lot version check and retried with a fresh
//! snapshot.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::InventoryError;
use crate::models::{
    AdjustStockRequest, AdjustmentRecord, AdjustmentResult, ExpiringLot, ExpiryAlertLevel,
    InboundRequest, InboundResult, InventoryLot, LotStatus, Money, MovementRecord, MovementType,
    NewLot, OutboundRequest, OutboundResult, StockSummary, SuggestedAction, UsedLot,
};
use crate::store::{InventoryStore, LotDecrement, LotQuantityUpdate, LotStatusUpdate};

/// Engine tuning, loaded from the `[engine]` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Retries with a fresh snapshot after a version conflict before the
    /// conflict is surfaced to the caller.
    pub max_conflict_retries: u32,
    /// Currency stamped on movements when no stock exists at all for the
    /// key; whenever lots exist, their currency wins.
    pub default_currency: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            default_currency: "USD".to_string(),
        }
    }
}

pub struct FifoEngine {
    store: Arc<dyn InventoryStore>,
    settings: EngineSettings,
    key_locks: DashMap<(Uuid, Uuid), Arc<Mutex<()>>>,
}

impl FifoEngine {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self::with_settings(store, EngineSettings::default())
    }

    pub fn with_settings(store: Arc<dyn InventoryStore>, settings: EngineSettings) -> Self {
        Self {
            store,
            settings,
            key_locks: DashMap::new(),
        }
    }

    fn key_lock(&self, material_id: Uuid, store_id: Uuid) -> Arc<Mutex<()>> {
        self.key_locks
            .entry((material_id, store_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Consume stock oldest-first.
    ///
    /// A shortage is reported in the result, not as an error; exactly one
    /// movement record is written either way. A repeated `reference_id`
    /// returns the originally recorded outcome without touching any lot.
    #[instrument(skip(self), fields(material_id = %req.material_id, store_id = %req.store_id))]
    pub async fn process_outbound(
        &self,
        req: OutboundRequest,
    ) -> Result<OutboundResult, InventoryError> {
        if req.quantity < Decimal::ZERO {
            return Err(InventoryError::Validation(
                "outbound quantity must not be negative".into(),
            ));
        }
        if !req.movement_type.is_outbound() {
            return Err(InventoryError::Validation(format!(
                "movement type {} cannot consume stock",
                req.movement_type
            )));
        }

        // The replay lookup shares the critical section with the consumption
        // it guards; outside the lock, two calls carrying the same reference
        // could both miss it and both consume.
        let lock = self.key_lock(req.material_id, req.store_id);
        let _guard = lock.lock().await;

        if let Some(reference) = req.reference_id.as_deref() {
            if let Some(movement) = self
                .store
                .find_movement_by_reference(
                    req.material_id,
                    req.store_id,
                    req.movement_type,
                    reference,
                )
                .await?
            {
                debug!(reference, "replaying recorded outbound movement");
                return Ok(Self::outbound_result_from_movement(&movement));
            }
        }

        let mut attempt = 0;
        loop {
            match self.try_consume(&req).await {
                Err(err) if err.is_retryable() && attempt < self.settings.max_conflict_retries => {
                    attempt += 1;
                    warn!(attempt, "consumption snapshot went stale, retrying");
                }
                other => return other,
            }
        }
    }

    async fn try_consume(&self, req: &OutboundRequest) -> Result<OutboundResult, InventoryError> {
        let lots = self
            .store
            .load_active_lots(req.material_id, req.store_id)
            .await?;

        // One currency per key, and a movement that touches no lot (zero
        // quantity, nothing consumable) still carries the currency of
        // whatever stock exists.
        let mut currency: Option<String> = None;
        for lot in &lots {
            match &currency {
                None => currency = Some(lot.unit_cost.currency.clone()),
                Some(c) if *c != lot.unit_cost.currency => {
                    return Err(InventoryError::Validation(format!(
                        "lots for this material mix currencies ({} and {})",
                        c, lot.unit_cost.currency
                    )));
                }
                Some(_) => {}
            }
        }

        let mut remaining = req.quantity;
        let mut used_lots: Vec<UsedLot> = Vec::new();
        let mut decrements: Vec<LotDecrement> = Vec::new();

        for lot in &lots {
            if remaining.is_zero() {
                break;
            }
            let used = lot.available_quantity.min(remaining);
            if used <= Decimal::ZERO {
                continue;
            }
            let line_cost = used * lot.unit_cost.amount;
            used_lots.push(UsedLot {
                lot_id: lot.id,
                lot_number: lot.lot_number.clone(),
                quantity: used,
                unit_cost: lot.unit_cost.clone(),
                total_cost: Money::new(line_cost, &lot.unit_cost.currency),
                received_date: lot.received_date,
            });
            decrements.push(LotDecrement {
                lot_id: lot.id,
                expected_version: lot.version,
                quantity: used,
                new_status: if lot.available_quantity == used {
                    LotStatus::Depleted
                } else {
                    LotStatus::Active
                },
            });
            remaining -= used;
        }

        let consumed = req.quantity - remaining;
        let total_cost_amount: Decimal = used_lots.iter().map(|u| u.total_cost.amount).sum();
        let currency = currency.unwrap_or_else(|| self.settings.default_currency.clone());

        let movement = MovementRecord {
            transaction_id: Uuid::new_v4(),
            material_id: req.material_id,
            store_id: req.store_id,
            movement_type: req.movement_type,
            quantity: consumed,
            requested_quantity: req.quantity,
            total_cost: Money::new(total_cost_amount, &currency),
            reference_id: req.reference_id.clone(),
            lot_details: used_lots.clone(),
            notes: req.notes.clone(),
            occurred_at: Utc::now(),
        };
        let transaction_id = movement.transaction_id;
        let total_cost = movement.total_cost.clone();

        if decrements.is_empty() {
            // Nothing consumable; the call still leaves one auditable record.
            self.store.insert_movement(movement).await?;
        } else {
            self.store.commit_consumption(&decrements, movement).await?;
        }

        let average_unit_cost = if consumed.is_zero() {
            Decimal::ZERO
        } else {
            total_cost_amount / consumed
        };

        Ok(OutboundResult {
            success: remaining.is_zero(),
            transaction_id,
            used_lots,
            consumed_quantity: consumed,
            total_cost,
            average_unit_cost,
            shortage_quantity: remaining,
        })
    }

    fn outbound_result_from_movement(movement: &MovementRecord) -> OutboundResult {
        let consumed = movement.quantity;
        let shortage = movement.requested_quantity - movement.quantity;
        let average_unit_cost = if consumed.is_zero() {
            Decimal::ZERO
        } else {
            movement.total_cost.amount / consumed
        };
        OutboundResult {
            success: shortage.is_zero(),
            transaction_id: movement.transaction_id,
            used_lots: movement.lot_details.clone(),
            consumed_quantity: consumed,
            total_cost: movement.total_cost.clone(),
            average_unit_cost,
            shortage_quantity: shortage,
        }
    }

    /// Receive a new lot and write its purchase movement atomically.
    #[instrument(skip(self), fields(material_id = %req.material_id, store_id = %req.store_id))]
    pub async fn process_inbound(
        &self,
        req: InboundRequest,
    ) -> Result<InboundResult, InventoryError> {
        if req.quantity <= Decimal::ZERO {
            return Err(InventoryError::Validation(
                "inbound quantity must be positive".into(),
            ));
        }
        if req.unit_cost.amount <= Decimal::ZERO {
            return Err(InventoryError::Validation(
                "inbound unit cost must be positive".into(),
            ));
        }
        if req.unit_cost.currency.len() != 3 {
            return Err(InventoryError::Validation(format!(
                "currency {:?} is not a three-letter code",
                req.unit_cost.currency
            )));
        }

        // Replay lookup under the key lock, same as outbound.
        let lock = self.key_lock(req.material_id, req.store_id);
        let _guard = lock.lock().await;

        if let Some(reference) = req.reference_id.as_deref() {
            if let Some(movement) = self
                .store
                .find_movement_by_reference(
                    req.material_id,
                    req.store_id,
                    MovementType::Purchase,
                    reference,
                )
                .await?
            {
                debug!(reference, "replaying recorded inbound movement");
                let detail = movement.lot_details.first().ok_or_else(|| {
                    InventoryError::Validation(format!(
                        "purchase movement {} has no lot detail",
                        movement.transaction_id
                    ))
                })?;
                return Ok(InboundResult {
                    lot_id: detail.lot_id,
                    lot_number: detail.lot_number.clone(),
                    transaction_id: movement.transaction_id,
                });
            }
        }

        // One currency per material+store; checked against live stock.
        let existing = self
            .store
            .load_active_lots(req.material_id, req.store_id)
            .await?;
        if let Some(other) = existing
            .iter()
            .find(|l| l.unit_cost.currency != req.unit_cost.currency)
        {
            return Err(InventoryError::Validation(format!(
                "existing stock is priced in {}, cannot receive {}",
                other.unit_cost.currency, req.unit_cost.currency
            )));
        }

        let received_date = req.received_date.unwrap_or_else(Utc::now);
        let lot_number = req
            .lot_number
            .clone()
            .unwrap_or_else(|| Self::generate_lot_number(received_date));

        let lot = NewLot {
            material_id: req.material_id,
            store_id: req.store_id,
            lot_number: lot_number.clone(),
            received_date,
            expiry_date: req.expiry_date,
            received_quantity: req.quantity,
            available_quantity: req.quantity,
            unit_cost: req.unit_cost.clone(),
            supplier_info: req.supplier_info.clone(),
            status: LotStatus::Active,
        };

        let total_cost = Money::new(req.quantity * req.unit_cost.amount, &req.unit_cost.currency);
        let movement = MovementRecord {
            transaction_id: Uuid::new_v4(),
            material_id: req.material_id,
            store_id: req.store_id,
            movement_type: MovementType::Purchase,
            quantity: req.quantity,
            requested_quantity: req.quantity,
            total_cost: total_cost.clone(),
            reference_id: req.reference_id.clone(),
            // lot_id is patched by the store once the id is assigned
            lot_details: vec![UsedLot {
                lot_id: 0,
                lot_number: lot_number.clone(),
                quantity: req.quantity,
                unit_cost: req.unit_cost.clone(),
                total_cost,
                received_date,
            }],
            notes: req.notes.clone(),
            occurred_at: Utc::now(),
        };
        let transaction_id = movement.transaction_id;

        let inserted = self.store.insert_lot_with_movement(lot, movement).await?;
        Ok(InboundResult {
            lot_id: inserted.id,
            lot_number: inserted.lot_number,
            transaction_id,
        })
    }

    fn generate_lot_number(received: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("LOT-{}-{}", received.format("%Y%m%d%H%M%S"), &suffix[..8])
    }

    /// Apply a signed manual correction to one lot.
    ///
    /// An adjustment that would drive the available quantity negative is
    /// rejected, never clamped. The audit entry lands in the adjustment
    /// trail, not the movement ledger.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        req: AdjustStockRequest,
    ) -> Result<AdjustmentResult, InventoryError> {
        if req.adjustment_quantity.is_zero() {
            return Err(InventoryError::Validation(
                "adjustment quantity must be non-zero".into(),
            ));
        }
        if req.approved_by.trim().is_empty() {
            return Err(InventoryError::Validation(
                "adjustments require an approver".into(),
            ));
        }

        let lot = self
            .store
            .get_lot(req.lot_id)
            .await?
            .ok_or(InventoryError::LotNotFound(req.lot_id))?;
        let lock = self.key_lock(lot.material_id, lot.store_id);
        let _guard = lock.lock().await;

        let mut attempt = 0;
        loop {
            let lot = self
                .store
                .get_lot(req.lot_id)
                .await?
                .ok_or(InventoryError::LotNotFound(req.lot_id))?;

            if matches!(lot.status, LotStatus::Expired | LotStatus::Quarantined) {
                return Err(InventoryError::Validation(format!(
                    "lot {} is {} and cannot be adjusted",
                    lot.id, lot.status
                )));
            }

            let new_quantity = lot.available_quantity + req.adjustment_quantity;
            if new_quantity < Decimal::ZERO {
                return Err(InventoryError::InvalidAdjustment {
                    lot_id: lot.id,
                    available: lot.available_quantity,
                    delta: req.adjustment_quantity,
                });
            }
            let new_status = if new_quantity.is_zero() {
                LotStatus::Depleted
            } else {
                LotStatus::Active
            };

            let update = LotQuantityUpdate {
                lot_id: lot.id,
                expected_version: lot.version,
                new_quantity,
                new_status,
            };
            let audit = AdjustmentRecord {
                id: Uuid::new_v4(),
                lot_id: lot.id,
                material_id: lot.material_id,
                store_id: lot.store_id,
                previous_quantity: lot.available_quantity,
                new_quantity,
                delta: req.adjustment_quantity,
                reason: req.reason.clone(),
                notes: req.notes.clone(),
                approved_by: req.approved_by.clone(),
                occurred_at: Utc::now(),
            };

            match self.store.apply_adjustment(update, audit).await {
                Err(err) if err.is_retryable() && attempt < self.settings.max_conflict_retries => {
                    attempt += 1;
                    warn!(lot_id = lot.id, attempt, "adjustment lost a race, retrying");
                }
                Err(err) => return Err(err),
                Ok(()) => {
                    return Ok(AdjustmentResult {
                        lot_id: lot.id,
                        previous_quantity: lot.available_quantity,
                        new_quantity,
                        status: new_status,
                    })
                }
            }
        }
    }

    /// Explicit status transition, driven by the expiry sweep or a quality
    /// hold. Legal moves: Active→Expired, Active→Quarantined,
    /// Quarantined→Active. Depletion is never entered this way.
    #[instrument(skip(self, reason))]
    pub async fn transition_lot_status(
        &self,
        lot_id: i64,
        new_status: LotStatus,
        reason: &str,
        actor: &str,
    ) -> Result<InventoryLot, InventoryError> {
        let lot = self
            .store
            .get_lot(lot_id)
            .await?
            .ok_or(InventoryError::LotNotFound(lot_id))?;
        let lock = self.key_lock(lot.material_id, lot.store_id);
        let _guard = lock.lock().await;

        let mut attempt = 0;
        loop {
            let lot = self
                .store
                .get_lot(lot_id)
                .await?
                .ok_or(InventoryError::LotNotFound(lot_id))?;

            let allowed = matches!(
                (lot.status, new_status),
                (LotStatus::Active, LotStatus::Expired)
                    | (LotStatus::Active, LotStatus::Quarantined)
                    | (LotStatus::Quarantined, LotStatus::Active)
            );
            if !allowed {
                return Err(InventoryError::Validation(format!(
                    "lot {} cannot move from {} to {}",
                    lot.id, lot.status, new_status
                )));
            }

            let update = LotStatusUpdate {
                lot_id: lot.id,
                expected_version: lot.version,
                new_status,
            };
            let audit = AdjustmentRecord {
                id: Uuid::new_v4(),
                lot_id: lot.id,
                material_id: lot.material_id,
                store_id: lot.store_id,
                previous_quantity: lot.available_quantity,
                new_quantity: lot.available_quantity,
                delta: Decimal::ZERO,
                reason: reason.to_string(),
                notes: None,
                approved_by: actor.to_string(),
                occurred_at: Utc::now(),
            };

            match self.store.update_lot_status(update, audit).await {
                Err(err) if err.is_retryable() && attempt < self.settings.max_conflict_retries => {
                    attempt += 1;
                    warn!(lot_id, attempt, "status transition lost a race, retrying");
                }
                Err(err) => return Err(err),
                Ok(()) => {
                    return self
                        .store
                        .get_lot(lot_id)
                        .await?
                        .ok_or(InventoryError::LotNotFound(lot_id));
                }
            }
        }
    }

    /// Aggregate the Active stock of one material at one store.
    ///
    /// Uses the same ordering as consumption, so `oldest_lot` is exactly
    /// what the next outbound would draw from first.
    pub async fn get_stock_summary(
        &self,
        material_id: Uuid,
        store_id: Uuid,
    ) -> Result<StockSummary, InventoryError> {
        let lots = self.store.load_active_lots(material_id, store_id).await?;

        let mut currency: Option<String> = None;
        for lot in &lots {
            match &currency {
                None => currency = Some(lot.unit_cost.currency.clone()),
                Some(c) if *c != lot.unit_cost.currency => {
                    return Err(InventoryError::Validation(format!(
                        "lots for this material mix currencies ({} and {})",
                        c, lot.unit_cost.currency
                    )));
                }
                Some(_) => {}
            }
        }

        let total_quantity: Decimal = lots.iter().map(|l| l.available_quantity).sum();
        let total_value: Decimal = lots
            .iter()
            .map(|l| l.available_quantity * l.unit_cost.amount)
            .sum();
        let average_unit_cost = if total_quantity.is_zero() {
            Decimal::ZERO
        } else {
            total_value / total_quantity
        };

        Ok(StockSummary {
            material_id,
            store_id,
            total_quantity,
            total_value,
            average_unit_cost,
            currency,
            lot_count: lots.len(),
            oldest_lot: lots.into_iter().next(),
        })
    }

    /// Scan one store for lots at or past their expiry window. Pure read;
    /// the Active→Expired transition belongs to the sweep that consumes
    /// this output.
    pub async fn get_expiring_lots(
        &self,
        store_id: Uuid,
        days_ahead: i64,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ExpiringLot>, InventoryError> {
        if days_ahead < 0 {
            return Err(InventoryError::Validation(
                "days_ahead must not be negative".into(),
            ));
        }
        let as_of_date = as_of.date_naive();
        let cutoff = as_of_date + Duration::days(days_ahead);
        let lots = self.store.load_expiring_lots(store_id, cutoff).await?;

        Ok(lots
            .into_iter()
            .filter_map(|lot| {
                let expiry = lot.expiry_date?;
                let days_until_expiry = days_between(as_of_date, expiry);
                let (alert_level, suggested_action) = classify_expiry(days_until_expiry);
                Some(ExpiringLot {
                    lot,
                    days_until_expiry,
                    alert_level,
                    suggested_action,
                })
            })
            .collect())
    }
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

fn classify_expiry(days_until_expiry: i64) -> (ExpiryAlertLevel, SuggestedAction) {
    if days_until_expiry < 0 {
        (ExpiryAlertLevel::Expired, SuggestedAction::Dispose)
    } else if days_until_expiry <= 3 {
        (ExpiryAlertLevel::Critical, SuggestedAction::Discount)
    } else {
        (ExpiryAlertLevel::Warning, SuggestedAction::UseFirst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryInventoryStore;
    use rust_decimal_macros::dec;

    fn engine() -> (Arc<InMemoryInventoryStore>, FifoEngine) {
        let store = Arc::new(InMemoryInventoryStore::new());
        let engine = FifoEngine::new(store.clone());
        (store, engine)
    }

    fn inbound(material: Uuid, store: Uuid, qty: Decimal, cost: Decimal) -> InboundRequest {
        InboundRequest {
            material_id: material,
            store_id: store,
            quantity: qty,
            unit_cost: Money::new(cost, "USD"),
            lot_number: None,
            expiry_date: None,
            supplier_info: None,
            received_date: None,
            reference_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn zero_quantity_outbound_writes_audit_movement() {
        let (store, engine) = engine();
        let (m, s) = (Uuid::new_v4(), Uuid::new_v4());

        let result = engine
            .process_outbound(OutboundRequest {
                material_id: m,
                store_id: s,
                quantity: Decimal::ZERO,
                movement_type: MovementType::Usage,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.used_lots.is_empty());
        assert_eq!(result.shortage_quantity, Decimal::ZERO);
        assert!(result.total_cost.is_zero());

        let movements = store.movements().await;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, Decimal::ZERO);
        assert!(movements[0].lot_details.is_empty());
    }

    #[tokio::test]
    async fn no_lot_movement_carries_the_stock_currency() {
        let (store, engine) = engine();
        let (m, s) = (Uuid::new_v4(), Uuid::new_v4());

        let mut eur = inbound(m, s, dec!(10), dec!(3));
        eur.unit_cost = Money::new(dec!(3), "EUR");
        engine.process_inbound(eur).await.unwrap();

        let result = engine
            .process_outbound(OutboundRequest {
                material_id: m,
                store_id: s,
                quantity: Decimal::ZERO,
                movement_type: MovementType::Usage,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(result.total_cost.currency, "EUR");
        let movements = store.movements().await;
        assert_eq!(movements.last().unwrap().total_cost.currency, "EUR");
    }

    #[tokio::test]
    async fn negative_quantity_is_rejected_before_io() {
        let (store, engine) = engine();
        let err = engine
            .process_outbound(OutboundRequest {
                material_id: Uuid::new_v4(),
                store_id: Uuid::new_v4(),
                quantity: dec!(-1),
                movement_type: MovementType::Usage,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(store.movements().await.is_empty());
    }

    #[tokio::test]
    async fn ties_on_received_date_break_by_insertion_order() {
        let (_, engine) = engine();
        let (m, s) = (Uuid::new_v4(), Uuid::new_v4());
        let same_moment = Utc::now();

        let mut req_a = inbound(m, s, dec!(5), dec!(1));
        req_a.received_date = Some(same_moment);
        req_a.lot_number = Some("FIRST".into());
        let first = engine.process_inbound(req_a).await.unwrap();

        let mut req_b = inbound(m, s, dec!(5), dec!(2));
        req_b.received_date = Some(same_moment);
        req_b.lot_number = Some("SECOND".into());
        engine.process_inbound(req_b).await.unwrap();

        let result = engine
            .process_outbound(OutboundRequest {
                material_id: m,
                store_id: s,
                quantity: dec!(3),
                movement_type: MovementType::Usage,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(result.used_lots.len(), 1);
        assert_eq!(result.used_lots[0].lot_id, first.lot_id);
        assert_eq!(result.used_lots[0].lot_number, "FIRST");
    }

    #[tokio::test]
    async fn depleted_lot_is_skipped_on_next_outbound() {
        let (store, engine) = engine();
        let (m, s) = (Uuid::new_v4(), Uuid::new_v4());

        let first = engine.process_inbound(inbound(m, s, dec!(4), dec!(1))).await.unwrap();
        engine.process_inbound(inbound(m, s, dec!(4), dec!(2))).await.unwrap();

        engine
            .process_outbound(OutboundRequest {
                material_id: m,
                store_id: s,
                quantity: dec!(4),
                movement_type: MovementType::Usage,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap();

        let depleted = store.get_lot(first.lot_id).await.unwrap().unwrap();
        assert_eq!(depleted.status, LotStatus::Depleted);
        assert_eq!(depleted.available_quantity, Decimal::ZERO);

        let next = engine
            .process_outbound(OutboundRequest {
                material_id: m,
                store_id: s,
                quantity: dec!(1),
                movement_type: MovementType::Usage,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap();
        assert!(next.used_lots.iter().all(|u| u.lot_id != first.lot_id));
    }

    #[tokio::test]
    async fn inbound_generates_lot_number_when_missing() {
        let (_, engine) = engine();
        let (m, s) = (Uuid::new_v4(), Uuid::new_v4());
        let result = engine.process_inbound(inbound(m, s, dec!(10), dec!(3))).await.unwrap();
        assert!(result.lot_number.starts_with("LOT-"));
    }

    #[tokio::test]
    async fn mixed_currency_inbound_is_rejected() {
        let (_, engine) = engine();
        let (m, s) = (Uuid::new_v4(), Uuid::new_v4());
        engine.process_inbound(inbound(m, s, dec!(10), dec!(3))).await.unwrap();

        let mut eur = inbound(m, s, dec!(5), dec!(3));
        eur.unit_cost = Money::new(dec!(3), "EUR");
        let err = engine.process_inbound(eur).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
    }

    #[tokio::test]
    async fn status_transition_rejects_illegal_moves() {
        let (_, engine) = engine();
        let (m, s) = (Uuid::new_v4(), Uuid::new_v4());
        let lot = engine.process_inbound(inbound(m, s, dec!(10), dec!(3))).await.unwrap();

        let quarantined = engine
            .transition_lot_status(lot.lot_id, LotStatus::Quarantined, "quality hold", "qa")
            .await
            .unwrap();
        assert_eq!(quarantined.status, LotStatus::Quarantined);

        // Quarantined lots cannot expire; they must be cleared first.
        let err = engine
            .transition_lot_status(lot.lot_id, LotStatus::Expired, "sweep", "cron")
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));

        let released = engine
            .transition_lot_status(lot.lot_id, LotStatus::Active, "clearance", "qa")
            .await
            .unwrap();
        assert_eq!(released.status, LotStatus::Active);
    }

    #[test]
    fn expiry_classification_bands() {
        assert_eq!(
            classify_expiry(-1),
            (ExpiryAlertLevel::Expired, SuggestedAction::Dispose)
        );
        assert_eq!(
            classify_expiry(0),
            (ExpiryAlertLevel::Critical, SuggestedAction::Discount)
        );
        assert_eq!(
            classify_expiry(3),
            (ExpiryAlertLevel::Critical, SuggestedAction::Discount)
        );
        assert_eq!(
            classify_expiry(4),
            (ExpiryAlertLevel::Warning, SuggestedAction::UseFirst)
        );
    }
}
