//! In-memory adapter for the persistence port.
//!
//! Backs unit and integration tests, and serves as a fixture for consumers
//! that embed the engine without a database. A single async mutex guards
//! the whole state, so every port method is trivially atomic; version
//! checks still run so conflict handling is exercised the same way as
//! against SQL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::InventoryError;
use crate::models::{
    AdjustmentRecord, InventoryLot, LotStatus, MovementRecord, MovementType, NewLot,
};
use crate::store::{InventoryStore, LotDecrement, LotQuantityUpdate, LotStatusUpdate};

#[derive(Default)]
struct Inner {
    lots: BTreeMap<i64, InventoryLot>,
    movements: Vec<MovementRecord>,
    adjustments: Vec<AdjustmentRecord>,
    next_lot_id: i64,
}

#[derive(Default)]
pub struct InMemoryInventoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the full movement ledger, oldest first. Test helper.
    pub async fn movements(&self) -> Vec<MovementRecord> {
        self.inner.lock().await.movements.clone()
    }

    /// Snapshot of the adjustment audit trail, oldest first. Test helper.
    pub async fn adjustments(&self) -> Vec<AdjustmentRecord> {
        self.inner.lock().await.adjustments.clone()
    }

    fn check_version(inner: &Inner, lot_id: i64, expected: i32) -> Result<(), InventoryError> {
        match inner.lots.get(&lot_id) {
            None => Err(InventoryError::LotNotFound(lot_id)),
            Some(lot) if lot.version != expected => Err(InventoryError::ConcurrencyConflict(
                format!("lot {} version {} != expected {}", lot_id, lot.version, expected),
            )),
            Some(_) => Ok(()),
        }
    }

    // Mirrors the unique index on (material, store, type, reference) that
    // backs the idempotency lookup in the SQL schema.
    fn check_reference_unique(
        inner: &Inner,
        movement: &MovementRecord,
    ) -> Result<(), InventoryError> {
        if let Some(reference) = movement.reference_id.as_deref() {
            let duplicate = inner.movements.iter().any(|m| {
                m.material_id == movement.material_id
                    && m.store_id == movement.store_id
                    && m.movement_type == movement.movement_type
                    && m.reference_id.as_deref() == Some(reference)
            });
            if duplicate {
                return Err(InventoryError::Validation(format!(
                    "movement with reference {} already recorded for this material and store",
                    reference
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn load_active_lots(
        &self,
        material_id: Uuid,
        store_id: Uuid,
    ) -> Result<Vec<InventoryLot>, InventoryError> {
        let inner = self.inner.lock().await;
        let mut lots: Vec<InventoryLot> = inner
            .lots
            .values()
            .filter(|l| {
                l.material_id == material_id && l.store_id == store_id && l.is_consumable()
            })
            .cloned()
            .collect();
        lots.sort_by(|a, b| {
            a.received_date
                .cmp(&b.received_date)
                .then(a.id.cmp(&b.id))
        });
        Ok(lots)
    }

    async fn get_lot(&self, lot_id: i64) -> Result<Option<InventoryLot>, InventoryError> {
        Ok(self.inner.lock().await.lots.get(&lot_id).cloned())
    }

    async fn insert_lot_with_movement(
        &self,
        lot: NewLot,
        mut movement: MovementRecord,
    ) -> Result<InventoryLot, InventoryError> {
        let mut inner = self.inner.lock().await;

        let duplicate = inner.lots.values().any(|l| {
            l.material_id == lot.material_id
                && l.store_id == lot.store_id
                && l.lot_number == lot.lot_number
        });
        if duplicate {
            return Err(InventoryError::Validation(format!(
                "lot number {} already exists for this material and store",
                lot.lot_number
            )));
        }
        Self::check_reference_unique(&inner, &movement)?;

        inner.next_lot_id += 1;
        let id = inner.next_lot_id;
        let now = Utc::now();
        let stored = InventoryLot {
            id,
            material_id: lot.material_id,
            store_id: lot.store_id,
            lot_number: lot.lot_number,
            received_date: lot.received_date,
            expiry_date: lot.expiry_date,
            received_quantity: lot.received_quantity,
            available_quantity: lot.available_quantity,
            unit_cost: lot.unit_cost,
            supplier_info: lot.supplier_info,
            status: lot.status,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        for detail in &mut movement.lot_details {
            detail.lot_id = id;
        }
        inner.lots.insert(id, stored.clone());
        inner.movements.push(movement);
        Ok(stored)
    }

    async fn commit_consumption(
        &self,
        decrements: &[LotDecrement],
        movement: MovementRecord,
    ) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().await;

        // Validate the whole batch before mutating anything.
        Self::check_reference_unique(&inner, &movement)?;
        for dec in decrements {
            Self::check_version(&inner, dec.lot_id, dec.expected_version)?;
        }

        for dec in decrements {
            let lot = inner
                .lots
                .get_mut(&dec.lot_id)
                .ok_or(InventoryError::LotNotFound(dec.lot_id))?;
            lot.available_quantity -= dec.quantity;
            lot.status = dec.new_status;
            lot.version += 1;
            lot.updated_at = Utc::now();
        }
        inner.movements.push(movement);
        Ok(())
    }

    async fn apply_adjustment(
        &self,
        update: LotQuantityUpdate,
        audit: AdjustmentRecord,
    ) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().await;
        Self::check_version(&inner, update.lot_id, update.expected_version)?;

        let lot = inner
            .lots
            .get_mut(&update.lot_id)
            .ok_or(InventoryError::LotNotFound(update.lot_id))?;
        lot.available_quantity = update.new_quantity;
        lot.status = update.new_status;
        lot.version += 1;
        lot.updated_at = Utc::now();
        inner.adjustments.push(audit);
        Ok(())
    }

    async fn update_lot_status(
        &self,
        update: LotStatusUpdate,
        audit: AdjustmentRecord,
    ) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().await;
        Self::check_version(&inner, update.lot_id, update.expected_version)?;

        let lot = inner
            .lots
            .get_mut(&update.lot_id)
            .ok_or(InventoryError::LotNotFound(update.lot_id))?;
        lot.status = update.new_status;
        lot.version += 1;
        lot.updated_at = Utc::now();
        inner.adjustments.push(audit);
        Ok(())
    }

    async fn insert_movement(&self, movement: MovementRecord) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().await;
        Self::check_reference_unique(&inner, &movement)?;
        inner.movements.push(movement);
        Ok(())
    }

    async fn find_movement_by_reference(
        &self,
        material_id: Uuid,
        store_id: Uuid,
        movement_type: MovementType,
        reference_id: &str,
    ) -> Result<Option<MovementRecord>, InventoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .movements
            .iter()
            .find(|m| {
                m.material_id == material_id
                    && m.store_id == store_id
                    && m.movement_type == movement_type
                    && m.reference_id.as_deref() == Some(reference_id)
            })
            .cloned())
    }

    async fn load_expiring_lots(
        &self,
        store_id: Uuid,
        cutoff: NaiveDate,
    ) -> Result<Vec<InventoryLot>, InventoryError> {
        let inner = self.inner.lock().await;
        let mut lots: Vec<InventoryLot> = inner
            .lots
            .values()
            .filter(|l| {
                l.store_id == store_id
                    && l.status == LotStatus::Active
                    && l.available_quantity > Decimal::ZERO
                    && l.expiry_date.map(|d| d <= cutoff).unwrap_or(false)
            })
            .cloned()
            .collect();
        lots.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then(a.id.cmp(&b.id)));
        Ok(lots)
    }
}
