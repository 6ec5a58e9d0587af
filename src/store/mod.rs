//! Persistence port for the FIFO engine.
//!
//! The engine never talks to a database client directly; it works against
//! the narrow, strongly-typed [`InventoryStore`] trait. Each method that
//! writes commits its whole write-set as one atomic unit, and every lot
//! mutation is a compare-and-swap against the lot's version. Two adapters
//! are provided: [`sea_orm_store::SeaOrmInventoryStore`] for Postgres/SQLite
//! and [`memory::InMemoryInventoryStore`] for tests and fixtures.

pub mod memory;
pub mod sea_orm_store;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::InventoryError;
use crate::models::{
    AdjustmentRecord, InventoryLot, LotStatus, MovementRecord, MovementType, NewLot,
};

/// One planned decrement against a lot, guarded by the version observed when
/// the consumption plan was built.
#[derive(Debug, Clone)]
pub struct LotDecrement {
    pub lot_id: i64,
    pub expected_version: i32,
    /// Amount to subtract from `available_quantity`.
    pub quantity: Decimal,
    /// Status after the decrement: Depleted when it reaches zero.
    pub new_status: LotStatus,
}

/// Absolute quantity rewrite used by manual adjustments.
#[derive(Debug, Clone)]
pub struct LotQuantityUpdate {
    pub lot_id: i64,
    pub expected_version: i32,
    pub new_quantity: Decimal,
    pub new_status: LotStatus,
}

/// Pure status transition (expiry sweep, quarantine, clearance).
#[derive(Debug, Clone)]
pub struct LotStatusUpdate {
    pub lot_id: i64,
    pub expected_version: i32,
    pub new_status: LotStatus,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Active lots with available quantity > 0 for one material+store,
    /// ordered ascending by `(received_date, id)`. This ordering is the
    /// FIFO contract; ties on received date break by insertion sequence.
    async fn load_active_lots(
        &self,
        material_id: Uuid,
        store_id: Uuid,
    ) -> Result<Vec<InventoryLot>, InventoryError>;

    async fn get_lot(&self, lot_id: i64) -> Result<Option<InventoryLot>, InventoryError>;

    /// Insert a new lot and its purchase movement atomically.
    ///
    /// `movement.lot_details` must hold exactly one entry; the store patches
    /// its `lot_id` to the newly assigned id before persisting.
    async fn insert_lot_with_movement(
        &self,
        lot: NewLot,
        movement: MovementRecord,
    ) -> Result<InventoryLot, InventoryError>;

    /// Apply every decrement and append the movement as one unit. Any
    /// version mismatch fails the whole batch with `ConcurrencyConflict`
    /// and leaves no partial mutation visible.
    async fn commit_consumption(
        &self,
        decrements: &[LotDecrement],
        movement: MovementRecord,
    ) -> Result<(), InventoryError>;

    /// Rewrite a lot's available quantity and append the audit entry
    /// atomically.
    async fn apply_adjustment(
        &self,
        update: LotQuantityUpdate,
        audit: AdjustmentRecord,
    ) -> Result<(), InventoryError>;

    /// Transition a lot's status and append the (zero-delta) audit entry
    /// atomically.
    async fn update_lot_status(
        &self,
        update: LotStatusUpdate,
        audit: AdjustmentRecord,
    ) -> Result<(), InventoryError>;

    /// Append a movement that touches no lot (zero-quantity audit no-op).
    async fn insert_movement(&self, movement: MovementRecord) -> Result<(), InventoryError>;

    /// Idempotency lookup keyed on `(material, store, movement type,
    /// caller reference)`.
    async fn find_movement_by_reference(
        &self,
        material_id: Uuid,
        store_id: Uuid,
        movement_type: MovementType,
        reference_id: &str,
    ) -> Result<Option<MovementRecord>, InventoryError>;

    /// Active lots with available quantity > 0 at one store whose expiry
    /// date is on or before `cutoff`, ordered by expiry date ascending.
    async fn load_expiring_lots(
        &self,
        store_id: Uuid,
        cutoff: NaiveDate,
    ) -> Result<Vec<InventoryLot>, InventoryError>;
}
