use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Error taxonomy for the inventory costing engine.
///
/// `Validation` failures are rejected before any lot is touched. `NoStock`
/// and `InsufficientStock` are raised by the strict pre-check in
/// `InventoryService`; the engine itself reports shortage as a partial
/// result, not an error. `ConcurrencyConflict` surfaces only after the
/// configured retry budget is exhausted.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum InventoryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No stock exists for material {material_id} at store {store_id}")]
    NoStock { material_id: Uuid, store_id: Uuid },

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Adjustment would drive lot {lot_id} negative: available {available}, delta {delta}")]
    InvalidAdjustment {
        lot_id: i64,
        available: Decimal,
        delta: Decimal,
    },

    #[error("Lot {0} not found")]
    LotNotFound(i64),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Database error: {0}")]
    Database(
        #[from]
        #[serde(skip)]
        sea_orm::DbErr,
    ),

    #[error("Event error: {0}")]
    Event(String),
}

impl InventoryError {
    /// Whether a caller may safely retry the operation with a fresh snapshot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::ConcurrencyConflict(_))
    }
}
