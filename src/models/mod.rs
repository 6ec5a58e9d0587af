//! Domain value types for the FIFO costing engine.
//!
//! Quantities and costs are `rust_decimal::Decimal`; money always carries an
//! ISO 4217 currency code alongside the amount. Lots are identified by an
//! `i64` primary key that doubles as the insertion sequence used for the
//! FIFO tie-break on equal received dates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// An amount plus its currency. Mixing currencies within one
/// material+store is a validation error, never a silent sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Lifecycle status of a receipt lot.
///
/// Only `Active` lots are eligible for FIFO consumption. `Depleted` is
/// entered when consumption or adjustment drives the available quantity to
/// zero; `Expired` and `Quarantined` are entered through explicit status
/// transitions and never by the consumption path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    Active,
    Depleted,
    Expired,
    Quarantined,
}

/// Kind of stock movement recorded in the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Sale,
    Usage,
    Waste,
    Transfer,
    Adjustment,
}

impl MovementType {
    /// Movement kinds that consume stock through the FIFO path.
    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            MovementType::Sale | MovementType::Usage | MovementType::Waste | MovementType::Transfer
        )
    }
}

/// A discrete receipt batch of a raw material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub id: i64,
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub lot_number: String,
    pub received_date: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
    /// Quantity originally received; immutable once the lot exists.
    pub received_quantity: Decimal,
    pub available_quantity: Decimal,
    pub unit_cost: Money,
    pub supplier_info: Option<String>,
    pub status: LotStatus,
    /// Optimistic-concurrency token; every mutation is a compare-and-swap
    /// against this value.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryLot {
    pub fn is_consumable(&self) -> bool {
        self.status == LotStatus::Active && self.available_quantity > Decimal::ZERO
    }
}

/// Fields of a lot that exist before the store assigns an id and version.
#[derive(Debug, Clone)]
pub struct NewLot {
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub lot_number: String,
    pub received_date: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
    pub received_quantity: Decimal,
    pub available_quantity: Decimal,
    pub unit_cost: Money,
    pub supplier_info: Option<String>,
    pub status: LotStatus,
}

/// A slice consumed from one lot during one operation, with the cost
/// snapshot taken at consumption time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedLot {
    pub lot_id: i64,
    pub lot_number: String,
    pub quantity: Decimal,
    pub unit_cost: Money,
    pub total_cost: Money,
    pub received_date: DateTime<Utc>,
}

/// Immutable ledger entry. Exactly one is written per engine operation.
///
/// `requested_quantity` records what the caller asked for so an idempotent
/// replay can reconstruct the shortage without re-reading lots. The sum of
/// `lot_details` quantities always equals `quantity`; a zero-quantity
/// movement (audit no-op) is the sole case with empty details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub transaction_id: Uuid,
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub requested_quantity: Decimal,
    pub total_cost: Money,
    pub reference_id: Option<String>,
    pub lot_details: Vec<UsedLot>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Audit entry for a manual stock correction or a status transition.
/// Kept in a separate append-only store from the movement ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub id: Uuid,
    pub lot_id: i64,
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub delta: Decimal,
    pub reason: String,
    pub notes: Option<String>,
    pub approved_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate view over the Active lots of one material at one store.
#[derive(Debug, Clone, Serialize)]
pub struct StockSummary {
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
    pub average_unit_cost: Decimal,
    /// None when no stock exists for the key.
    pub currency: Option<String>,
    pub lot_count: usize,
    /// FIFO head; matches what the next outbound would consume first.
    pub oldest_lot: Option<InventoryLot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExpiryAlertLevel {
    Expired,
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SuggestedAction {
    Dispose,
    Discount,
    UseFirst,
}

/// One lot flagged by the expiry scanner.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringLot {
    pub lot: InventoryLot,
    pub days_until_expiry: i64,
    pub alert_level: ExpiryAlertLevel,
    pub suggested_action: SuggestedAction,
}

/// Outbound consumption request handed to the engine.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub quantity: Decimal,
    pub movement_type: MovementType,
    /// Caller idempotency key; a retried call with the same key returns the
    /// originally recorded outcome instead of consuming again.
    pub reference_id: Option<String>,
    pub notes: Option<String>,
}

/// Outcome of one outbound consumption.
///
/// `success` is true only when the full requested quantity was covered; a
/// partial fulfillment is a valid, non-exceptional result.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundResult {
    pub success: bool,
    pub transaction_id: Uuid,
    pub used_lots: Vec<UsedLot>,
    pub consumed_quantity: Decimal,
    pub total_cost: Money,
    pub average_unit_cost: Decimal,
    pub shortage_quantity: Decimal,
}

/// Inbound receipt request handed to the engine.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Money,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub supplier_info: Option<String>,
    pub received_date: Option<DateTime<Utc>>,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboundResult {
    pub lot_id: i64,
    pub lot_number: String,
    pub transaction_id: Uuid,
}

/// Signed manual correction against one lot.
#[derive(Debug, Clone)]
pub struct AdjustStockRequest {
    pub lot_id: i64,
    pub adjustment_quantity: Decimal,
    pub reason: String,
    pub notes: Option<String>,
    pub approved_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentResult {
    pub lot_id: i64,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub status: LotStatus,
}
