//! Thin orchestrator over the FIFO engine: command validation, strict
//! stock pre-checks, and advisory event emission.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::engine::FifoEngine;
use crate::errors::InventoryError;
use crate::events::{Event, EventSender};
use crate::models::{
    AdjustStockRequest, AdjustmentResult, ExpiringLot, ExpiryAlertLevel, InboundRequest,
    InboundResult, InventoryLot, LotStatus, Money, MovementType, OutboundRequest, OutboundResult,
    StockSummary,
};

/// Receipt of new stock from purchasing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReceiveStockCommand {
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    #[validate(length(min = 3, max = 3))]
    pub currency: String,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub supplier_info: Option<String>,
    pub received_date: Option<DateTime<Utc>>,
    pub reference_id: Option<String>,
}

/// Consumption of stock by sales/kitchen usage/waste.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConsumeStockCommand {
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub quantity: Decimal,
    pub reason: MovementType,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    /// Best-effort callers accept a partial fulfillment instead of the
    /// strict `NoStock`/`InsufficientStock` pre-check.
    #[serde(default)]
    pub allow_partial: bool,
}

/// Manual correction against one lot, requiring an approver.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustStockCommand {
    pub lot_id: i64,
    pub adjustment_quantity: Decimal,
    #[validate(length(min = 1))]
    pub reason: String,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub approved_by: String,
}

#[derive(Clone)]
pub struct InventoryService {
    engine: Arc<FifoEngine>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(engine: Arc<FifoEngine>, event_sender: EventSender) -> Self {
        Self {
            engine,
            event_sender,
        }
    }

    /// Advisory emission: log and continue on failure, never block the
    /// core mutation that already committed.
    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "event emission failed");
        }
    }

    #[instrument(skip(self, command), fields(material_id = %command.material_id, store_id = %command.store_id))]
    pub async fn receive_stock(
        &self,
        command: ReceiveStockCommand,
    ) -> Result<InboundResult, InventoryError> {
        command
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        let request = InboundRequest {
            material_id: command.material_id,
            store_id: command.store_id,
            quantity: command.quantity,
            unit_cost: Money::new(command.unit_cost, command.currency.clone()),
            lot_number: command.lot_number.clone(),
            expiry_date: command.expiry_date,
            supplier_info: command.supplier_info.clone(),
            received_date: command.received_date,
            reference_id: command.reference_id.clone(),
            notes: None,
        };
        let result = self.engine.process_inbound(request).await?;

        self.emit(Event::StockReceived {
            material_id: command.material_id,
            store_id: command.store_id,
            lot_id: result.lot_id,
            quantity: command.quantity,
            transaction_id: result.transaction_id,
        })
        .await;
        Ok(result)
    }

    /// Consume stock FIFO.
    ///
    /// Strict by default: distinguishes "no lots exist at all" (`NoStock`)
    /// from "lots exist but cannot cover the request"
    /// (`InsufficientStock`). With `allow_partial` the engine's shortage
    /// result flows through instead.
    #[instrument(skip(self, command), fields(material_id = %command.material_id, store_id = %command.store_id))]
    pub async fn consume_stock(
        &self,
        command: ConsumeStockCommand,
    ) -> Result<OutboundResult, InventoryError> {
        command
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        if !command.allow_partial && command.quantity > Decimal::ZERO {
            let summary = self
                .engine
                .get_stock_summary(command.material_id, command.store_id)
                .await?;
            if summary.lot_count == 0 {
                return Err(InventoryError::NoStock {
                    material_id: command.material_id,
                    store_id: command.store_id,
                });
            }
            if summary.total_quantity < command.quantity {
                return Err(InventoryError::InsufficientStock {
                    requested: command.quantity,
                    available: summary.total_quantity,
                });
            }
        }

        let result = self
            .engine
            .process_outbound(OutboundRequest {
                material_id: command.material_id,
                store_id: command.store_id,
                quantity: command.quantity,
                movement_type: command.reason,
                reference_id: command.reference_id.clone(),
                notes: command.notes.clone(),
            })
            .await?;

        self.emit(Event::StockConsumed {
            material_id: command.material_id,
            store_id: command.store_id,
            quantity: result.consumed_quantity,
            total_cost: result.total_cost.amount,
            transaction_id: result.transaction_id,
        })
        .await;
        if result.shortage_quantity > Decimal::ZERO {
            self.emit(Event::StockShortage {
                material_id: command.material_id,
                store_id: command.store_id,
                requested: command.quantity,
                shortage: result.shortage_quantity,
            })
            .await;
        }
        Ok(result)
    }

    #[instrument(skip(self, command), fields(lot_id = command.lot_id))]
    pub async fn adjust_stock(
        &self,
        command: AdjustStockCommand,
    ) -> Result<AdjustmentResult, InventoryError> {
        command
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        let result = self
            .engine
            .adjust_stock(AdjustStockRequest {
                lot_id: command.lot_id,
                adjustment_quantity: command.adjustment_quantity,
                reason: command.reason.clone(),
                notes: command.notes.clone(),
                approved_by: command.approved_by.clone(),
            })
            .await?;

        self.emit(Event::StockAdjusted {
            lot_id: command.lot_id,
            previous_quantity: result.previous_quantity,
            new_quantity: result.new_quantity,
            reason: command.reason,
        })
        .await;
        Ok(result)
    }

    pub async fn stock_summary(
        &self,
        material_id: Uuid,
        store_id: Uuid,
    ) -> Result<StockSummary, InventoryError> {
        self.engine.get_stock_summary(material_id, store_id).await
    }

    /// Expiry scan plus an advisory alert when anything is in the window.
    #[instrument(skip(self))]
    pub async fn expiring_lots(
        &self,
        store_id: Uuid,
        days_ahead: i64,
    ) -> Result<Vec<ExpiringLot>, InventoryError> {
        let as_of = Utc::now();
        let lots = self
            .engine
            .get_expiring_lots(store_id, days_ahead, as_of)
            .await?;

        if !lots.is_empty() {
            let critical = lots
                .iter()
                .filter(|l| {
                    matches!(
                        l.alert_level,
                        ExpiryAlertLevel::Critical | ExpiryAlertLevel::Expired
                    )
                })
                .count();
            self.emit(Event::ExpiringLotsFound {
                store_id,
                total: lots.len(),
                critical,
                as_of,
            })
            .await;
        }
        Ok(lots)
    }

    /// Quality hold on a lot; it disappears from the FIFO selection until
    /// released.
    pub async fn quarantine_lot(
        &self,
        lot_id: i64,
        reason: &str,
        actor: &str,
    ) -> Result<InventoryLot, InventoryError> {
        let lot = self
            .engine
            .transition_lot_status(lot_id, LotStatus::Quarantined, reason, actor)
            .await?;
        self.emit(Event::LotStatusChanged {
            lot_id,
            new_status: LotStatus::Quarantined,
            reason: reason.to_string(),
        })
        .await;
        Ok(lot)
    }

    /// Clearance after a quality hold.
    pub async fn release_lot(
        &self,
        lot_id: i64,
        reason: &str,
        actor: &str,
    ) -> Result<InventoryLot, InventoryError> {
        let lot = self
            .engine
            .transition_lot_status(lot_id, LotStatus::Active, reason, actor)
            .await?;
        self.emit(Event::LotStatusChanged {
            lot_id,
            new_status: LotStatus::Active,
            reason: reason.to_string(),
        })
        .await;
        Ok(lot)
    }

    /// Called by the scheduled expiry sweep for each lot the scanner
    /// flagged as past its date.
    pub async fn expire_lot(
        &self,
        lot_id: i64,
        actor: &str,
    ) -> Result<InventoryLot, InventoryError> {
        let lot = self
            .engine
            .transition_lot_status(lot_id, LotStatus::Expired, "expiry sweep", actor)
            .await?;
        self.emit(Event::LotStatusChanged {
            lot_id,
            new_status: LotStatus::Expired,
            reason: "expiry sweep".to_string(),
        })
        .await;
        Ok(lot)
    }
}
