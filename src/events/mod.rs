//! Advisory events emitted after inventory operations.
//!
//! Events feed alerting and dashboard consumers. They are best-effort by
//! contract: a failed send is logged and never blocks or fails the core
//! lot/ledger mutation that triggered it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::LotStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockReceived {
        material_id: Uuid,
        store_id: Uuid,
        lot_id: i64,
        quantity: Decimal,
        transaction_id: Uuid,
    },
    StockConsumed {
        material_id: Uuid,
        store_id: Uuid,
        quantity: Decimal,
        total_cost: Decimal,
        transaction_id: Uuid,
    },
    StockShortage {
        material_id: Uuid,
        store_id: Uuid,
        requested: Decimal,
        shortage: Decimal,
    },
    StockAdjusted {
        lot_id: i64,
        previous_quantity: Decimal,
        new_quantity: Decimal,
        reason: String,
    },
    LotStatusChanged {
        lot_id: i64,
        new_status: LotStatus,
        reason: String,
    },
    ExpiringLotsFound {
        store_id: Uuid,
        total: usize,
        critical: usize,
        as_of: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Downstream consumers
/// (alerting, dashboards) subscribe here in the full platform.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::StockShortage {
                material_id,
                shortage,
                ..
            } => {
                warn!(%material_id, %shortage, "stock shortage");
            }
            other => {
                info!(event = ?other, "inventory event");
            }
        }
    }
}

/// Convenience for wiring a sender plus a spawned consumer, used by tests
/// and embedders that do not bring their own event plumbing.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}
