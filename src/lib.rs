//! FIFO lot-based inventory costing engine for restaurant-chain operations.
//!
//! Tracks discrete receipt lots of raw materials, consumes them strictly
//! oldest-first on outbound events, and produces an auditable, cost-accurate
//! movement ledger that downstream profitability and alerting systems read.
//!
//! The crate is layered bottom-up:
//! - [`store`] — the persistence port and its SeaORM / in-memory adapters;
//! - [`engine`] — the FIFO consumption algorithms, atomicity, and
//!   per-key concurrency control;
//! - [`services`] — command validation, strict stock pre-checks, and
//!   advisory event emission.
//!
//! ```no_run
//! use std::sync::Arc;
//! use chainops_inventory::engine::FifoEngine;
//! use chainops_inventory::services::InventoryService;
//! use chainops_inventory::store::memory::InMemoryInventoryStore;
//!
//! let store = Arc::new(InMemoryInventoryStore::new());
//! let engine = Arc::new(FifoEngine::new(store));
//! let (events, _rx) = chainops_inventory::events::channel(64);
//! let service = InventoryService::new(engine, events);
//! ```

pub mod config;
pub mod db;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod events;
pub mod models;
pub mod services;
pub mod store;

pub use config::AppConfig;
pub use engine::{EngineSettings, FifoEngine};
pub use errors::InventoryError;
pub use models::{
    AdjustStockRequest, AdjustmentRecord, AdjustmentResult, ExpiringLot, ExpiryAlertLevel,
    InboundRequest, InboundResult, InventoryLot, LotStatus, Money, MovementRecord, MovementType,
    OutboundRequest, OutboundResult, StockSummary, SuggestedAction, UsedLot,
};
pub use services::InventoryService;
