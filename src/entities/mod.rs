//! SeaORM entities backing the lot store, the movement ledger, and the
//! adjustment audit trail.

pub mod inventory_lot;
pub mod stock_adjustment;
pub mod stock_movement;
