//! SeaORM adapter for the persistence port.
//!
//! Every write method wraps its write-set in one database transaction.
//! Lot mutations are conditional `UPDATE ... WHERE id = ? AND version = ?`
//! statements; zero rows affected means another writer won the race and the
//! whole transaction rolls back with a `ConcurrencyConflict`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{inventory_lot, stock_adjustment, stock_movement};
use crate::errors::InventoryError;
use crate::models::{
    AdjustmentRecord, InventoryLot, LotStatus, Money, MovementRecord, MovementType, NewLot,
    UsedLot,
};
use crate::store::{InventoryStore, LotDecrement, LotQuantityUpdate, LotStatusUpdate};

pub struct SeaOrmInventoryStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmInventoryStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn lot_from_model(model: inventory_lot::Model) -> Result<InventoryLot, InventoryError> {
    let status = LotStatus::from_str(&model.status).map_err(|_| {
        InventoryError::Validation(format!(
            "lot {} carries unknown status {:?}",
            model.id, model.status
        ))
    })?;
    Ok(InventoryLot {
        id: model.id,
        material_id: model.material_id,
        store_id: model.store_id,
        lot_number: model.lot_number,
        received_date: model.received_date,
        expiry_date: model.expiry_date,
        received_quantity: model.received_quantity,
        available_quantity: model.available_quantity,
        unit_cost: Money::new(model.unit_cost, model.currency),
        supplier_info: model.supplier_info,
        status,
        version: model.version,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn movement_from_model(model: stock_movement::Model) -> Result<MovementRecord, InventoryError> {
    let movement_type = MovementType::from_str(&model.movement_type).map_err(|_| {
        InventoryError::Validation(format!(
            "movement {} carries unknown type {:?}",
            model.transaction_id, model.movement_type
        ))
    })?;
    let lot_details: Vec<UsedLot> = serde_json::from_value(model.lot_details).map_err(|e| {
        InventoryError::Validation(format!(
            "movement {} carries malformed lot details: {}",
            model.transaction_id, e
        ))
    })?;
    Ok(MovementRecord {
        transaction_id: model.transaction_id,
        material_id: model.material_id,
        store_id: model.store_id,
        movement_type,
        quantity: model.quantity,
        requested_quantity: model.requested_quantity,
        total_cost: Money::new(model.total_cost, model.currency),
        reference_id: model.reference_id,
        lot_details,
        notes: model.notes,
        occurred_at: model.occurred_at,
    })
}

fn movement_to_active(
    movement: &MovementRecord,
) -> Result<stock_movement::ActiveModel, InventoryError> {
    let lot_details = serde_json::to_value(&movement.lot_details)
        .map_err(|e| InventoryError::Validation(format!("lot details serialization: {}", e)))?;
    Ok(stock_movement::ActiveModel {
        transaction_id: Set(movement.transaction_id),
        material_id: Set(movement.material_id),
        store_id: Set(movement.store_id),
        movement_type: Set(movement.movement_type.to_string()),
        quantity: Set(movement.quantity),
        requested_quantity: Set(movement.requested_quantity),
        total_cost: Set(movement.total_cost.amount),
        currency: Set(movement.total_cost.currency.clone()),
        reference_id: Set(movement.reference_id.clone()),
        lot_details: Set(lot_details),
        notes: Set(movement.notes.clone()),
        occurred_at: Set(movement.occurred_at),
    })
}

fn adjustment_to_active(audit: &AdjustmentRecord) -> stock_adjustment::ActiveModel {
    stock_adjustment::ActiveModel {
        id: Set(audit.id),
        lot_id: Set(audit.lot_id),
        material_id: Set(audit.material_id),
        store_id: Set(audit.store_id),
        previous_quantity: Set(audit.previous_quantity),
        new_quantity: Set(audit.new_quantity),
        delta: Set(audit.delta),
        reason: Set(audit.reason.clone()),
        notes: Set(audit.notes.clone()),
        approved_by: Set(audit.approved_by.clone()),
        occurred_at: Set(audit.occurred_at),
    }
}

fn unwrap_txn_err(err: TransactionError<InventoryError>) -> InventoryError {
    match err {
        TransactionError::Connection(db_err) => InventoryError::Database(db_err),
        TransactionError::Transaction(inner) => inner,
    }
}

/// Conditional decrement guarded by the lot version. Zero rows affected
/// means the snapshot went stale.
async fn cas_decrement(
    txn: &DatabaseTransaction,
    dec: &LotDecrement,
) -> Result<(), InventoryError> {
    let result = inventory_lot::Entity::update_many()
        .col_expr(
            inventory_lot::Column::AvailableQuantity,
            Expr::col(inventory_lot::Column::AvailableQuantity).sub(dec.quantity),
        )
        .col_expr(
            inventory_lot::Column::Version,
            Expr::col(inventory_lot::Column::Version).add(1),
        )
        .col_expr(
            inventory_lot::Column::Status,
            Expr::value(dec.new_status.to_string()),
        )
        .col_expr(inventory_lot::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory_lot::Column::Id.eq(dec.lot_id))
        .filter(inventory_lot::Column::Version.eq(dec.expected_version))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(InventoryError::ConcurrencyConflict(format!(
            "lot {} changed since it was read (expected version {})",
            dec.lot_id, dec.expected_version
        )));
    }
    Ok(())
}

#[async_trait]
impl InventoryStore for SeaOrmInventoryStore {
    async fn load_active_lots(
        &self,
        material_id: Uuid,
        store_id: Uuid,
    ) -> Result<Vec<InventoryLot>, InventoryError> {
        let models = inventory_lot::Entity::find()
            .filter(inventory_lot::Column::MaterialId.eq(material_id))
            .filter(inventory_lot::Column::StoreId.eq(store_id))
            .filter(inventory_lot::Column::Status.eq(LotStatus::Active.to_string()))
            .filter(inventory_lot::Column::AvailableQuantity.gt(Decimal::ZERO))
            .order_by_asc(inventory_lot::Column::ReceivedDate)
            .order_by_asc(inventory_lot::Column::Id)
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(lot_from_model).collect()
    }

    async fn get_lot(&self, lot_id: i64) -> Result<Option<InventoryLot>, InventoryError> {
        let model = inventory_lot::Entity::find_by_id(lot_id)
            .one(self.db.as_ref())
            .await?;
        model.map(lot_from_model).transpose()
    }

    async fn insert_lot_with_movement(
        &self,
        lot: NewLot,
        movement: MovementRecord,
    ) -> Result<InventoryLot, InventoryError> {
        self.db
            .transaction::<_, InventoryLot, InventoryError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let active = inventory_lot::ActiveModel {
                        material_id: Set(lot.material_id),
                        store_id: Set(lot.store_id),
                        lot_number: Set(lot.lot_number.clone()),
                        received_date: Set(lot.received_date),
                        expiry_date: Set(lot.expiry_date),
                        received_quantity: Set(lot.received_quantity),
                        available_quantity: Set(lot.available_quantity),
                        unit_cost: Set(lot.unit_cost.amount),
                        currency: Set(lot.unit_cost.currency.clone()),
                        supplier_info: Set(lot.supplier_info.clone()),
                        status: Set(lot.status.to_string()),
                        version: Set(0),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    let inserted = active.insert(txn).await?;

                    let mut movement = movement;
                    for detail in &mut movement.lot_details {
                        detail.lot_id = inserted.id;
                    }
                    movement_to_active(&movement)?.insert(txn).await?;

                    lot_from_model(inserted)
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn commit_consumption(
        &self,
        decrements: &[LotDecrement],
        movement: MovementRecord,
    ) -> Result<(), InventoryError> {
        let decrements = decrements.to_vec();
        self.db
            .transaction::<_, (), InventoryError>(move |txn| {
                Box::pin(async move {
                    for dec in &decrements {
                        cas_decrement(txn, dec).await?;
                    }
                    movement_to_active(&movement)?.insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn apply_adjustment(
        &self,
        update: LotQuantityUpdate,
        audit: AdjustmentRecord,
    ) -> Result<(), InventoryError> {
        self.db
            .transaction::<_, (), InventoryError>(move |txn| {
                Box::pin(async move {
                    let result = inventory_lot::Entity::update_many()
                        .col_expr(
                            inventory_lot::Column::AvailableQuantity,
                            Expr::value(update.new_quantity),
                        )
                        .col_expr(
                            inventory_lot::Column::Version,
                            Expr::col(inventory_lot::Column::Version).add(1),
                        )
                        .col_expr(
                            inventory_lot::Column::Status,
                            Expr::value(update.new_status.to_string()),
                        )
                        .col_expr(inventory_lot::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(inventory_lot::Column::Id.eq(update.lot_id))
                        .filter(inventory_lot::Column::Version.eq(update.expected_version))
                        .exec(txn)
                        .await?;
                    if result.rows_affected == 0 {
                        return Err(InventoryError::ConcurrencyConflict(format!(
                            "lot {} changed since it was read (expected version {})",
                            update.lot_id, update.expected_version
                        )));
                    }
                    adjustment_to_active(&audit).insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn update_lot_status(
        &self,
        update: LotStatusUpdate,
        audit: AdjustmentRecord,
    ) -> Result<(), InventoryError> {
        self.db
            .transaction::<_, (), InventoryError>(move |txn| {
                Box::pin(async move {
                    let result = inventory_lot::Entity::update_many()
                        .col_expr(
                            inventory_lot::Column::Status,
                            Expr::value(update.new_status.to_string()),
                        )
                        .col_expr(
                            inventory_lot::Column::Version,
                            Expr::col(inventory_lot::Column::Version).add(1),
                        )
                        .col_expr(inventory_lot::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(inventory_lot::Column::Id.eq(update.lot_id))
                        .filter(inventory_lot::Column::Version.eq(update.expected_version))
                        .exec(txn)
                        .await?;
                    if result.rows_affected == 0 {
                        return Err(InventoryError::ConcurrencyConflict(format!(
                            "lot {} changed since it was read (expected version {})",
                            update.lot_id, update.expected_version
                        )));
                    }
                    adjustment_to_active(&audit).insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn insert_movement(&self, movement: MovementRecord) -> Result<(), InventoryError> {
        movement_to_active(&movement)?
            .insert(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn find_movement_by_reference(
        &self,
        material_id: Uuid,
        store_id: Uuid,
        movement_type: MovementType,
        reference_id: &str,
    ) -> Result<Option<MovementRecord>, InventoryError> {
        let model = stock_movement::Entity::find()
            .filter(stock_movement::Column::MaterialId.eq(material_id))
            .filter(stock_movement::Column::StoreId.eq(store_id))
            .filter(stock_movement::Column::MovementType.eq(movement_type.to_string()))
            .filter(stock_movement::Column::ReferenceId.eq(reference_id))
            .one(self.db.as_ref())
            .await?;
        model.map(movement_from_model).transpose()
    }

    async fn load_expiring_lots(
        &self,
        store_id: Uuid,
        cutoff: NaiveDate,
    ) -> Result<Vec<InventoryLot>, InventoryError> {
        let models = inventory_lot::Entity::find()
            .filter(inventory_lot::Column::StoreId.eq(store_id))
            .filter(inventory_lot::Column::Status.eq(LotStatus::Active.to_string()))
            .filter(inventory_lot::Column::AvailableQuantity.gt(Decimal::ZERO))
            .filter(inventory_lot::Column::ExpiryDate.is_not_null())
            .filter(inventory_lot::Column::ExpiryDate.lte(cutoff))
            .order_by_asc(inventory_lot::Column::ExpiryDate)
            .order_by_asc(inventory_lot::Column::Id)
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(lot_from_model).collect()
    }
}
