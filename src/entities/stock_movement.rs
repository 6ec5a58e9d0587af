use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_id: Uuid,
    pub material_id: Uuid,
    pub store_id: Uuid,
    pub movement_type: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: rust_decimal::Decimal,
    /// Quantity the caller asked for; the difference from `quantity` is the
    /// shortage, reconstructed on idempotent replay.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub requested_quantity: rust_decimal::Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_cost: rust_decimal::Decimal,
    pub currency: String,
    pub reference_id: Option<String>,
    /// Serialized `Vec<UsedLot>`.
    #[sea_orm(column_type = "JsonBinary")]
    pub lot_details: Json,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
