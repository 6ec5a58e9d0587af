use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovements::TransactionId)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::MaterialId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::StoreId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockMovements::MovementType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Quantity)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::RequestedQuantity)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::TotalCost)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::ReferenceId).string().null())
                    .col(
                        ColumnDef::new(StockMovements::LotDetails)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::Notes).text().null())
                    .col(
                        ColumnDef::new(StockMovements::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Idempotency lookup: one movement per caller reference within a key
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_reference")
                    .table(StockMovements::Table)
                    .col(StockMovements::MaterialId)
                    .col(StockMovements::StoreId)
                    .col(StockMovements::MovementType)
                    .col(StockMovements::ReferenceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_material_store_occurred")
                    .table(StockMovements::Table)
                    .col(StockMovements::MaterialId)
                    .col(StockMovements::StoreId)
                    .col(StockMovements::OccurredAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockMovements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StockMovements {
    Table,
    TransactionId,
    MaterialId,
    StoreId,
    MovementType,
    Quantity,
    RequestedQuantity,
    TotalCost,
    Currency,
    ReferenceId,
    LotDetails,
    Notes,
    OccurredAt,
}
