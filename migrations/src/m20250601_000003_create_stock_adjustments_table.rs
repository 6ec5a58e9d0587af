use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockAdjustments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockAdjustments::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::LotId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::MaterialId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockAdjustments::StoreId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockAdjustments::PreviousQuantity)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::NewQuantity)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::Delta)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                    .col(ColumnDef::new(StockAdjustments::Notes).text().null())
                    .col(
                        ColumnDef::new(StockAdjustments::ApprovedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_adjustments_lot")
                    .table(StockAdjustments::Table)
                    .col(StockAdjustments::LotId)
                    .col(StockAdjustments::OccurredAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StockAdjustments {
    Table,
    Id,
    LotId,
    MaterialId,
    StoreId,
    PreviousQuantity,
    NewQuantity,
    Delta,
    Reason,
    Notes,
    ApprovedBy,
    OccurredAt,
}
