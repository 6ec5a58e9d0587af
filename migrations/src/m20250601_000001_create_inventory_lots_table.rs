use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryLots::Id)
                            .big_integer()
                            .auto_increment()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLots::MaterialId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryLots::StoreId).uuid().not_null())
                    .col(
                        ColumnDef::new(InventoryLots::LotNumber)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLots::ReceivedDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryLots::ExpiryDate).date().null())
                    .col(
                        ColumnDef::new(InventoryLots::ReceivedQuantity)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLots::AvailableQuantity)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLots::UnitCost)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLots::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryLots::SupplierInfo).text().null())
                    .col(ColumnDef::new(InventoryLots::Status).string().not_null())
                    .col(
                        ColumnDef::new(InventoryLots::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryLots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Lot numbers are unique within one material+store
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_lots_material_store_lot_number")
                    .table(InventoryLots::Table)
                    .col(InventoryLots::MaterialId)
                    .col(InventoryLots::StoreId)
                    .col(InventoryLots::LotNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Covers the FIFO scan: material+store, received_date, id
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_lots_fifo")
                    .table(InventoryLots::Table)
                    .col(InventoryLots::MaterialId)
                    .col(InventoryLots::StoreId)
                    .col(InventoryLots::ReceivedDate)
                    .col(InventoryLots::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_lots_store_expiry")
                    .table(InventoryLots::Table)
                    .col(InventoryLots::StoreId)
                    .col(InventoryLots::ExpiryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryLots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InventoryLots {
    Table,
    Id,
    MaterialId,
    StoreId,
    LotNumber,
    ReceivedDate,
    ExpiryDate,
    ReceivedQuantity,
    AvailableQuantity,
    UnitCost,
    Currency,
    SupplierInfo,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
}
