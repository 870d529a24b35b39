use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240201_000001_create_bookings_table::Migration),
            Box::new(m20240201_000002_create_payments_table::Migration),
            Box::new(m20240201_000003_create_extra_charges_table::Migration),
            Box::new(m20240201_000004_create_room_items_table::Migration),
            Box::new(m20240201_000005_create_inventory_usages_table::Migration),
            Box::new(m20240201_000006_create_shifts_table::Migration),
            Box::new(m20240201_000007_create_credit_notes_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240201_000001_create_bookings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000001_create_bookings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bookings::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bookings::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Bookings::RoomId).uuid().not_null())
                        .col(ColumnDef::new(Bookings::GuestId).uuid().not_null())
                        .col(ColumnDef::new(Bookings::CheckInDate).date().not_null())
                        .col(ColumnDef::new(Bookings::CheckOutDate).date().not_null())
                        .col(ColumnDef::new(Bookings::Nights).integer().not_null())
                        .col(ColumnDef::new(Bookings::GuestCount).integer().not_null())
                        .col(ColumnDef::new(Bookings::RoomAmount).decimal().not_null())
                        .col(ColumnDef::new(Bookings::Status).string().not_null())
                        .col(
                            ColumnDef::new(Bookings::RoomClean)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Bookings::InventoryVerified)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Bookings::InventoryVerifiedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::InventoryDelivered)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Bookings::InventoryDeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Bookings::InventoryDeliveredBy).uuid().null())
                        .col(
                            ColumnDef::new(Bookings::PassengersCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Bookings::PassengersCompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::ActualCheckIn)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::ActualCheckOut)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Bookings::CancelledReason).string().null())
                        .col(ColumnDef::new(Bookings::CancelledBy).uuid().null())
                        .col(
                            ColumnDef::new(Bookings::CancelledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Bookings::CancellationNotes).string().null())
                        .col(
                            ColumnDef::new(Bookings::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Bookings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_status")
                        .table(Bookings::Table)
                        .col(Bookings::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_room_id")
                        .table(Bookings::Table)
                        .col(Bookings::RoomId)
                        .to_owned(),
                )
                .await?;

            // The overdue query filters on scheduled check-out
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_check_out_date")
                        .table(Bookings::Table)
                        .col(Bookings::CheckOutDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bookings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Bookings {
        Table,
        Id,
        RoomId,
        GuestId,
        CheckInDate,
        CheckOutDate,
        Nights,
        GuestCount,
        RoomAmount,
        Status,
        RoomClean,
        InventoryVerified,
        InventoryVerifiedAt,
        InventoryDelivered,
        InventoryDeliveredAt,
        InventoryDeliveredBy,
        PassengersCompleted,
        PassengersCompletedAt,
        ActualCheckIn,
        ActualCheckOut,
        CancelledReason,
        CancelledBy,
        CancelledAt,
        CancellationNotes,
        IsArchived,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20240201_000002_create_payments_table {

    use sea_orm_migration::prelude::*;

    use super::m20240201_000001_create_bookings_table::Bookings;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000002_create_payments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::BookingId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::Method).string().not_null())
                        .col(ColumnDef::new(Payments::Status).string().not_null())
                        .col(ColumnDef::new(Payments::PaymentType).string().not_null())
                        .col(ColumnDef::new(Payments::ProcessedBy).uuid().not_null())
                        .col(ColumnDef::new(Payments::ShiftId).uuid().null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_booking_id")
                                .from(Payments::Table, Payments::BookingId)
                                .to(Bookings::Table, Bookings::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_booking_id")
                        .table(Payments::Table)
                        .col(Payments::BookingId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_shift_id")
                        .table(Payments::Table)
                        .col(Payments::ShiftId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Payments {
        Table,
        Id,
        BookingId,
        Amount,
        Method,
        Status,
        PaymentType,
        ProcessedBy,
        ShiftId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240201_000003_create_extra_charges_table {

    use sea_orm_migration::prelude::*;

    use super::m20240201_000001_create_bookings_table::Bookings;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000003_create_extra_charges_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ExtraCharges::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ExtraCharges::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ExtraCharges::BookingId).uuid().not_null())
                        .col(ColumnDef::new(ExtraCharges::Description).string().not_null())
                        .col(ColumnDef::new(ExtraCharges::Amount).decimal().not_null())
                        .col(ColumnDef::new(ExtraCharges::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ExtraCharges::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExtraCharges::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_extra_charges_booking_id")
                                .from(ExtraCharges::Table, ExtraCharges::BookingId)
                                .to(Bookings::Table, Bookings::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_extra_charges_booking_id")
                        .table(ExtraCharges::Table)
                        .col(ExtraCharges::BookingId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ExtraCharges::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ExtraCharges {
        Table,
        Id,
        BookingId,
        Description,
        Amount,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240201_000004_create_room_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000004_create_room_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RoomItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RoomItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(RoomItems::RoomId).uuid().not_null())
                        .col(ColumnDef::new(RoomItems::ItemType).string().not_null())
                        .col(ColumnDef::new(RoomItems::Quantity).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_room_items_room_id")
                        .table(RoomItems::Table)
                        .col(RoomItems::RoomId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RoomItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum RoomItems {
        Table,
        Id,
        RoomId,
        ItemType,
        Quantity,
    }
}

mod m20240201_000005_create_inventory_usages_table {

    use sea_orm_migration::prelude::*;

    use super::m20240201_000001_create_bookings_table::Bookings;
    use super::m20240201_000004_create_room_items_table::RoomItems;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000005_create_inventory_usages_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryUsages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryUsages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryUsages::BookingId).uuid().not_null())
                        .col(ColumnDef::new(InventoryUsages::ItemId).uuid().not_null())
                        .col(ColumnDef::new(InventoryUsages::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(InventoryUsages::QuantityConsumed)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryUsages::QuantityReturned)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryUsages::Status).string().not_null())
                        .col(
                            ColumnDef::new(InventoryUsages::AssignedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryUsages::ReturnedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryUsages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryUsages::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_usages_booking_id")
                                .from(InventoryUsages::Table, InventoryUsages::BookingId)
                                .to(Bookings::Table, Bookings::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_usages_item_id")
                                .from(InventoryUsages::Table, InventoryUsages::ItemId)
                                .to(RoomItems::Table, RoomItems::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_usages_booking_id")
                        .table(InventoryUsages::Table)
                        .col(InventoryUsages::BookingId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryUsages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryUsages {
        Table,
        Id,
        BookingId,
        ItemId,
        Quantity,
        QuantityConsumed,
        QuantityReturned,
        Status,
        AssignedAt,
        ReturnedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240201_000006_create_shifts_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000006_create_shifts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shifts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Shifts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Shifts::OperatorId).uuid().not_null())
                        .col(ColumnDef::new(Shifts::Status).string().not_null())
                        .col(
                            ColumnDef::new(Shifts::OpenedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Shifts::ClosedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Shifts::OpeningCash).decimal().not_null())
                        .col(ColumnDef::new(Shifts::ClosingCash).decimal().null())
                        .col(ColumnDef::new(Shifts::ExpectedCash).decimal().null())
                        .col(ColumnDef::new(Shifts::CashDifference).decimal().null())
                        .col(
                            ColumnDef::new(Shifts::TotalCashSales)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::TotalCardSales)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::TotalTransferSales)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::TotalSales)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::CashCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::CardCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::TransferCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::TotalTransactions)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::CheckInCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::CheckOutCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shifts::BookingsCreated)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Shifts::OpeningNotes).string().null())
                        .col(ColumnDef::new(Shifts::ClosingNotes).string().null())
                        .col(
                            ColumnDef::new(Shifts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Shifts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shifts_operator_id")
                        .table(Shifts::Table)
                        .col(Shifts::OperatorId)
                        .to_owned(),
                )
                .await?;

            // One open drawer per operator, enforced at the data layer so a
            // concurrent second opener fails cleanly instead of inserting a
            // duplicate. Partial indexes are beyond the index builder, so
            // raw SQL (valid on both sqlite and postgres).
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_shifts_one_open_per_operator \
                     ON shifts (operator_id) WHERE status = 'open'",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Shifts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Shifts {
        Table,
        Id,
        OperatorId,
        Status,
        OpenedAt,
        ClosedAt,
        OpeningCash,
        ClosingCash,
        ExpectedCash,
        CashDifference,
        TotalCashSales,
        TotalCardSales,
        TotalTransferSales,
        TotalSales,
        CashCount,
        CardCount,
        TransferCount,
        TotalTransactions,
        CheckInCount,
        CheckOutCount,
        BookingsCreated,
        OpeningNotes,
        ClosingNotes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240201_000007_create_credit_notes_table {

    use sea_orm_migration::prelude::*;

    use super::m20240201_000001_create_bookings_table::Bookings;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000007_create_credit_notes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CreditNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CreditNotes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CreditNotes::BookingId).uuid().not_null())
                        .col(ColumnDef::new(CreditNotes::Amount).decimal().not_null())
                        .col(ColumnDef::new(CreditNotes::Reason).string().not_null())
                        .col(ColumnDef::new(CreditNotes::IssuedBy).uuid().null())
                        .col(
                            ColumnDef::new(CreditNotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_credit_notes_booking_id")
                                .from(CreditNotes::Table, CreditNotes::BookingId)
                                .to(Bookings::Table, Bookings::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_credit_notes_booking_id")
                        .table(CreditNotes::Table)
                        .col(CreditNotes::BookingId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CreditNotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CreditNotes {
        Table,
        Id,
        BookingId,
        Amount,
        Reason,
        IssuedBy,
        CreatedAt,
    }
}
