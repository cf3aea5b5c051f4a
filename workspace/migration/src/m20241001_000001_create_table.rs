use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len_uniq(Users::Username, 25))
                    .col(string(Users::PasswordHash))
                    .col(string_len(Users::Name, 75))
                    .col(string_len(Users::PhoneNumber, 11))
                    .col(text(Users::Address))
                    .col(string_uniq(Users::Email))
                    .col(string_len(Users::UserType, 1).default("S"))
                    .col(string_len_null(Users::Status, 10))
                    .to_owned(),
            )
            .await?;

        // Create vans table
        manager
            .create_table(
                Table::create()
                    .table(Vans::Table)
                    .if_not_exists()
                    .col(pk_auto(Vans::Id))
                    .col(string_len_uniq(Vans::VanNumber, 15))
                    .col(boolean(Vans::Ada).default(false))
                    .col(integer_null(Vans::DriverId).unique_key())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vans_driver")
                            .from(Vans::Table, Vans::DriverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create rides table
        manager
            .create_table(
                Table::create()
                    .table(Rides::Table)
                    .if_not_exists()
                    .col(pk_auto(Rides::Id))
                    .col(integer(Rides::RiderId))
                    .col(integer_null(Rides::DriverId))
                    .col(integer_null(Rides::VanId))
                    .col(string_len(Rides::PickupLocation, 200))
                    .col(string_len(Rides::DropoffLocation, 200))
                    .col(integer(Rides::NumPassengers).default(1))
                    .col(boolean(Rides::AdaRequired).default(false))
                    .col(string_len(Rides::Status, 20).default("pending"))
                    .col(timestamp_with_time_zone_null(Rides::PickupTime))
                    .col(timestamp_with_time_zone_null(Rides::AssignedAt))
                    .col(timestamp_with_time_zone(Rides::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rides_rider")
                            .from(Rides::Table, Rides::RiderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rides_driver")
                            .from(Rides::Table, Rides::DriverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rides_van")
                            .from(Rides::Table, Rides::VanId)
                            .to(Vans::Table, Vans::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The queue is read by status in insertion order
        manager
            .create_index(
                Index::create()
                    .name("idx_rides_status")
                    .table(Rides::Table)
                    .col(Rides::Status)
                    .col(Rides::Id)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Create reports table
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(pk_auto(Reports::Id))
                    .col(integer_null(Reports::ReporterId))
                    .col(string_len(Reports::ReportType, 20))
                    .col(text(Reports::Context))
                    .col(timestamp_with_time_zone(Reports::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reports_reporter")
                            .from(Reports::Table, Reports::ReporterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create messages table
        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(pk_auto(Messages::Id))
                    .col(integer(Messages::RiderId))
                    .col(integer(Messages::DriverId))
                    .col(text(Messages::Text))
                    .col(timestamp_with_time_zone(Messages::SentAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_rider")
                            .from(Messages::Table, Messages::RiderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_driver")
                            .from(Messages::Table, Messages::DriverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notifications table
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(pk_auto(Notifications::Id))
                    .col(integer(Notifications::RiderId))
                    .col(text(Notifications::Text))
                    .col(timestamp_with_time_zone(Notifications::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_rider")
                            .from(Notifications::Table, Notifications::RiderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order of creation to respect foreign key constraints
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Messages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rides::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    Name,
    PhoneNumber,
    Address,
    Email,
    UserType,
    Status,
}

#[derive(DeriveIden)]
enum Vans {
    Table,
    Id,
    VanNumber,
    Ada,
    DriverId,
}

#[derive(DeriveIden)]
enum Rides {
    Table,
    Id,
    RiderId,
    DriverId,
    VanId,
    PickupLocation,
    DropoffLocation,
    NumPassengers,
    AdaRequired,
    Status,
    PickupTime,
    AssignedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
    ReporterId,
    ReportType,
    Context,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    Id,
    RiderId,
    DriverId,
    Text,
    SentAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    RiderId,
    Text,
    CreatedAt,
}
