//! Create `jobs` table. `outstanding_balance` carries a CHECK so the zero floor
//! also holds at the storage level.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Job::Table)
                    .if_not_exists()
                    .col(uuid(Job::Id).primary_key())
                    .col(uuid(Job::ClientId).not_null())
                    .col(uuid(Job::ServiceId).not_null())
                    .col(uuid(Job::CreatedBy).not_null())
                    .col(string_len(Job::Title, 200).not_null())
                    .col(text(Job::Description).not_null())
                    .col(date(Job::StartDate).not_null())
                    .col(date(Job::DeliveryDate).not_null())
                    .col(string_len(Job::Status, 50).not_null().default("pending"))
                    .col(string_len(Job::Priority, 16).not_null().default("medium"))
                    .col(decimal_len(Job::TotalPrice, 10, 2).not_null().default(0))
                    .col(decimal_len(Job::Upfront, 10, 2).not_null().default(0))
                    .col(
                        decimal_len(Job::OutstandingBalance, 10, 2)
                            .not_null()
                            .default(0)
                            .check(Expr::col(Job::OutstandingBalance).gte(0)),
                    )
                    .col(text_null(Job::Notes))
                    .col(timestamp_with_time_zone(Job::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Job::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_client")
                            .from(Job::Table, Job::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_service")
                            .from(Job::Table, Job::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_user")
                            .from(Job::Table, Job::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Job::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Job {
    #[sea_orm(iden = "jobs")]
    Table,
    Id,
    ClientId,
    ServiceId,
    CreatedBy,
    Title,
    Description,
    StartDate,
    DeliveryDate,
    Status,
    Priority,
    TotalPrice,
    Upfront,
    OutstandingBalance,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client {
    #[sea_orm(iden = "clients")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Service {
    #[sea_orm(iden = "services")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
}
