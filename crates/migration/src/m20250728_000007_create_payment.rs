//! Create `payments` table. Payments reference jobs (not clients) and the operator
//! who recorded them.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(uuid(Payment::Id).primary_key())
                    .col(uuid(Payment::JobId).not_null())
                    .col(uuid(Payment::RecordedBy).not_null())
                    .col(decimal_len(Payment::Amount, 10, 2).not_null())
                    .col(date(Payment::PaymentDate).not_null())
                    .col(string_len(Payment::Method, 16).not_null())
                    .col(string_len_null(Payment::Reference, 255))
                    .col(string_len(Payment::Status, 16).not_null().default("completed"))
                    .col(string_len(Payment::PaymentType, 16).not_null())
                    .col(text_null(Payment::Notes))
                    .col(timestamp_with_time_zone(Payment::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Payment::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_job")
                            .from(Payment::Table, Payment::JobId)
                            .to(Job::Table, Job::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_user")
                            .from(Payment::Table, Payment::RecordedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Payment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Payment {
    #[sea_orm(iden = "payments")]
    Table,
    Id,
    JobId,
    RecordedBy,
    Amount,
    PaymentDate,
    Method,
    Reference,
    Status,
    PaymentType,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Job {
    #[sea_orm(iden = "jobs")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
}
