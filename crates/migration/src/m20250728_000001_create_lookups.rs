//! Create lookup tables (`roles`, `job_statuses`, `payment_statuses`) and seed them.
//!
//! Job and payment statuses are stored inline on their rows; these tables only back
//! form dropdowns and the lookups endpoint.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

const ROLES: [&str; 3] = ["Administrator", "Employee", "Client"];
const JOB_STATUSES: [&str; 4] = ["Pending", "In progress", "Completed", "Cancelled"];
const PAYMENT_STATUSES: [&str; 4] = ["Pending", "Partial", "Completed", "Cancelled"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(pk_auto(Role::Id))
                    .col(string_len(Role::Name, 50).unique_key().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(JobStatus::Table)
                    .if_not_exists()
                    .col(pk_auto(JobStatus::Id))
                    .col(string_len(JobStatus::Name, 50).unique_key().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(PaymentStatus::Table)
                    .if_not_exists()
                    .col(pk_auto(PaymentStatus::Id))
                    .col(string_len(PaymentStatus::Name, 50).unique_key().not_null())
                    .to_owned(),
            )
            .await?;

        let mut roles = Query::insert();
        roles.into_table(Role::Table).columns([Role::Name]);
        for name in ROLES {
            roles.values_panic([name.into()]);
        }
        manager.exec_stmt(roles).await?;

        let mut job_statuses = Query::insert();
        job_statuses.into_table(JobStatus::Table).columns([JobStatus::Name]);
        for name in JOB_STATUSES {
            job_statuses.values_panic([name.into()]);
        }
        manager.exec_stmt(job_statuses).await?;

        let mut payment_statuses = Query::insert();
        payment_statuses.into_table(PaymentStatus::Table).columns([PaymentStatus::Name]);
        for name in PAYMENT_STATUSES {
            payment_statuses.values_panic([name.into()]);
        }
        manager.exec_stmt(payment_statuses).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PaymentStatus::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(JobStatus::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Role::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Role {
    #[sea_orm(iden = "roles")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum JobStatus {
    #[sea_orm(iden = "job_statuses")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum PaymentStatus {
    #[sea_orm(iden = "payment_statuses")]
    Table,
    Id,
    Name,
}
