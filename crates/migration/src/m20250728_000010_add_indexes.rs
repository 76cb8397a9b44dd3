use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Jobs: lookups by client/service and the status filter
        manager
            .create_index(Index::create().name("idx_job_client").table(Job::Table).col(Job::ClientId).to_owned())
            .await?;
        manager
            .create_index(Index::create().name("idx_job_service").table(Job::Table).col(Job::ServiceId).to_owned())
            .await?;
        manager
            .create_index(Index::create().name("idx_job_status").table(Job::Table).col(Job::Status).to_owned())
            .await?;

        // Payments: per-job reconciliation scans and date-range revenue
        manager
            .create_index(Index::create().name("idx_payment_job").table(Payment::Table).col(Payment::JobId).to_owned())
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_status_date")
                    .table(Payment::Table)
                    .col(Payment::Status)
                    .col(Payment::PaymentDate)
                    .to_owned(),
            )
            .await?;

        // Clients: status filter
        manager
            .create_index(Index::create().name("idx_client_status").table(Client::Table).col(Client::Status).to_owned())
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_index(Index::drop().name("idx_job_client").table(Job::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_job_service").table(Job::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_job_status").table(Job::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_payment_job").table(Payment::Table).to_owned()).await?;
        manager
            .drop_index(Index::drop().name("idx_payment_status_date").table(Payment::Table).to_owned())
            .await?;
        manager.drop_index(Index::drop().name("idx_client_status").table(Client::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Job {
    #[sea_orm(iden = "jobs")]
    Table,
    ClientId,
    ServiceId,
    Status,
}

#[derive(DeriveIden)]
enum Payment {
    #[sea_orm(iden = "payments")]
    Table,
    JobId,
    Status,
    PaymentDate,
}

#[derive(DeriveIden)]
enum Client {
    #[sea_orm(iden = "clients")]
    Table,
    Status,
}
