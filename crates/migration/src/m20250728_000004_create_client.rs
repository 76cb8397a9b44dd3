//! Create `clients` table; rows cascade away with the operator who registered them.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Client::Table)
                    .if_not_exists()
                    .col(uuid(Client::Id).primary_key())
                    .col(string_len(Client::Name, 100).not_null())
                    .col(string_len(Client::Email, 150).not_null())
                    .col(string_len(Client::Phone, 20).not_null())
                    .col(string_len(Client::Address, 255).not_null())
                    .col(string_len(Client::Status, 16).not_null().default("active"))
                    .col(text_null(Client::Notes))
                    .col(timestamp_with_time_zone(Client::RegisteredAt).not_null())
                    .col(uuid(Client::CreatedBy).not_null())
                    .col(timestamp_with_time_zone(Client::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Client::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_user")
                            .from(Client::Table, Client::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Client::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Client {
    #[sea_orm(iden = "clients")]
    Table,
    Id,
    Name,
    Email,
    Phone,
    Address,
    Status,
    Notes,
    RegisteredAt,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
}
