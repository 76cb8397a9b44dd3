//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250728_000001_create_lookups;
mod m20250728_000002_create_user;
mod m20250728_000003_create_user_credentials;
mod m20250728_000004_create_client;
mod m20250728_000005_create_service;
mod m20250728_000006_create_job;
mod m20250728_000007_create_payment;
mod m20250728_000010_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250728_000001_create_lookups::Migration),
            Box::new(m20250728_000002_create_user::Migration),
            Box::new(m20250728_000003_create_user_credentials::Migration),
            Box::new(m20250728_000004_create_client::Migration),
            Box::new(m20250728_000005_create_service::Migration),
            Box::new(m20250728_000006_create_job::Migration),
            Box::new(m20250728_000007_create_payment::Migration),
            // Indexes should always be applied last
            Box::new(m20250728_000010_add_indexes::Migration),
        ]
    }
}
