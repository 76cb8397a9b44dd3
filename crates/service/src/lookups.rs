//! Seeded lookup tables for dropdowns.
use models::{job_status, payment_status, role};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::errors::ServiceError;
use crate::views::Lookups;

pub async fn all(db: &DatabaseConnection) -> Result<Lookups, ServiceError> {
    Ok(Lookups {
        roles: role::Entity::find().order_by_asc(role::Column::Id).all(db).await?,
        job_statuses: job_status::Entity::find().order_by_asc(job_status::Column::Id).all(db).await?,
        payment_statuses: payment_status::Entity::find().order_by_asc(payment_status::Column::Id).all(db).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_rows_are_served_in_order() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let l = all(&db).await.unwrap();
        let roles: Vec<&str> = l.roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(roles, ["Administrator", "Employee", "Client"]);
        assert_eq!(l.job_statuses.len(), 4);
        assert_eq!(l.payment_statuses.first().map(|s| s.name.as_str()), Some("Pending"));
    }
}
