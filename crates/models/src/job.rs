use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::JobPriority;
use crate::{catalog, client, payment, user};

pub const DEFAULT_STATUS: &str = "pending";

/// A unit of billable work for a client using a catalog service.
///
/// `outstanding_balance` is derived state owned by the payment reconciler and
/// never goes below zero.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub start_date: Date,
    pub delivery_date: Date,
    pub status: String,
    pub priority: JobPriority,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub upfront: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub outstanding_balance: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Client,
    Service,
    CreatedBy,
    Payments,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Client => Entity::belongs_to(client::Entity).from(Column::ClientId).to(client::Column::Id).into(),
            Relation::Service => Entity::belongs_to(catalog::Entity).from(Column::ServiceId).to(catalog::Column::Id).into(),
            Relation::CreatedBy => Entity::belongs_to(user::Entity).from(Column::CreatedBy).to(user::Column::Id).into(),
            Relation::Payments => Entity::has_many(payment::Entity).into(),
        }
    }
}

impl Related<client::Entity> for Entity {
    fn to() -> RelationDef { Relation::Client.def() }
}

impl Related<catalog::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl Related<payment::Entity> for Entity {
    fn to() -> RelationDef { Relation::Payments.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Balance a freshly created job starts with.
pub fn initial_balance(total_price: Decimal, upfront: Decimal) -> Decimal {
    (total_price - upfront).max(Decimal::ZERO)
}
