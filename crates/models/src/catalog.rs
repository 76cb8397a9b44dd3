//! The studio's service catalog (`services` table).
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::RecordStatus;
use crate::{job, user};

pub const DEFAULT_CATEGORY: &str = "photography";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub category: String,
    pub status: RecordStatus,
    /// Minutes.
    pub estimated_duration: Option<i32>,
    pub image: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    CreatedBy,
    Jobs,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::CreatedBy => Entity::belongs_to(user::Entity).from(Column::CreatedBy).to(user::Column::Id).into(),
            Relation::Jobs => Entity::has_many(job::Entity).into(),
        }
    }
}

impl Related<job::Entity> for Entity {
    fn to() -> RelationDef { Relation::Jobs.def() }
}

impl ActiveModelBehavior for ActiveModel {}
