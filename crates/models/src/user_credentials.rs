//! Password hashes, one row per operator account.
//!
//! The hash is opaque here; hashing and verification live in the service
//! layer's auth module.
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::user;

/// Tag stored next to every hash written today.
pub const ARGON2: &str = "argon2";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub password_algorithm: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "user::Entity", from = "Column::UserId", to = "user::Column::Id", on_delete = "Cascade")]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

fn check_secret(password_hash: &str, algorithm: &str) -> Result<(), ModelError> {
    if password_hash.trim().is_empty() {
        return Err(ModelError::invalid("password_hash", "is required"));
    }
    if algorithm.trim().is_empty() || algorithm.len() > 32 {
        return Err(ModelError::invalid("password_algorithm", "must be 1 to 32 characters"));
    }
    Ok(())
}

/// Store `password_hash` for `user_id`, replacing any earlier one.
///
/// A single `INSERT ... ON CONFLICT (user_id) DO UPDATE`, so two concurrent
/// password changes cannot leave two rows behind.
pub async fn upsert_password<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    password_hash: String,
    algorithm: &str,
) -> Result<Model, ModelError> {
    check_secret(&password_hash, algorithm)?;
    let now = Utc::now().fixed_offset();
    let row = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        password_hash: Set(password_hash),
        password_algorithm: Set(algorithm.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let on_conflict = OnConflict::column(Column::UserId)
        .update_columns([Column::PasswordHash, Column::PasswordAlgorithm, Column::UpdatedAt])
        .to_owned();
    Entity::insert(row)
        .on_conflict(on_conflict)
        .exec_with_returning(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn find_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_hash_or_algorithm_is_refused() {
        assert!(matches!(check_secret("  ", ARGON2), Err(ModelError::Invalid { field: "password_hash", .. })));
        assert!(matches!(check_secret("$argon2id$v=19$...", ""), Err(ModelError::Invalid { field: "password_algorithm", .. })));
        assert!(matches!(check_secret("h", &"x".repeat(33)), Err(ModelError::Invalid { field: "password_algorithm", .. })));
        assert!(check_secret("$argon2id$v=19$...", ARGON2).is_ok());
    }

    #[test]
    fn hash_is_never_serialized() {
        let now = Utc::now().fixed_offset();
        let m = Model {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            password_hash: "secret-hash".into(),
            password_algorithm: ARGON2.into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(!json.contains("secret-hash"), "{json}");
    }

    #[tokio::test]
    async fn second_write_replaces_the_first() {
        let Some(db) = crate::tests::setup_test_db().await else { return };
        let email = format!("creds-{}@studio.test", Uuid::new_v4().simple());
        let u = crate::user::create(&db, &email, "Creds", None).await.unwrap();

        let first = upsert_password(&db, u.id, "hash-one".into(), ARGON2).await.unwrap();
        let second = upsert_password(&db, u.id, "hash-two".into(), ARGON2).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.password_hash, "hash-two");
        assert_eq!(find_for_user(&db, u.id).await.unwrap().map(|c| c.password_hash).as_deref(), Some("hash-two"));

        crate::user::hard_delete(&db, u.id).await.unwrap();
        assert!(find_for_user(&db, u.id).await.unwrap().is_none());
    }
}
