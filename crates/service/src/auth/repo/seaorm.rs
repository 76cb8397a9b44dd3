use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

#[derive(Clone)]
pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(models::user::find_by_email(&self.db, email).await?.map(AuthUser::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user(&self, email: &str, name: &str, role_id: Option<i32>) -> Result<AuthUser, AuthError> {
        let created = models::user::create(&self.db, email, name, role_id).await?;
        Ok(created.into())
    }

    async fn role_exists(&self, role_id: i32) -> Result<bool, AuthError> {
        let res = models::role::Entity::find_by_id(role_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.is_some())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_for_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{LoginInput, RegisterInput};
    use crate::auth::service::{AuthConfig, AuthService};
    use crate::test_support::get_db;
    use std::sync::Arc;

    #[tokio::test]
    async fn register_and_login_against_postgres() {
        let Some(db) = get_db().await else { return };
        let svc = AuthService::new(Arc::new(SeaOrmAuthRepository::new(db.clone())), AuthConfig::new("test-secret", 1));
        let email = format!("Owner-{}@Studio.test", Uuid::new_v4().simple());

        let user = svc
            .register(RegisterInput { email: email.clone(), name: "Owner".into(), password: "Passw0rd!".into(), role_id: Some(1) })
            .await
            .unwrap();
        assert_eq!(user.email, email.to_lowercase());
        assert_eq!(user.role_id, Some(1));

        let session = svc.login(LoginInput { email: email.clone(), password: "Passw0rd!".into() }).await.unwrap();
        assert_eq!(session.user.id, user.id);

        let dup = svc
            .register(RegisterInput { email, name: "Again".into(), password: "Passw0rd!".into(), role_id: None })
            .await;
        assert!(matches!(dup, Err(AuthError::Conflict)));

        models::user::hard_delete(&db, user.id).await.unwrap();
    }
}
