//! Client records.
use chrono::{DateTime, FixedOffset, Utc};
use models::enums::RecordStatus;
use models::{client, job, validate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QueryTrait,
    Select, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{FieldErrors, ServiceError};
use crate::pagination::{fetch_page, normalize_page};
use crate::query::{non_blank, search_condition, Listing, Sort, SortDirection, SortKey};
use crate::views::ClientDetail;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the time of creation.
    #[serde(default)]
    pub registered_at: Option<DateTime<FixedOffset>>,
}

impl ClientInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let mut errors = FieldErrors::default();
        errors.check(validate::required("name", &self.name, 100));
        errors.check(validate::required("email", &self.email, 150).and_then(|_| validate::email("email", &self.email)));
        errors.check(validate::max_len("phone", &self.phone, 20));
        errors.check(validate::max_len("address", &self.address, 255));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSort {
    Name,
    Email,
    RegisteredAt,
    CreatedAt,
}

impl SortKey for ClientSort {
    type Entity = client::Entity;

    const KEYS: &'static [(&'static str, Self)] = &[
        ("name", ClientSort::Name),
        ("email", ClientSort::Email),
        ("registered_at", ClientSort::RegisteredAt),
        ("created_at", ClientSort::CreatedAt),
    ];
    const DEFAULT: Self = ClientSort::CreatedAt;

    fn column(self) -> client::Column {
        match self {
            ClientSort::Name => client::Column::Name,
            ClientSort::Email => client::Column::Email,
            ClientSort::RegisteredAt => client::Column::RegisteredAt,
            ClientSort::CreatedAt => client::Column::CreatedAt,
        }
    }
}

/// Query string of the client list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientFilters {
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u64>,
}

impl ClientFilters {
    fn sort(&self) -> Sort<ClientSort> {
        Sort::resolve(self.sort_by.as_deref(), self.sort_direction)
    }

    pub fn select(&self) -> Select<client::Entity> {
        let search = search_condition(
            non_blank(&self.search),
            &[client::Column::Name, client::Column::Email, client::Column::Phone],
        );
        let query = client::Entity::find()
            .apply_if(search, |q, c| q.filter(c))
            .apply_if(self.status, |q, s| q.filter(client::Column::Status.eq(s)));
        self.sort().apply(query)
    }

    /// The filters as applied: sort and page resolved to their effective values.
    pub fn normalized(&self) -> Self {
        let sort = self.sort();
        Self {
            search: non_blank(&self.search).map(str::to_string),
            status: self.status,
            sort_by: Some(sort.key.name().to_string()),
            sort_direction: Some(sort.direction),
            page: Some(normalize_page(self.page)),
        }
    }
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, filters: &ClientFilters) -> Result<Listing<client::Model, ClientFilters>, ServiceError> {
    let mut filters = filters.normalized();
    let items = fetch_page(db, filters.select(), normalize_page(filters.page)).await?;
    filters.page = Some(items.current_page);
    Ok(Listing { items, filters })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<client::Model, ServiceError> {
    client::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("client"))
}

/// The client with its jobs, newest first.
pub async fn detail(db: &DatabaseConnection, id: Uuid) -> Result<ClientDetail, ServiceError> {
    let client = get(db, id).await?;
    let jobs = client.find_related(job::Entity).order_by_desc(job::Column::CreatedAt).all(db).await?;
    Ok(ClientDetail { client, jobs })
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create(db: &DatabaseConnection, acting_user: Uuid, input: ClientInput) -> Result<client::Model, ServiceError> {
    input.validate()?;
    let now: DateTime<FixedOffset> = Utc::now().into();
    let am = client::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        email: Set(input.email.trim().to_lowercase()),
        phone: Set(input.phone.trim().to_string()),
        address: Set(input.address.trim().to_string()),
        status: Set(input.status),
        notes: Set(input.notes),
        registered_at: Set(input.registered_at.unwrap_or(now)),
        created_by: Set(acting_user),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = am.insert(db).await?;
    info!(service = "clients", event = "created", client_id = %created.id, created_by = %acting_user);
    Ok(created)
}

#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: ClientInput) -> Result<client::Model, ServiceError> {
    let existing = get(db, id).await?;
    input.validate()?;
    let mut am: client::ActiveModel = existing.into();
    am.name = Set(input.name.trim().to_string());
    am.email = Set(input.email.trim().to_lowercase());
    am.phone = Set(input.phone.trim().to_string());
    am.address = Set(input.address.trim().to_string());
    am.status = Set(input.status);
    am.notes = Set(input.notes);
    if let Some(at) = input.registered_at {
        am.registered_at = Set(at);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(service = "clients", event = "updated", client_id = %id);
    Ok(updated)
}

/// Remove the client; its jobs and their payments go with it.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = client::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("client"));
    }
    info!(service = "clients", event = "deleted", client_id = %id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, PaginatorTrait};

    fn sql(filters: &ClientFilters) -> String {
        filters.select().build(DbBackend::Postgres).to_string()
    }

    fn input(name: &str, email: &str) -> ClientInput {
        ClientInput { name: name.into(), email: email.into(), phone: "999 111 222".into(), ..Default::default() }
    }

    #[test]
    fn validation_reports_each_field() {
        let bad = ClientInput { name: "".into(), email: "nope".into(), phone: "1".repeat(21), ..Default::default() };
        match bad.validate() {
            Err(ServiceError::Validation(f)) => {
                assert!(f.get("name").is_some());
                assert!(f.get("email").is_some());
                assert!(f.get("phone").is_some());
                assert!(f.get("address").is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(input("Ana Torres", "ana@studio.pe").validate().is_ok());
    }

    #[test]
    fn default_listing_sorts_by_created_at_desc() {
        let s = sql(&ClientFilters::default());
        assert!(s.ends_with(r#"ORDER BY "clients"."created_at" DESC"#), "{s}");
        assert!(!s.contains("LIKE"));
    }

    #[test]
    fn search_ors_name_email_phone_and_ands_status() {
        let f = ClientFilters {
            search: Some("ana".into()),
            status: Some(RecordStatus::Inactive),
            sort_by: Some("name".into()),
            sort_direction: Some(SortDirection::Asc),
            page: None,
        };
        let s = sql(&f);
        assert!(s.contains(r#""clients"."name" LIKE '%ana%' OR "clients"."email" LIKE '%ana%' OR "clients"."phone" LIKE '%ana%'"#), "{s}");
        assert!(s.contains(r#""clients"."status" = 'inactive'"#), "{s}");
        assert!(s.ends_with(r#"ORDER BY "clients"."name" ASC"#), "{s}");
    }

    #[test]
    fn unknown_sort_falls_back_to_default() {
        let f = ClientFilters { sort_by: Some("password".into()), ..Default::default() };
        let n = f.normalized();
        assert_eq!(n.sort_by.as_deref(), Some("created_at"));
        assert_eq!(n.sort_direction, Some(SortDirection::Desc));
        assert_eq!(n.page, Some(1));
    }

    #[test]
    fn blank_search_is_dropped() {
        let f = ClientFilters { search: Some("   ".into()), ..Default::default() };
        assert_eq!(f.normalized().search, None);
        assert!(!sql(&f).contains("LIKE"));
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let user = crate::test_support::acting_user(&db).await;

        let created = create(&db, user, input("Lucía Ramos", "LUCIA@studio.pe")).await.unwrap();
        assert_eq!(created.email, "lucia@studio.pe");
        assert_eq!(created.status, RecordStatus::Active);
        assert_eq!(created.created_by, user);

        let mut edit = input("Lucía R.", "lucia@studio.pe");
        edit.status = RecordStatus::Inactive;
        let updated = update(&db, created.id, edit).await.unwrap();
        assert_eq!(updated.name, "Lucía R.");
        assert_eq!(updated.registered_at, created.registered_at);

        let d = detail(&db, created.id).await.unwrap();
        assert!(d.jobs.is_empty());

        let f = ClientFilters { search: Some("Lucía R".into()), status: Some(RecordStatus::Inactive), ..Default::default() };
        let listing = list(&db, &f).await.unwrap();
        assert!(listing.items.data.iter().any(|c| c.id == created.id));
        assert_eq!(listing.filters.sort_by.as_deref(), Some("created_at"));

        delete(&db, created.id).await.unwrap();
        assert!(matches!(get(&db, created.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(delete(&db, created.id).await, Err(ServiceError::NotFound(_))));
        models::user::hard_delete(&db, user).await.unwrap();
    }

    #[tokio::test]
    async fn page_past_the_end_serves_the_last_page() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let user = crate::test_support::acting_user(&db).await;
        let tag = Uuid::new_v4().simple().to_string();
        let created = create(&db, user, input(&format!("Paged {tag}"), "paged@studio.pe")).await.unwrap();

        let f = ClientFilters { search: Some(tag), page: Some(u64::MAX), ..Default::default() };
        let listing = list(&db, &f).await.unwrap();
        assert_eq!(listing.items.current_page, 1);
        assert_eq!(listing.filters.page, Some(1));
        assert_eq!(listing.items.data.iter().map(|c| c.id).collect::<Vec<_>>(), vec![created.id]);

        delete(&db, created.id).await.unwrap();
        models::user::hard_delete(&db, user).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_input_writes_nothing() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let user = crate::test_support::acting_user(&db).await;
        let res = create(&db, user, input("", "bad")).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        let written = client::Entity::find().filter(client::Column::CreatedBy.eq(user)).count(&db).await.unwrap();
        assert_eq!(written, 0);
        models::user::hard_delete(&db, user).await.unwrap();
    }
}
