//! The service catalog: what the studio sells and at which list price.
use chrono::{DateTime, FixedOffset, Utc};
use models::enums::RecordStatus;
use models::{catalog, job, validate};
use rust_decimal::Decimal;
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
use crate::views::ServiceDetail;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub estimated_duration: Option<i32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ServiceInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let mut errors = FieldErrors::default();
        errors.check(validate::required("name", &self.name, 100));
        errors.check(validate::money("price", self.price));
        errors.check(validate::optional_max_len("category", self.category.as_deref(), 50));
        errors.check(validate::optional_max_len("image", self.image.as_deref(), 255));
        if matches!(self.estimated_duration, Some(minutes) if minutes < 1) {
            errors.add("estimated_duration", "must be at least 1 minute");
        }
        errors.into_result()
    }

    fn category(&self) -> String {
        non_blank(&self.category).unwrap_or(catalog::DEFAULT_CATEGORY).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSort {
    Name,
    Price,
    Category,
    CreatedAt,
}

impl SortKey for ServiceSort {
    type Entity = catalog::Entity;

    const KEYS: &'static [(&'static str, Self)] = &[
        ("name", ServiceSort::Name),
        ("price", ServiceSort::Price),
        ("category", ServiceSort::Category),
        ("created_at", ServiceSort::CreatedAt),
    ];
    const DEFAULT: Self = ServiceSort::CreatedAt;

    fn column(self) -> catalog::Column {
        match self {
            ServiceSort::Name => catalog::Column::Name,
            ServiceSort::Price => catalog::Column::Price,
            ServiceSort::Category => catalog::Column::Category,
            ServiceSort::CreatedAt => catalog::Column::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceFilters {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<RecordStatus>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u64>,
}

impl ServiceFilters {
    fn sort(&self) -> Sort<ServiceSort> {
        Sort::resolve(self.sort_by.as_deref(), self.sort_direction)
    }

    pub fn select(&self) -> Select<catalog::Entity> {
        let search = search_condition(
            non_blank(&self.search),
            &[catalog::Column::Name, catalog::Column::Description],
        );
        let query = catalog::Entity::find()
            .apply_if(search, |q, c| q.filter(c))
            .apply_if(non_blank(&self.category), |q, c| q.filter(catalog::Column::Category.eq(c)))
            .apply_if(self.status, |q, s| q.filter(catalog::Column::Status.eq(s)));
        self.sort().apply(query)
    }

    pub fn normalized(&self) -> Self {
        let sort = self.sort();
        Self {
            search: non_blank(&self.search).map(str::to_string),
            category: non_blank(&self.category).map(str::to_string),
            status: self.status,
            sort_by: Some(sort.key.name().to_string()),
            sort_direction: Some(sort.direction),
            page: Some(normalize_page(self.page)),
        }
    }
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, filters: &ServiceFilters) -> Result<Listing<catalog::Model, ServiceFilters>, ServiceError> {
    let mut filters = filters.normalized();
    let items = fetch_page(db, filters.select(), normalize_page(filters.page)).await?;
    filters.page = Some(items.current_page);
    Ok(Listing { items, filters })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<catalog::Model, ServiceError> {
    catalog::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("service"))
}

pub async fn detail(db: &DatabaseConnection, id: Uuid) -> Result<ServiceDetail, ServiceError> {
    let service = get(db, id).await?;
    let jobs = service.find_related(job::Entity).order_by_desc(job::Column::CreatedAt).all(db).await?;
    Ok(ServiceDetail { service, jobs })
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create(db: &DatabaseConnection, acting_user: Uuid, input: ServiceInput) -> Result<catalog::Model, ServiceError> {
    input.validate()?;
    let now: DateTime<FixedOffset> = Utc::now().into();
    let am = catalog::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        description: Set(input.description.clone()),
        price: Set(input.price.round_dp(2)),
        category: Set(input.category()),
        status: Set(input.status),
        estimated_duration: Set(input.estimated_duration),
        image: Set(input.image.clone()),
        created_by: Set(acting_user),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = am.insert(db).await?;
    info!(service = "catalog", event = "created", service_id = %created.id, created_by = %acting_user);
    Ok(created)
}

/// Price changes do not touch existing jobs; each job keeps its own total.
#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: ServiceInput) -> Result<catalog::Model, ServiceError> {
    let existing = get(db, id).await?;
    input.validate()?;
    let category = input.category();
    let mut am: catalog::ActiveModel = existing.into();
    am.name = Set(input.name.trim().to_string());
    am.description = Set(input.description);
    am.price = Set(input.price.round_dp(2));
    am.category = Set(category);
    am.status = Set(input.status);
    am.estimated_duration = Set(input.estimated_duration);
    am.image = Set(input.image);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(service = "catalog", event = "updated", service_id = %id);
    Ok(updated)
}

/// Remove the service and every job booked against it.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = catalog::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("service"));
    }
    info!(service = "catalog", event = "deleted", service_id = %id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::DbBackend;

    fn input(name: &str, price: Decimal) -> ServiceInput {
        ServiceInput { name: name.into(), description: "Half-day session".into(), price, ..Default::default() }
    }

    #[test]
    fn validation_rules() {
        assert!(input("Wedding", dec!(0)).validate().is_ok());
        let bad = ServiceInput { estimated_duration: Some(0), category: Some("x".repeat(51)), ..input(" ", dec!(-1)) };
        match bad.validate() {
            Err(ServiceError::Validation(f)) => {
                for field in ["name", "price", "category", "estimated_duration"] {
                    assert!(f.get(field).is_some(), "missing {field}");
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn price_is_capped_at_the_column_limit() {
        match input("Album", dec!(1000000000)).validate() {
            Err(ServiceError::Validation(f)) => assert_eq!(f.get("price").map(|m| m.to_vec()), Some(vec!["must be at most 99999999.99".to_string()])),
            other => panic!("unexpected {other:?}"),
        }
        assert!(input("Album", dec!(99999999.99)).validate().is_ok());
    }

    #[test]
    fn blank_category_defaults_to_photography() {
        assert_eq!(input("Portrait", dec!(50)).category(), "photography");
        let video = ServiceInput { category: Some("video".into()), ..input("Clip", dec!(50)) };
        assert_eq!(video.category(), "video");
    }

    #[test]
    fn filters_and_price_sort() {
        let f = ServiceFilters {
            search: Some("boda".into()),
            category: Some("video".into()),
            status: Some(RecordStatus::Active),
            sort_by: Some("price".into()),
            sort_direction: Some(SortDirection::Asc),
            page: Some(2),
        };
        let s = f.select().build(DbBackend::Postgres).to_string();
        assert!(s.contains(r#""services"."name" LIKE '%boda%' OR "services"."description" LIKE '%boda%'"#), "{s}");
        assert!(s.contains(r#""services"."category" = 'video'"#), "{s}");
        assert!(s.contains(r#""services"."status" = 'active'"#), "{s}");
        assert!(s.ends_with(r#"ORDER BY "services"."price" ASC"#), "{s}");
        assert_eq!(f.normalized().page, Some(2));
    }

    #[tokio::test]
    async fn create_update_delete() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let user = crate::test_support::acting_user(&db).await;

        let created = create(&db, user, input("Studio portrait", dec!(120.50))).await.unwrap();
        assert_eq!(created.category, "photography");
        assert_eq!(created.price, dec!(120.50));

        let edit = ServiceInput { estimated_duration: Some(90), category: Some("portrait".into()), ..input("Studio portrait", dec!(150)) };
        let updated = update(&db, created.id, edit).await.unwrap();
        assert_eq!(updated.estimated_duration, Some(90));
        assert_eq!(updated.category, "portrait");

        assert!(detail(&db, created.id).await.unwrap().jobs.is_empty());
        delete(&db, created.id).await.unwrap();
        assert!(matches!(detail(&db, created.id).await, Err(ServiceError::NotFound(_))));
        models::user::hard_delete(&db, user).await.unwrap();
    }
}
