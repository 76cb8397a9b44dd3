//! Jobs (work orders) and their list screen.
//!
//! A job's `outstanding_balance` starts at `total_price - upfront` and is then
//! owned by the payment reconciler. Editing the price terms recomputes it from
//! the job's completed payments under the same row lock the payment path uses.
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use models::enums::JobPriority;
use models::{catalog, client, job, job_status, payment, validate};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{FieldErrors, ServiceError};
use crate::pagination::{fetch_page, normalize_page};
use crate::query::{date_range, non_blank, search_condition, Listing, Sort, SortDirection, SortKey};
use crate::reconciler::{self, PaymentEffect};
use crate::views::{Choice, JobDetail, JobFormOptions, JobRow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub delivery_date: NaiveDate,
    /// Blank means `pending`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: JobPriority,
    pub total_price: Decimal,
    #[serde(default)]
    pub upfront: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl JobInput {
    /// Checks that need no database.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(validate::required("title", &self.title, 200));
        errors.check(validate::optional_max_len("status", self.status.as_deref(), 50));
        errors.check(validate::money("total_price", self.total_price));
        errors.check(validate::money("upfront", self.upfront));
        if self.delivery_date < self.start_date {
            errors.add("delivery_date", "must not be before start_date");
        }
        errors
    }

    fn status(&self) -> String {
        non_blank(&self.status).unwrap_or(job::DEFAULT_STATUS).to_string()
    }

    /// Full validation including existence of the referenced client and service.
    pub async fn validate<C: ConnectionTrait>(&self, db: &C) -> Result<(), ServiceError> {
        let mut errors = self.field_errors();
        if client::Entity::find_by_id(self.client_id).one(db).await?.is_none() {
            errors.add("client_id", "does not exist");
        }
        if catalog::Entity::find_by_id(self.service_id).one(db).await?.is_none() {
            errors.add("service_id", "does not exist");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSort {
    Title,
    StartDate,
    DeliveryDate,
    TotalPrice,
    OutstandingBalance,
    CreatedAt,
}

impl SortKey for JobSort {
    type Entity = job::Entity;

    const KEYS: &'static [(&'static str, Self)] = &[
        ("title", JobSort::Title),
        ("start_date", JobSort::StartDate),
        ("delivery_date", JobSort::DeliveryDate),
        ("total_price", JobSort::TotalPrice),
        ("outstanding_balance", JobSort::OutstandingBalance),
        ("created_at", JobSort::CreatedAt),
    ];
    const DEFAULT: Self = JobSort::CreatedAt;

    fn column(self) -> job::Column {
        match self {
            JobSort::Title => job::Column::Title,
            JobSort::StartDate => job::Column::StartDate,
            JobSort::DeliveryDate => job::Column::DeliveryDate,
            JobSort::TotalPrice => job::Column::TotalPrice,
            JobSort::OutstandingBalance => job::Column::OutstandingBalance,
            JobSort::CreatedAt => job::Column::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilters {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<JobPriority>,
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    /// Inclusive bounds on `start_date`.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u64>,
}

impl JobFilters {
    fn sort(&self) -> Sort<JobSort> {
        Sort::resolve(self.sort_by.as_deref(), self.sort_direction)
    }

    pub fn select(&self) -> Select<job::Entity> {
        let search = search_condition(non_blank(&self.search), &[job::Column::Title, job::Column::Description]);
        let query = job::Entity::find()
            .apply_if(search, |q, c| q.filter(c))
            .apply_if(non_blank(&self.status), |q, s| q.filter(job::Column::Status.eq(s)))
            .apply_if(self.priority, |q, p| q.filter(job::Column::Priority.eq(p)))
            .apply_if(self.client_id, |q, id| q.filter(job::Column::ClientId.eq(id)))
            .apply_if(self.service_id, |q, id| q.filter(job::Column::ServiceId.eq(id)))
            .apply_if(date_range(job::Column::StartDate, self.date_from, self.date_to), |q, c| q.filter(c));
        self.sort().apply(query)
    }

    pub fn normalized(&self) -> Self {
        let sort = self.sort();
        Self {
            search: non_blank(&self.search).map(str::to_string),
            status: non_blank(&self.status).map(str::to_string),
            sort_by: Some(sort.key.name().to_string()),
            sort_direction: Some(sort.direction),
            page: Some(normalize_page(self.page)),
            ..self.clone()
        }
    }
}

/// Client and service names for a batch of jobs, fetched with one query each.
pub(crate) struct JobNames {
    clients: HashMap<Uuid, String>,
    services: HashMap<Uuid, String>,
}

impl JobNames {
    pub(crate) async fn load<C: ConnectionTrait>(db: &C, jobs: &[job::Model]) -> Result<Self, DbErr> {
        let client_ids: BTreeSet<Uuid> = jobs.iter().map(|j| j.client_id).collect();
        let service_ids: BTreeSet<Uuid> = jobs.iter().map(|j| j.service_id).collect();
        let clients = client_names(db, client_ids).await?;
        let services = if service_ids.is_empty() {
            HashMap::new()
        } else {
            catalog::Entity::find()
                .select_only()
                .column(catalog::Column::Id)
                .column(catalog::Column::Name)
                .filter(catalog::Column::Id.is_in(service_ids))
                .into_tuple::<(Uuid, String)>()
                .all(db)
                .await?
                .into_iter()
                .collect()
        };
        Ok(Self { clients, services })
    }

    pub(crate) fn row(&self, job: job::Model) -> JobRow {
        JobRow {
            client_name: self.clients.get(&job.client_id).cloned(),
            service_name: self.services.get(&job.service_id).cloned(),
            job,
        }
    }
}

pub(crate) async fn client_names<C: ConnectionTrait>(db: &C, ids: BTreeSet<Uuid>) -> Result<HashMap<Uuid, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = client::Entity::find()
        .select_only()
        .column(client::Column::Id)
        .column(client::Column::Name)
        .filter(client::Column::Id.is_in(ids))
        .into_tuple::<(Uuid, String)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, filters: &JobFilters) -> Result<Listing<JobRow, JobFilters>, ServiceError> {
    let mut filters = filters.normalized();
    let page = fetch_page(db, filters.select(), normalize_page(filters.page)).await?;
    filters.page = Some(page.current_page);
    let names = JobNames::load(db, &page.data).await?;
    Ok(Listing { items: page.map(|j| names.row(j)), filters })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<job::Model, ServiceError> {
    job::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("job"))
}

/// The job with its client, service and payments (latest first).
pub async fn detail(db: &DatabaseConnection, id: Uuid) -> Result<JobDetail, ServiceError> {
    let job = get(db, id).await?;
    let client = client::Entity::find_by_id(job.client_id).one(db).await?;
    let service = catalog::Entity::find_by_id(job.service_id).one(db).await?;
    let payments = payment::Entity::find()
        .filter(payment::Column::JobId.eq(id))
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(JobDetail { job, client, service, payments })
}

#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create(db: &DatabaseConnection, acting_user: Uuid, input: JobInput) -> Result<job::Model, ServiceError> {
    input.validate(db).await?;
    let now: DateTime<FixedOffset> = Utc::now().into();
    let balance = job::initial_balance(input.total_price, input.upfront);
    let am = job::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(input.client_id),
        service_id: Set(input.service_id),
        created_by: Set(acting_user),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description.clone()),
        start_date: Set(input.start_date),
        delivery_date: Set(input.delivery_date),
        status: Set(input.status()),
        priority: Set(input.priority),
        total_price: Set(input.total_price),
        upfront: Set(input.upfront),
        outstanding_balance: Set(balance),
        notes: Set(input.notes.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = am.insert(db).await?;
    info!(service = "jobs", event = "created", job_id = %created.id, balance = %created.outstanding_balance, created_by = %acting_user);
    Ok(created)
}

#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: JobInput) -> Result<job::Model, ServiceError> {
    let txn = db.begin().await?;
    let existing = job::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("job"))?;
    input.validate(&txn).await?;

    let terms_changed = existing.total_price != input.total_price || existing.upfront != input.upfront;
    let balance = if terms_changed {
        let payments = payment::Entity::find().filter(payment::Column::JobId.eq(id)).all(&txn).await?;
        let balance = reconciler::recompute(input.total_price, input.upfront, payments.iter().map(PaymentEffect::from));
        reconciler::ensure_storable(balance)?
    } else {
        existing.outstanding_balance
    };

    let status = input.status();
    let mut am: job::ActiveModel = existing.into();
    am.client_id = Set(input.client_id);
    am.service_id = Set(input.service_id);
    am.title = Set(input.title.trim().to_string());
    am.description = Set(input.description);
    am.start_date = Set(input.start_date);
    am.delivery_date = Set(input.delivery_date);
    am.status = Set(status);
    am.priority = Set(input.priority);
    am.total_price = Set(input.total_price);
    am.upfront = Set(input.upfront);
    am.outstanding_balance = Set(balance);
    am.notes = Set(input.notes);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    info!(service = "jobs", event = "updated", job_id = %id, recomputed = terms_changed, balance = %updated.outstanding_balance);
    Ok(updated)
}

/// Remove the job and its payments.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = job::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("job"));
    }
    info!(service = "jobs", event = "deleted", job_id = %id);
    Ok(())
}

/// Dropdown sources for the job create/edit form.
pub async fn form_options(db: &DatabaseConnection) -> Result<JobFormOptions, ServiceError> {
    let clients = client::Entity::find()
        .select_only()
        .column(client::Column::Id)
        .column(client::Column::Name)
        .order_by_asc(client::Column::Name)
        .into_tuple::<(Uuid, String)>()
        .all(db)
        .await?;
    let services = catalog::Entity::find()
        .select_only()
        .column(catalog::Column::Id)
        .column(catalog::Column::Name)
        .order_by_asc(catalog::Column::Name)
        .into_tuple::<(Uuid, String)>()
        .all(db)
        .await?;
    let statuses = job_status::Entity::find().order_by_asc(job_status::Column::Id).all(db).await?;
    Ok(JobFormOptions {
        clients: clients.into_iter().map(|(id, name)| Choice { id, name }).collect(),
        services: services.into_iter().map(|(id, name)| Choice { id, name }).collect(),
        statuses,
    })
}
