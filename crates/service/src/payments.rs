//! Payments and the transactional side of balance reconciliation.
//!
//! Every write here runs in one transaction: the affected job rows are read with
//! `SELECT ... FOR UPDATE`, the new balance comes from [`crate::reconciler`], and
//! the payment row plus the balance commit together. Any error drops the
//! transaction, which rolls it back.
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use models::enums::{PaymentMethod, PaymentStatus, PaymentType};
use models::{client, job, payment, validate};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{FieldErrors, ServiceError};
use crate::jobs::client_names;
use crate::pagination::{fetch_page, normalize_page};
use crate::query::{date_range, non_blank, search_condition, Listing, Sort, SortDirection, SortKey};
use crate::reconciler::{self, PaymentEffect};
use crate::views::{JobChoice, PaymentDetail, PaymentFormOptions, PaymentRow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub job_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentInput {
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        // Checked as stored: the column keeps two decimal places.
        let amount = self.amount.round_dp(2);
        errors.check(validate::positive("amount", amount));
        errors.check(validate::money("amount", amount));
        errors.check(validate::optional_max_len("reference", self.reference.as_deref(), 255));
        errors
    }

    pub fn effect(&self) -> PaymentEffect {
        PaymentEffect::new(self.amount.round_dp(2), self.payment_type, self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentSort {
    PaymentDate,
    Amount,
    CreatedAt,
}

impl SortKey for PaymentSort {
    type Entity = payment::Entity;

    const KEYS: &'static [(&'static str, Self)] = &[
        ("payment_date", PaymentSort::PaymentDate),
        ("amount", PaymentSort::Amount),
        ("created_at", PaymentSort::CreatedAt),
    ];
    const DEFAULT: Self = PaymentSort::PaymentDate;

    fn column(self) -> payment::Column {
        match self {
            PaymentSort::PaymentDate => payment::Column::PaymentDate,
            PaymentSort::Amount => payment::Column::Amount,
            PaymentSort::CreatedAt => payment::Column::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentFilters {
    pub search: Option<String>,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub payment_type: Option<PaymentType>,
    pub job_id: Option<Uuid>,
    /// Inclusive bounds on `payment_date`.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u64>,
}

impl PaymentFilters {
    fn sort(&self) -> Sort<PaymentSort> {
        Sort::resolve(self.sort_by.as_deref(), self.sort_direction)
    }

    pub fn select(&self) -> Select<payment::Entity> {
        let search = search_condition(non_blank(&self.search), &[payment::Column::Reference, payment::Column::Notes]);
        let query = payment::Entity::find()
            .apply_if(search, |q, c| q.filter(c))
            .apply_if(self.status, |q, s| q.filter(payment::Column::Status.eq(s)))
            .apply_if(self.method, |q, m| q.filter(payment::Column::Method.eq(m)))
            .apply_if(self.payment_type, |q, t| q.filter(payment::Column::PaymentType.eq(t)))
            .apply_if(self.job_id, |q, id| q.filter(payment::Column::JobId.eq(id)))
            .apply_if(date_range(payment::Column::PaymentDate, self.date_from, self.date_to), |q, c| q.filter(c));
        self.sort().apply(query)
    }

    pub fn normalized(&self) -> Self {
        let sort = self.sort();
        Self {
            search: non_blank(&self.search).map(str::to_string),
            sort_by: Some(sort.key.name().to_string()),
            sort_direction: Some(sort.direction),
            page: Some(normalize_page(self.page)),
            ..self.clone()
        }
    }
}

/// Job titles and client names for a batch of payments.
pub(crate) struct PaymentNames {
    jobs: HashMap<Uuid, (String, Uuid)>,
    clients: HashMap<Uuid, String>,
}

impl PaymentNames {
    pub(crate) async fn load<C: ConnectionTrait>(db: &C, payments: &[payment::Model]) -> Result<Self, DbErr> {
        let job_ids: BTreeSet<Uuid> = payments.iter().map(|p| p.job_id).collect();
        let jobs: HashMap<Uuid, (String, Uuid)> = if job_ids.is_empty() {
            HashMap::new()
        } else {
            job::Entity::find()
                .select_only()
                .column(job::Column::Id)
                .column(job::Column::Title)
                .column(job::Column::ClientId)
                .filter(job::Column::Id.is_in(job_ids))
                .into_tuple::<(Uuid, String, Uuid)>()
                .all(db)
                .await?
                .into_iter()
                .map(|(id, title, client_id)| (id, (title, client_id)))
                .collect()
        };
        let clients = client_names(db, jobs.values().map(|(_, c)| *c).collect()).await?;
        Ok(Self { jobs, clients })
    }

    pub(crate) fn row(&self, payment: payment::Model) -> PaymentRow {
        let job = self.jobs.get(&payment.job_id);
        PaymentRow {
            job_title: job.map(|(title, _)| title.clone()),
            client_name: job.and_then(|(_, client_id)| self.clients.get(client_id).cloned()),
            payment,
        }
    }
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, filters: &PaymentFilters) -> Result<Listing<PaymentRow, PaymentFilters>, ServiceError> {
    let mut filters = filters.normalized();
    let page = fetch_page(db, filters.select(), normalize_page(filters.page)).await?;
    filters.page = Some(page.current_page);
    let names = PaymentNames::load(db, &page.data).await?;
    Ok(Listing { items: page.map(|p| names.row(p)), filters })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<payment::Model, ServiceError> {
    payment::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("payment"))
}

pub async fn detail(db: &DatabaseConnection, id: Uuid) -> Result<PaymentDetail, ServiceError> {
    let payment = get(db, id).await?;
    let job = job::Entity::find_by_id(payment.job_id).one(db).await?;
    let client = match &job {
        Some(j) => client::Entity::find_by_id(j.client_id).one(db).await?,
        None => None,
    };
    Ok(PaymentDetail { payment, job, client })
}

/// Jobs a payment can be recorded against, newest first.
pub async fn form_options(db: &DatabaseConnection) -> Result<PaymentFormOptions, ServiceError> {
    let jobs = job::Entity::find().order_by_desc(job::Column::CreatedAt).all(db).await?;
    let clients = client_names(db, jobs.iter().map(|j| j.client_id).collect()).await?;
    let jobs = jobs
        .into_iter()
        .map(|j| JobChoice {
            client_name: clients.get(&j.client_id).cloned(),
            id: j.id,
            title: j.title,
            outstanding_balance: j.outstanding_balance,
        })
        .collect();
    Ok(PaymentFormOptions { jobs })
}

async fn lock_job(txn: &DatabaseTransaction, id: Uuid) -> Result<Option<job::Model>, DbErr> {
    job::Entity::find_by_id(id).lock_exclusive().one(txn).await
}

async fn store_balance(txn: &DatabaseTransaction, job: job::Model, balance: Decimal) -> Result<(), ServiceError> {
    if job.outstanding_balance == balance {
        return Ok(());
    }
    let balance = reconciler::ensure_storable(balance)?;
    let mut am: job::ActiveModel = job.into();
    am.outstanding_balance = Set(balance);
    am.updated_at = Set(Utc::now().into());
    am.update(txn).await?;
    Ok(())
}

fn unknown_job() -> ServiceError { ServiceError::field("job_id", "does not exist") }

/// Record a payment and apply it to its job's balance.
///
/// A non-refund payment against a job that owes nothing fails with
/// [`ServiceError::JobAlreadySettled`] and writes nothing.
#[instrument(skip(db, input), fields(job_id = %input.job_id, amount = %input.amount))]
pub async fn create(db: &DatabaseConnection, acting_user: Uuid, input: PaymentInput) -> Result<payment::Model, ServiceError> {
    input.field_errors().into_result()?;
    let txn = db.begin().await?;
    let job = lock_job(&txn, input.job_id).await?.ok_or_else(unknown_job)?;
    let balance = reconciler::on_create(job.id, job.outstanding_balance, input.effect()).map_err(|e| {
        warn!(service = "payments", event = "rejected", job_id = %job.id, error = %e);
        e
    })?;

    let now: DateTime<FixedOffset> = Utc::now().into();
    let am = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        job_id: Set(input.job_id),
        recorded_by: Set(acting_user),
        amount: Set(input.amount.round_dp(2)),
        payment_date: Set(input.payment_date),
        method: Set(input.method),
        reference: Set(input.reference),
        status: Set(input.status),
        payment_type: Set(input.payment_type),
        notes: Set(input.notes),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = am.insert(&txn).await?;
    let before = job.outstanding_balance;
    store_balance(&txn, job, balance).await?;
    txn.commit().await?;
    info!(service = "payments", event = "created", payment_id = %created.id, job_id = %created.job_id, %before, after = %balance);
    Ok(created)
}

/// Edit a payment, reversing its old effect and applying the new one.
///
/// Moving a payment to another job reverses it on the old job and applies it on
/// the new one; both job rows are locked in id order.
#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: PaymentInput) -> Result<payment::Model, ServiceError> {
    input.field_errors().into_result()?;
    let txn = db.begin().await?;
    let existing = payment::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("payment"))?;
    let old = PaymentEffect::from(&existing);
    let new = input.effect();

    if existing.job_id == input.job_id {
        let job = lock_job(&txn, existing.job_id).await?.ok_or_else(|| ServiceError::not_found("job"))?;
        let balance = reconciler::on_update(job.id, job.outstanding_balance, old, new)?;
        store_balance(&txn, job, balance).await?;
    } else {
        let mut locked = job::Entity::find()
            .filter(job::Column::Id.is_in([existing.job_id, input.job_id]))
            .order_by_asc(job::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;
        let new_pos = locked.iter().position(|j| j.id == input.job_id).ok_or_else(unknown_job)?;
        let new_job = locked.remove(new_pos);
        let old_job = locked.pop().ok_or_else(|| ServiceError::not_found("job"))?;

        let old_balance = reconciler::on_delete(old_job.outstanding_balance, old);
        let new_balance = reconciler::apply_if_effective(new_job.id, new_job.outstanding_balance, new)?;
        store_balance(&txn, old_job, old_balance).await?;
        store_balance(&txn, new_job, new_balance).await?;
    }

    let mut am: payment::ActiveModel = existing.into();
    am.job_id = Set(input.job_id);
    am.amount = Set(input.amount.round_dp(2));
    am.payment_date = Set(input.payment_date);
    am.method = Set(input.method);
    am.reference = Set(input.reference);
    am.status = Set(input.status);
    am.payment_type = Set(input.payment_type);
    am.notes = Set(input.notes);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    info!(service = "payments", event = "updated", payment_id = %id, job_id = %updated.job_id, status = ?updated.status);
    Ok(updated)
}

/// Delete a payment, giving back its effect on the job first.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let existing = payment::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("payment"))?;
    let job = lock_job(&txn, existing.job_id).await?.ok_or_else(|| ServiceError::not_found("job"))?;
    let balance = reconciler::on_delete(job.outstanding_balance, PaymentEffect::from(&existing));
    payment::Entity::delete_by_id(id).exec(&txn).await?;
    store_balance(&txn, job, balance).await?;
    txn.commit().await?;
    info!(service = "payments", event = "deleted", payment_id = %id, job_id = %existing.job_id, after = %balance);
    Ok(())
}
