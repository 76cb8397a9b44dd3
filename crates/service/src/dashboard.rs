//! Summary figures for the landing screen. Computed on every request.
//!
//! Counts and revenue are aggregated in SQL; only the recent rows are loaded.
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use models::enums::{PaymentStatus, PaymentType};
use models::{catalog, client, job, job_status, payment};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Iterable, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Select,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::jobs::JobNames;
use crate::payments::PaymentNames;
use crate::views::{JobRow, PaymentRow};

const RECENT: u64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub clients: u64,
    pub services: u64,
    pub jobs: u64,
    pub payments: u64,
}

/// Net takings from completed payments; refunds subtract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Revenue {
    pub total: Decimal,
    pub this_month: Decimal,
    pub today: Decimal,
    pub by_method: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub totals: Totals,
    pub jobs_by_status: BTreeMap<String, u64>,
    pub payments_by_status: BTreeMap<String, u64>,
    pub revenue: Revenue,
    pub recent_jobs: Vec<JobRow>,
    pub recent_payments: Vec<PaymentRow>,
}

/// Stored job status for a lookup name: "In progress" is kept as `in_progress`.
pub fn status_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Every key in `keys` appears in the result, at zero when nothing was counted.
pub fn with_zeros<I>(keys: I, counts: BTreeMap<String, u64>) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = String>,
{
    let mut all: BTreeMap<String, u64> = keys.into_iter().map(|k| (k, 0)).collect();
    all.extend(counts);
    all
}

/// First day of `today`'s month and, when representable, of the next one.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, Option<NaiveDate>) {
    let start = today.with_day(1).unwrap_or(today);
    (start, start.checked_add_months(Months::new(1)))
}

/// `amount`, negated for refunds.
fn signed_amount() -> SimpleExpr {
    Expr::case(
        payment::Column::PaymentType.eq(PaymentType::Refund),
        Expr::col(payment::Column::Amount).mul(-1),
    )
    .finally(Expr::col(payment::Column::Amount))
    .into()
}

async fn net_total(db: &DatabaseConnection, select: Select<payment::Entity>) -> Result<Decimal, DbErr> {
    let total = select
        .select_only()
        .column_as(SimpleExpr::from(Func::sum(signed_amount())), "net")
        .into_tuple::<Option<Decimal>>()
        .one(db)
        .await?;
    Ok(total.flatten().unwrap_or_default())
}

/// Revenue over the completed payments `scope` selects, relative to `today`.
pub async fn revenue(db: &DatabaseConnection, scope: Select<payment::Entity>, today: NaiveDate) -> Result<Revenue, DbErr> {
    let completed = scope.filter(payment::Column::Status.eq(PaymentStatus::Completed));
    let (month_start, next_month) = month_bounds(today);

    let total = net_total(db, completed.clone()).await?;
    let this_month = net_total(
        db,
        completed
            .clone()
            .filter(payment::Column::PaymentDate.gte(month_start))
            .apply_if(next_month, |q, end| q.filter(payment::Column::PaymentDate.lt(end))),
    )
    .await?;
    let today_total = net_total(db, completed.clone().filter(payment::Column::PaymentDate.eq(today))).await?;

    let by_method = completed
        .select_only()
        .column(payment::Column::Method)
        .column_as(SimpleExpr::from(Func::sum(signed_amount())), "net")
        .group_by(payment::Column::Method)
        .into_tuple::<(String, Option<Decimal>)>()
        .all(db)
        .await?
        .into_iter()
        .map(|(method, net)| (method, net.unwrap_or_default()))
        .collect();

    Ok(Revenue { total, this_month, today: today_total, by_method })
}

async fn count_by<E>(db: &DatabaseConnection, select: Select<E>, column: E::Column) -> Result<BTreeMap<String, u64>, DbErr>
where
    E: EntityTrait,
{
    let rows = select
        .select_only()
        .column(column)
        .column_as(Expr::col(column).count(), "count")
        .group_by(column)
        .into_tuple::<(String, i64)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(k, n)| (k, n.max(0) as u64)).collect())
}

/// Aggregate the dashboard as of `now`.
#[instrument(skip(db))]
pub async fn summary(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<Dashboard, ServiceError> {
    let totals = Totals {
        clients: client::Entity::find().count(db).await?,
        services: catalog::Entity::find().count(db).await?,
        jobs: job::Entity::find().count(db).await?,
        payments: payment::Entity::find().count(db).await?,
    };

    let job_statuses = job_status::Entity::find().all(db).await?;
    let jobs_by_status = with_zeros(
        job_statuses.iter().map(|s| status_key(&s.name)).chain([job::DEFAULT_STATUS.to_string()]),
        count_by(db, job::Entity::find(), job::Column::Status).await?,
    );
    let payments_by_status = with_zeros(
        PaymentStatus::iter().map(|s| s.to_value()),
        count_by(db, payment::Entity::find(), payment::Column::Status).await?,
    );

    let revenue = revenue(db, payment::Entity::find(), now.date_naive()).await?;

    let recent_jobs = job::Entity::find().order_by_desc(job::Column::CreatedAt).limit(RECENT).all(db).await?;
    let job_names = JobNames::load(db, &recent_jobs).await?;
    let recent_payments = payment::Entity::find()
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::CreatedAt)
        .limit(RECENT)
        .all(db)
        .await?;
    let payment_names = PaymentNames::load(db, &recent_payments).await?;

    debug!(service = "dashboard", event = "computed", jobs = totals.jobs, payments = totals.payments);
    Ok(Dashboard {
        totals,
        jobs_by_status,
        payments_by_status,
        revenue,
        recent_jobs: recent_jobs.into_iter().map(|j| job_names.row(j)).collect(),
        recent_payments: recent_payments.into_iter().map(|p| payment_names.row(p)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::tests::payment_input;
    use crate::payments::PaymentInput;
    use models::enums::PaymentMethod;
    use rust_decimal_macros::dec;
    use sea_orm::DbBackend;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    #[test]
    fn lookup_names_map_to_stored_statuses() {
        assert_eq!(status_key("In progress"), "in_progress");
        assert_eq!(status_key(" Pending "), "pending");
    }

    #[test]
    fn statuses_without_rows_count_as_zero() {
        let counted = BTreeMap::from([("pending".to_string(), 3), ("on_hold".to_string(), 1)]);
        let all = with_zeros(["pending", "completed", "cancelled"].map(String::from), counted);
        assert_eq!(all.get("pending"), Some(&3));
        assert_eq!(all.get("completed"), Some(&0));
        assert_eq!(all.get("cancelled"), Some(&0));
        assert_eq!(all.get("on_hold"), Some(&1));
    }

    #[test]
    fn month_bounds_roll_over_the_year() {
        assert_eq!(month_bounds(d(2025, 8, 15)), (d(2025, 8, 1), Some(d(2025, 9, 1))));
        assert_eq!(month_bounds(d(2025, 12, 31)), (d(2025, 12, 1), Some(d(2026, 1, 1))));
    }

    #[test]
    fn net_sum_is_computed_by_the_database() {
        let s = payment::Entity::find()
            .select_only()
            .column(payment::Column::Method)
            .column_as(SimpleExpr::from(Func::sum(signed_amount())), "net")
            .group_by(payment::Column::Method)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(s.contains("SUM("), "{s}");
        assert!(s.contains("CASE WHEN"), "{s}");
        assert!(s.contains("'refund'"), "{s}");
        assert!(s.contains(r#"GROUP BY "payments"."method""#), "{s}");
    }

    #[tokio::test]
    async fn revenue_nets_refunds_and_skips_non_completed() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let user = crate::test_support::acting_user(&db).await;
        let c = crate::clients::create(
            &db,
            user,
            crate::clients::ClientInput { name: "Rev Client".into(), email: "rev@studio.pe".into(), ..Default::default() },
        )
        .await
        .unwrap();
        let s = crate::catalog::create(
            &db,
            user,
            crate::catalog::ServiceInput { name: "Rev Session".into(), price: dec!(5000.00), ..Default::default() },
        )
        .await
        .unwrap();
        let job = crate::jobs::create(
            &db,
            user,
            crate::jobs::JobInput {
                client_id: c.id,
                service_id: s.id,
                title: "Revenue".into(),
                description: String::new(),
                start_date: d(2024, 8, 1),
                delivery_date: d(2025, 9, 1),
                status: None,
                priority: Default::default(),
                total_price: dec!(5000.00),
                upfront: dec!(0),
                notes: None,
            },
        )
        .await
        .unwrap();

        let today = d(2025, 8, 15);
        for (amount, date, method, payment_type, status) in [
            (dec!(400.00), today, PaymentMethod::Cash, PaymentType::Advance, PaymentStatus::Completed),
            (dec!(250.00), d(2025, 8, 2), PaymentMethod::Transfer, PaymentType::Partial, PaymentStatus::Completed),
            (dec!(100.00), d(2025, 7, 30), PaymentMethod::Cash, PaymentType::Full, PaymentStatus::Completed),
            (dec!(50.00), today, PaymentMethod::Cash, PaymentType::Refund, PaymentStatus::Completed),
            (dec!(999.00), today, PaymentMethod::Card, PaymentType::Full, PaymentStatus::Pending),
            (dec!(10.00), d(2024, 8, 15), PaymentMethod::Card, PaymentType::Partial, PaymentStatus::Completed),
        ] {
            let input = PaymentInput { payment_date: date, method, payment_type, status, ..payment_input(job.id, amount) };
            crate::payments::create(&db, user, input).await.unwrap();
        }

        let scope = payment::Entity::find().filter(payment::Column::JobId.eq(job.id));
        let r = revenue(&db, scope, today).await.unwrap();
        assert_eq!(r.total, dec!(710.00));
        assert_eq!(r.this_month, dec!(600.00));
        assert_eq!(r.today, dec!(350.00));
        assert_eq!(r.by_method.get("cash"), Some(&dec!(450.00)));
        assert_eq!(r.by_method.get("transfer"), Some(&dec!(250.00)));
        assert_eq!(r.by_method.get("card"), Some(&dec!(10.00)));

        let none = payment::Entity::find().filter(payment::Column::JobId.eq(Uuid::new_v4()));
        assert_eq!(revenue(&db, none, today).await.unwrap(), Revenue::default());

        crate::clients::delete(&db, c.id).await.unwrap();
        crate::catalog::delete(&db, s.id).await.unwrap();
        models::user::hard_delete(&db, user).await.unwrap();
    }

    #[tokio::test]
    async fn summary_reflects_new_records() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let user = crate::test_support::acting_user(&db).await;
        let before = summary(&db, Utc::now()).await.unwrap();

        let c = crate::clients::create(
            &db,
            user,
            crate::clients::ClientInput { name: "Dash Client".into(), email: "dash@studio.pe".into(), ..Default::default() },
        )
        .await
        .unwrap();
        let after = summary(&db, Utc::now()).await.unwrap();
        assert!(after.totals.clients >= before.totals.clients + 1);
        assert!(after.recent_jobs.len() <= 5);
        assert!(after.recent_payments.len() <= 5);
        for status in ["pending", "in_progress", "completed", "cancelled"] {
            assert!(after.jobs_by_status.contains_key(status), "missing job status {status}");
        }
        for status in PaymentStatus::iter() {
            assert!(after.payments_by_status.contains_key(&status.to_value()), "missing payment status {status:?}");
        }

        crate::clients::delete(&db, c.id).await.unwrap();
        models::user::hard_delete(&db, user).await.unwrap();
    }
}
