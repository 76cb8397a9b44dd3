use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use models::payment;
use service::payments::{self, PaymentFilters, PaymentInput};
use service::query::Listing;
use service::views::{PaymentDetail, PaymentFormOptions, PaymentRow};
use tracing::info;
use uuid::Uuid;

use crate::{auth::ActingUser, errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(
    get, path = "/payments", tag = "payments",
    params(
        ("search" = Option<String>, Query, description = "Matches reference or notes"),
        ("status" = Option<String>, Query, description = "completed | pending | cancelled | refunded"),
        ("method" = Option<String>, Query, description = "cash | card | transfer | deposit | other"),
        ("payment_type" = Option<String>, Query, description = "advance | partial | full | refund"),
        ("job_id" = Option<Uuid>, Query,),
        ("date_from" = Option<String>, Query, description = "Inclusive lower bound on payment_date (YYYY-MM-DD)"),
        ("date_to" = Option<String>, Query, description = "Inclusive upper bound on payment_date (YYYY-MM-DD)"),
        ("sort_by" = Option<String>, Query, description = "payment_date | amount | created_at"),
        ("sort_direction" = Option<String>, Query, description = "asc | desc"),
        ("page" = Option<u64>, Query,),
    ),
    responses((status = 200, description = "List OK, rows carry job title and client name"))
)]
pub async fn list(State(state): State<ServerState>, Query(filters): Query<PaymentFilters>) -> Result<Json<Listing<PaymentRow, PaymentFilters>>, JsonApiError> {
    Ok(Json(payments::list(&state.db, &filters).await?))
}

#[utoipa::path(
    get, path = "/payments/form-options", tag = "payments",
    responses((status = 200, description = "Jobs with client name and outstanding balance"))
)]
pub async fn form_options(State(state): State<ServerState>) -> Result<Json<PaymentFormOptions>, JsonApiError> {
    Ok(Json(payments::form_options(&state.db).await?))
}

#[utoipa::path(
    post, path = "/payments", tag = "payments",
    request_body = crate::openapi::PaymentInputDoc,
    responses(
        (status = 201, description = "Recorded; the job balance is adjusted in the same transaction"),
        (status = 409, description = "Job already settled, or a concurrent update"),
        (status = 422, description = "Validation Error")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ActingUser(user)): Extension<ActingUser>,
    Json(input): Json<PaymentInput>,
) -> Result<(StatusCode, Json<payment::Model>), JsonApiError> {
    info!(job_id = %input.job_id, amount = %input.amount, recorded_by = %user.id, "payment_create_request");
    let created = payments::create(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/payments/{id}", tag = "payments",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses((status = 200, description = "Payment with job and client"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<PaymentDetail>, JsonApiError> {
    Ok(Json(payments::detail(&state.db, id).await?))
}

#[utoipa::path(
    put, path = "/payments/{id}", tag = "payments",
    params(("id" = Uuid, Path, description = "Payment id")),
    request_body = crate::openapi::PaymentInputDoc,
    responses(
        (status = 200, description = "Updated; the old effect is reversed and the new one applied"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Job already settled, or a concurrent update"),
        (status = 422, description = "Validation Error")
    )
)]
pub async fn update(State(state): State<ServerState>, Path(id): Path<Uuid>, Json(input): Json<PaymentInput>) -> Result<Json<payment::Model>, JsonApiError> {
    Ok(Json(payments::update(&state.db, id, input).await?))
}

#[utoipa::path(
    delete, path = "/payments/{id}", tag = "payments",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses((status = 204, description = "Deleted; its effect on the job balance is reversed"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    payments::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
