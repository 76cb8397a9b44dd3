use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use models::job;
use service::jobs::{self, JobFilters, JobInput};
use service::query::Listing;
use service::views::{JobDetail, JobFormOptions, JobRow};
use uuid::Uuid;

use crate::{auth::ActingUser, errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(
    get, path = "/jobs", tag = "jobs",
    params(
        ("search" = Option<String>, Query, description = "Matches title or description"),
        ("status" = Option<String>, Query, description = "Job status name, e.g. pending"),
        ("priority" = Option<String>, Query, description = "low | medium | high | urgent"),
        ("client_id" = Option<Uuid>, Query,),
        ("service_id" = Option<Uuid>, Query,),
        ("date_from" = Option<String>, Query, description = "Inclusive lower bound on start_date (YYYY-MM-DD)"),
        ("date_to" = Option<String>, Query, description = "Inclusive upper bound on start_date (YYYY-MM-DD)"),
        ("sort_by" = Option<String>, Query, description = "title | start_date | delivery_date | total_price | outstanding_balance | created_at"),
        ("sort_direction" = Option<String>, Query, description = "asc | desc"),
        ("page" = Option<u64>, Query,),
    ),
    responses((status = 200, description = "List OK, rows carry client and service names"))
)]
pub async fn list(State(state): State<ServerState>, Query(filters): Query<JobFilters>) -> Result<Json<Listing<JobRow, JobFilters>>, JsonApiError> {
    Ok(Json(jobs::list(&state.db, &filters).await?))
}

#[utoipa::path(
    get, path = "/jobs/form-options", tag = "jobs",
    responses((status = 200, description = "Clients, services and job statuses for the job form"))
)]
pub async fn form_options(State(state): State<ServerState>) -> Result<Json<JobFormOptions>, JsonApiError> {
    Ok(Json(jobs::form_options(&state.db).await?))
}

#[utoipa::path(
    post, path = "/jobs", tag = "jobs",
    request_body = crate::openapi::JobInputDoc,
    responses((status = 201, description = "Created with outstanding_balance = total_price - upfront"), (status = 422, description = "Validation Error"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ActingUser(user)): Extension<ActingUser>,
    Json(input): Json<JobInput>,
) -> Result<(StatusCode, Json<job::Model>), JsonApiError> {
    let created = jobs::create(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/jobs/{id}", tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses((status = 200, description = "Job with client, service and payments"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<JobDetail>, JsonApiError> {
    Ok(Json(jobs::detail(&state.db, id).await?))
}

#[utoipa::path(
    put, path = "/jobs/{id}", tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    request_body = crate::openapi::JobInputDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Concurrency Conflict"), (status = 422, description = "Validation Error"))
)]
pub async fn update(State(state): State<ServerState>, Path(id): Path<Uuid>, Json(input): Json<JobInput>) -> Result<Json<job::Model>, JsonApiError> {
    Ok(Json(jobs::update(&state.db, id, input).await?))
}

#[utoipa::path(
    delete, path = "/jobs/{id}", tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses((status = 204, description = "Deleted with its payments"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    jobs::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
