use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use models::catalog;
use service::catalog::{self as services, ServiceFilters, ServiceInput};
use service::query::Listing;
use service::views::ServiceDetail;
use uuid::Uuid;

use crate::{auth::ActingUser, errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(
    get, path = "/services", tag = "services",
    params(
        ("search" = Option<String>, Query, description = "Matches name or description"),
        ("category" = Option<String>, Query,),
        ("status" = Option<String>, Query, description = "active | inactive"),
        ("sort_by" = Option<String>, Query, description = "name | price | category | created_at"),
        ("sort_direction" = Option<String>, Query, description = "asc | desc"),
        ("page" = Option<u64>, Query,),
    ),
    responses((status = 200, description = "List OK"))
)]
pub async fn list(State(state): State<ServerState>, Query(filters): Query<ServiceFilters>) -> Result<Json<Listing<catalog::Model, ServiceFilters>>, JsonApiError> {
    Ok(Json(services::list(&state.db, &filters).await?))
}

#[utoipa::path(
    post, path = "/services", tag = "services",
    request_body = crate::openapi::ServiceInputDoc,
    responses((status = 201, description = "Created"), (status = 422, description = "Validation Error"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ActingUser(user)): Extension<ActingUser>,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<catalog::Model>), JsonApiError> {
    let created = services::create(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/services/{id}", tag = "services",
    params(("id" = Uuid, Path, description = "Service id")),
    responses((status = 200, description = "Service with its jobs"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<ServiceDetail>, JsonApiError> {
    Ok(Json(services::detail(&state.db, id).await?))
}

#[utoipa::path(
    put, path = "/services/{id}", tag = "services",
    params(("id" = Uuid, Path, description = "Service id")),
    request_body = crate::openapi::ServiceInputDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 422, description = "Validation Error"))
)]
pub async fn update(State(state): State<ServerState>, Path(id): Path<Uuid>, Json(input): Json<ServiceInput>) -> Result<Json<catalog::Model>, JsonApiError> {
    Ok(Json(services::update(&state.db, id, input).await?))
}

#[utoipa::path(
    delete, path = "/services/{id}", tag = "services",
    params(("id" = Uuid, Path, description = "Service id")),
    responses((status = 204, description = "Deleted with its jobs"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    services::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
