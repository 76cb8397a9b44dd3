use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use models::client;
use service::clients::{self, ClientFilters, ClientInput};
use service::query::Listing;
use service::views::ClientDetail;
use uuid::Uuid;

use crate::{auth::ActingUser, errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(
    get, path = "/clients", tag = "clients",
    params(
        ("search" = Option<String>, Query, description = "Matches name, email or phone"),
        ("status" = Option<String>, Query, description = "active | inactive"),
        ("sort_by" = Option<String>, Query, description = "name | email | registered_at | created_at"),
        ("sort_direction" = Option<String>, Query, description = "asc | desc"),
        ("page" = Option<u64>, Query, description = "1-based page, 10 rows each"),
    ),
    responses((status = 200, description = "List OK"))
)]
pub async fn list(State(state): State<ServerState>, Query(filters): Query<ClientFilters>) -> Result<Json<Listing<client::Model, ClientFilters>>, JsonApiError> {
    Ok(Json(clients::list(&state.db, &filters).await?))
}

#[utoipa::path(
    post, path = "/clients", tag = "clients",
    request_body = crate::openapi::ClientInputDoc,
    responses((status = 201, description = "Created"), (status = 422, description = "Validation Error"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ActingUser(user)): Extension<ActingUser>,
    Json(input): Json<ClientInput>,
) -> Result<(StatusCode, Json<client::Model>), JsonApiError> {
    let created = clients::create(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/clients/{id}", tag = "clients",
    params(("id" = Uuid, Path, description = "Client id")),
    responses((status = 200, description = "Client with its jobs"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<ClientDetail>, JsonApiError> {
    Ok(Json(clients::detail(&state.db, id).await?))
}

#[utoipa::path(
    put, path = "/clients/{id}", tag = "clients",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = crate::openapi::ClientInputDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 422, description = "Validation Error"))
)]
pub async fn update(State(state): State<ServerState>, Path(id): Path<Uuid>, Json(input): Json<ClientInput>) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(clients::update(&state.db, id, input).await?))
}

#[utoipa::path(
    delete, path = "/clients/{id}", tag = "clients",
    params(("id" = Uuid, Path, description = "Client id")),
    responses((status = 204, description = "Deleted with its jobs and payments"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    clients::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
