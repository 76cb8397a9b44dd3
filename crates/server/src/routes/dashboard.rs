use axum::{extract::State, Json};
use chrono::Utc;
use service::dashboard::{self, Dashboard};
use service::lookups;
use service::views::Lookups;

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(get, path = "/dashboard", tag = "dashboard", responses((status = 200, description = "Totals, status breakdowns, revenue and recent activity")))]
pub async fn summary(State(state): State<ServerState>) -> Result<Json<Dashboard>, JsonApiError> {
    Ok(Json(dashboard::summary(&state.db, Utc::now()).await?))
}

#[utoipa::path(get, path = "/lookups", tag = "dashboard", responses((status = 200, description = "Roles, job statuses and payment statuses")))]
pub async fn all_lookups(State(state): State<ServerState>) -> Result<Json<Lookups>, JsonApiError> {
    Ok(Json(lookups::all(&state.db).await?))
}
