pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod jobs;
pub mod payments;
pub mod services;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public, authenticated and docs routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    // Public routes (health + auth)
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    // Routes that need an acting user
    let api = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/dashboard", get(dashboard::summary))
        .route("/lookups", get(dashboard::all_lookups))
        .route("/clients", get(clients::list).post(clients::create))
        .route("/clients/:id", get(clients::get).put(clients::update).delete(clients::delete))
        .route("/services", get(services::list).post(services::create))
        .route("/services/:id", get(services::get).put(services::update).delete(services::delete))
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route("/jobs/form-options", get(jobs::form_options))
        .route("/jobs/:id", get(jobs::get).put(jobs::update).delete(jobs::delete))
        .route("/payments", get(payments::list).post(payments::create))
        .route("/payments/form-options", get(payments::form_options))
        .route("/payments/:id", get(payments::get).put(payments::update).delete(payments::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), crate::auth::require_acting_user));

    let docs = SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi());

    // Compose
    public
        .merge(api)
        .merge(docs)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                // 请求到达时打点
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
