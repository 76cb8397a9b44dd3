use std::{env, net::SocketAddr};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth};

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_from_env();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr(cfg: Option<&AppConfig>) -> anyhow::Result<SocketAddr> {
    let (host, port) = match cfg {
        Some(cfg) => (cfg.server.host.clone(), cfg.server.port),
        None => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8081);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

/// JWT settings from config, else `JWT_SECRET` / `TOKEN_TTL_HOURS`.
fn load_auth(cfg: Option<&AppConfig>) -> Result<auth::ServerAuthConfig, StartupError> {
    let (jwt_secret, token_ttl_hours) = match cfg {
        Some(cfg) => (cfg.auth.jwt_secret.clone(), cfg.auth.token_ttl_hours),
        None => {
            let secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            });
            let ttl = env::var("TOKEN_TTL_HOURS").ok().and_then(|v| v.parse().ok()).unwrap_or(12);
            (secret, ttl)
        }
    };
    if jwt_secret.trim().is_empty() {
        return Err(StartupError::InvalidConfig("jwt_secret must not be empty".into()));
    }
    if token_ttl_hours <= 0 {
        return Err(StartupError::InvalidConfig("token_ttl_hours must be positive".into()));
    }
    Ok(auth::ServerAuthConfig { jwt_secret, token_ttl_hours })
}

/// Build the application router over an existing connection.
pub fn app(state: auth::ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            info!(error = %e, "config.toml unavailable, using environment");
            None
        }
    };

    // DB connection + schema
    let db = models::db::connect().await?;
    models::db::test_connection(&db).await?;
    migration::Migrator::up(&db, None).await?;

    let state = auth::ServerState { db, auth: load_auth(cfg.as_ref())? };
    let app = app(state);

    // Bind and serve
    let addr = load_bind_addr(cfg.as_ref())?;
    info!(%addr, "starting studio admin api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server drained in-flight requests");
    Ok(())
}

/// Resolves on Ctrl+C; in-flight transactions finish before the listener closes.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
