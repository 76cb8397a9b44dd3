use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use service::auth::domain::AuthUser;

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, AUTH_COOKIE};

/// The operator behind the current request, inserted by [`require_acting_user`].
#[derive(Debug, Clone)]
pub struct ActingUser(pub AuthUser);

/// Paths served without a token.
fn is_public(path: &str, method: &Method) -> bool {
    path == "/health"
        || path == "/auth/login"
        || path == "/auth/register"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || method == Method::OPTIONS
}

/// `Authorization: Bearer <token>`, falling back to the `auth_token` cookie.
/// `Err` carries a reason when a header is present but malformed.
fn extract_token(req: &Request) -> Result<Option<String>, &'static str> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let h = h.to_str().map_err(|_| "invalid Authorization header")?;
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err("invalid Authorization format (expect Bearer)"),
        };
    }
    let cookies = req
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'));
    for kv in cookies {
        if let Some(v) = kv.trim().strip_prefix(AUTH_COOKIE).and_then(|r| r.strip_prefix('=')) {
            if !v.is_empty() {
                return Ok(Some(v.to_string()));
            }
        }
    }
    Ok(None)
}

/// 全局中间件：除白名单外，校验 token 并解析出当前操作用户
/// 缺失、格式错误、非法或过期的 token 一律返回 401
pub async fn require_acting_user(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if is_public(&path, req.method()) {
        return next.run(req).await;
    }

    let token = match extract_token(&req) {
        Ok(Some(t)) => t,
        Ok(None) => {
            tracing::warn!(path = %path, "missing Authorization header and auth_token cookie");
            return unauthorized("missing credentials");
        }
        Err(reason) => {
            tracing::warn!(path = %path, reason, "rejected Authorization header");
            return unauthorized(reason);
        }
    };

    match state.auth_service().authenticate(&token).await {
        Ok(user) => {
            req.extensions_mut().insert(ActingUser(user));
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(path = %path, code = e.code(), err = %e, "token validation failed");
            unauthorized("invalid or expired token")
        }
    }
}

fn unauthorized(msg: &str) -> Response {
    JsonApiError::new(axum::http::StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg.to_string())).into_response()
}
