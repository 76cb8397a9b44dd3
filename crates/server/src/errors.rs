use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// JSON error body: `{ "error", "message"?, "fields"? }`.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &str, message: Option<String>) -> Self {
        Self { status, error: error.to_string(), message, fields: None }
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(fields) => {
                let mut out = Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed", None);
                out.fields = Some(fields.into_map());
                out
            }
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            e @ ServiceError::JobAlreadySettled { .. } => {
                Self::new(StatusCode::CONFLICT, "Job Already Settled", Some(e.to_string()))
            }
            ServiceError::ConcurrencyConflict(msg) => {
                warn!(error = %msg, "concurrent update rejected");
                Self::new(StatusCode::CONFLICT, "Concurrency Conflict", Some("the record changed concurrently, retry".into()))
            }
            ServiceError::Db(msg) => {
                error!(error = %msg, "database failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", None)
            }
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let status = match &e {
            AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::NotFound | AuthError::Unauthorized | AuthError::TokenError(_) => StatusCode::UNAUTHORIZED,
            AuthError::HashError(_) | AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(code = e.code(), error = %e, "auth failure");
            return Self::new(status, "Internal Error", None);
        }
        Self::new(status, "Auth Failed", Some(e.to_string()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::errors::FieldErrors;
    use uuid::Uuid;

    #[test]
    fn service_errors_map_to_status_codes() {
        let mut fields = FieldErrors::default();
        fields.add("amount", "must be greater than 0");
        let e = JsonApiError::from(ServiceError::Validation(fields));
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(e.fields.as_ref().and_then(|f| f.get("amount")).map(Vec::len), Some(1));

        let cases = [
            (ServiceError::not_found("job"), StatusCode::NOT_FOUND),
            (ServiceError::JobAlreadySettled { job_id: Uuid::nil() }, StatusCode::CONFLICT),
            (ServiceError::ConcurrencyConflict("40001".into()), StatusCode::CONFLICT),
            (ServiceError::Db("connection reset".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let e = JsonApiError::from(ServiceError::Db("password authentication failed".into()));
        let body = serde_json::to_value(&e).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Internal Error"}));
    }

    #[test]
    fn auth_errors() {
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::Conflict).status, StatusCode::CONFLICT);
        assert_eq!(JsonApiError::from(AuthError::Validation("email".into())).status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
