use std::collections::BTreeMap;
use std::fmt;

use models::errors::ModelError;
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(FieldErrors),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("job {job_id} is already settled")]
    JobAlreadySettled { job_id: Uuid },
    #[error("concurrent update conflict: {0}")]
    ConcurrencyConflict(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Invalid { field, message } => Self::field(field, message),
            ModelError::Validation(message) => Self::field(FieldErrors::GENERAL, message),
            ModelError::Db(message) => Self::Db(message),
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
            return Self::field(FieldErrors::GENERAL, format!("duplicate value: {detail}"));
        }
        let conflict = sqlstate(&e).is_some_and(|code| is_serialization_failure(&code));
        if conflict {
            Self::ConcurrencyConflict(e.to_string())
        } else {
            Self::Db(e.to_string())
        }
    }
}

/// SQLSTATE reported by the server, if the error came from one.
fn sqlstate(e: &DbErr) -> Option<String> {
    match e {
        DbErr::Query(RuntimeErr::SqlxError(err)) | DbErr::Exec(RuntimeErr::SqlxError(err)) => {
            err.as_database_error().and_then(|d| d.code()).map(|c| c.into_owned())
        }
        _ => None,
    }
}

/// Postgres 40001 (serialization_failure) and 40P01 (deadlock_detected).
fn is_serialization_failure(code: &str) -> bool {
    matches!(code, "40001" | "40P01")
}

/// Per-field validation messages, keyed by input field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Key for messages not tied to one field.
    pub const GENERAL: &'static str = "_";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// Record a failed model check; passing results are ignored.
    pub fn check(&mut self, result: Result<(), ModelError>) {
        if let Err(e) = result {
            match e {
                ModelError::Invalid { field, message } => self.add(field, message),
                other => self.add(Self::GENERAL, other.to_string()),
            }
        }
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, field: &str) -> Option<&[String]> { self.0.get(field).map(Vec::as_slice) }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> { self.0 }

    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() { Ok(()) } else { Err(ServiceError::Validation(self)) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for m in messages {
                if !first { f.write_str("; ")?; }
                write!(f, "{field}: {m}")?;
                first = false;
            }
        }
        Ok(())
    }
}
