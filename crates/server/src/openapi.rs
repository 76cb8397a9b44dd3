use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    /// At least 8 characters.
    pub password: String,
    /// 1 Administrator, 2 Employee, 3 Client.
    pub role_id: Option<i32>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ClientInputDoc {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "active")]
    pub status: Option<String>,
    pub notes: Option<String>,
    #[schema(example = "2025-08-01T10:00:00-05:00")]
    pub registered_at: Option<String>,
}

#[derive(ToSchema)]
pub struct ServiceInputDoc {
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "350.00")]
    pub price: String,
    #[schema(example = "photography")]
    pub category: Option<String>,
    #[schema(example = "active")]
    pub status: Option<String>,
    /// Minutes, at least 1.
    pub estimated_duration: Option<i32>,
    pub image: Option<String>,
}

#[derive(ToSchema)]
pub struct JobInputDoc {
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "2025-08-01")]
    pub start_date: String,
    /// Not before `start_date`.
    #[schema(example = "2025-08-15")]
    pub delivery_date: String,
    #[schema(example = "pending")]
    pub status: Option<String>,
    #[schema(example = "medium")]
    pub priority: Option<String>,
    #[schema(example = "800.00")]
    pub total_price: String,
    #[schema(example = "0.00")]
    pub upfront: Option<String>,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct PaymentInputDoc {
    pub job_id: Uuid,
    /// Greater than 0 and at most 99999999.99 once rounded to cents.
    #[schema(example = "400.00")]
    pub amount: String,
    #[schema(example = "2025-08-02")]
    pub payment_date: String,
    #[schema(example = "transfer")]
    pub method: String,
    pub reference: Option<String>,
    #[schema(example = "completed")]
    pub status: Option<String>,
    #[schema(example = "partial")]
    pub payment_type: String,
    pub notes: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::dashboard::summary,
        crate::routes::dashboard::all_lookups,
        crate::routes::clients::list,
        crate::routes::clients::create,
        crate::routes::clients::get,
        crate::routes::clients::update,
        crate::routes::clients::delete,
        crate::routes::services::list,
        crate::routes::services::create,
        crate::routes::services::get,
        crate::routes::services::update,
        crate::routes::services::delete,
        crate::routes::jobs::list,
        crate::routes::jobs::form_options,
        crate::routes::jobs::create,
        crate::routes::jobs::get,
        crate::routes::jobs::update,
        crate::routes::jobs::delete,
        crate::routes::payments::list,
        crate::routes::payments::form_options,
        crate::routes::payments::create,
        crate::routes::payments::get,
        crate::routes::payments::update,
        crate::routes::payments::delete,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ClientInputDoc,
            ServiceInputDoc,
            JobInputDoc,
            PaymentInputDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "dashboard"),
        (name = "clients"),
        (name = "services"),
        (name = "jobs"),
        (name = "payments")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_resource() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/clients/{id}", "/services", "/jobs/form-options", "/payments/{id}", "/dashboard"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
